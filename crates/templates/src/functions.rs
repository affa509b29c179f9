// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Functions available in the root template to include the built assets

use std::sync::Arc;

use camino::Utf8Path;
use inertia_spa::{MixManifest, ViteManifest};
use minijinja::{Environment, Error, ErrorKind, Value};

/// Where the bundler wrote its output, and the manifests describing it
#[derive(Debug, Clone)]
pub struct Assets {
    base: String,
    vite: Option<Arc<ViteManifest>>,
    mix: Option<Arc<MixManifest>>,
}

impl Default for Assets {
    fn default() -> Self {
        Self::new("/build/")
    }
}

impl Assets {
    /// Assets served under the given public path, without any manifest
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            vite: None,
            mix: None,
        }
    }

    /// Expose the `vite_assets(entrypoint)` function
    #[must_use]
    pub fn with_vite_manifest(mut self, manifest: ViteManifest) -> Self {
        self.vite = Some(Arc::new(manifest));
        self
    }

    /// Expose the `mix(path)` function
    #[must_use]
    pub fn with_mix_manifest(mut self, manifest: MixManifest) -> Self {
        self.mix = Some(Arc::new(manifest));
        self
    }

    /// The public path the assets are served under
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }
}

pub(crate) fn register(env: &mut Environment<'static>, assets: &Assets) {
    if let Some(vite) = assets.vite.clone() {
        let base = assets.base.clone();
        env.add_function("vite_assets", move |entrypoint: String| {
            vite.tags(&base, Utf8Path::new(&entrypoint))
                .map(Value::from_safe_string)
                .map_err(|e| {
                    Error::new(ErrorKind::InvalidOperation, "could not include assets")
                        .with_source(e)
                })
        });
    }

    if let Some(mix) = assets.mix.clone() {
        // Paths come from the template and the manifest, not from users
        env.add_function("mix", move |path: String| {
            Value::from_safe_string(mix.resolve(&path).to_owned())
        });
    }
}
