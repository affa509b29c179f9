// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use anyhow::Context;
use inertia::{Inertia, MemoryFlashProvider};
use inertia_config::{HttpConfig, InertiaConfig, ManifestKind, SsrConfig};

/// Name of the cookie identifying the session of the demo app
pub const SESSION_COOKIE: &str = "inertia_session";

pub fn inertia_from_config(
    config: &InertiaConfig,
    http_config: &HttpConfig,
    ssr_config: &SsrConfig,
) -> Result<Inertia, anyhow::Error> {
    let mut builder = Inertia::builder_from_file(config.root_template.clone())
        .container_id(config.container_id.clone())
        .encrypt_history(config.encrypt_history)
        .asset_base(format!("{}/", http_config.assets_prefix.trim_end_matches('/')))
        .flash_provider(MemoryFlashProvider::with_cookie(SESSION_COOKIE));

    if let Some(version) = &config.version {
        builder = builder.version(version.clone());
    }

    if let Some(asset_url) = &config.asset_url {
        builder = builder.asset_url(asset_url);
    }

    if let Some(manifest) = &config.manifest {
        let path = manifest.path.clone();
        builder = match manifest.kind {
            ManifestKind::Vite => builder.vite_manifest_file(path),
            ManifestKind::Mix => builder.mix_manifest_file(path),
            ManifestKind::Plain => builder.manifest_file(path),
        };
    }

    if ssr_config.enabled {
        let url = ssr_config
            .url
            .as_ref()
            .map_or(inertia::ssr::DEFAULT_SSR_URL, url::Url::as_str);
        builder = builder.ssr(url);
    }

    builder
        .build()
        .context("Failed to set up the Inertia adapter")
}
