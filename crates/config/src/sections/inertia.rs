// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use camino::Utf8PathBuf;
use figment::error::Error as FigmentError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::util::{BoxError, ConfigurationSection, error_on_field};

fn default_root_template() -> Utf8PathBuf {
    "./resources/views/root.html".into()
}

fn default_container_id() -> String {
    "app".to_owned()
}

const fn default_false() -> bool {
    false
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_default_false(value: &bool) -> bool {
    *value == default_false()
}

/// Which bundler produced a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    /// A Vite `manifest.json`, which also enables the `vite_assets`
    /// template function
    Vite,

    /// A Laravel Mix `mix-manifest.json`, which also enables the `mix`
    /// template function
    Mix,

    /// Any file, only used to compute the asset version
    Plain,
}

/// A bundler manifest
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ManifestConfig {
    /// Which bundler produced the manifest
    pub kind: ManifestKind,

    /// Path to the manifest
    #[schemars(with = "String")]
    pub path: Utf8PathBuf,
}

/// Configuration of the Inertia adapter
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InertiaConfig {
    /// Path to the root template
    #[serde(default = "default_root_template")]
    #[schemars(with = "String")]
    pub root_template: Utf8PathBuf,

    /// ID of the element the client mounts the app on
    #[serde(default = "default_container_id")]
    pub container_id: String,

    /// Asset version. Clients with another version do a full page reload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Derive the asset version from this URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,

    /// Derive the asset version from a bundler manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestConfig>,

    /// Ask clients to encrypt their history state
    #[serde(default = "default_false", skip_serializing_if = "is_default_false")]
    pub encrypt_history: bool,
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            root_template: default_root_template(),
            container_id: default_container_id(),
            version: None,
            asset_url: None,
            manifest: None,
            encrypt_history: default_false(),
        }
    }
}

impl ConfigurationSection for InertiaConfig {
    const PATH: Option<&'static str> = Some("inertia");

    fn validate(&self, figment: &figment::Figment) -> Result<(), BoxError> {
        let sources = [
            self.version.is_some(),
            self.asset_url.is_some(),
            self.manifest.is_some(),
        ];
        if sources.into_iter().filter(|set| *set).count() > 1 {
            return Err(error_on_field(
                figment,
                "inertia",
                "version",
                FigmentError::from(
                    "only one of `version`, `asset_url` and `manifest` can be set",
                ),
            )
            .into());
        }

        if self.container_id.is_empty() {
            return Err(error_on_field(
                figment,
                "inertia",
                "container_id",
                FigmentError::from("the container ID can't be empty"),
            )
            .into());
        }

        Ok(())
    }
}
