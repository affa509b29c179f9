// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod http;
mod inertia;
mod ssr;

pub use self::{
    http::HttpConfig,
    inertia::{InertiaConfig, ManifestConfig, ManifestKind},
    ssr::SsrConfig,
};
use crate::util::{BoxError, ConfigurationSection};

/// Application configuration root
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RootConfig {
    /// Configuration of the HTTP server
    #[serde(default)]
    pub http: HttpConfig,

    /// Configuration of the Inertia adapter
    #[serde(default)]
    pub inertia: InertiaConfig,

    /// Configuration of the server-side rendering process
    #[serde(default, skip_serializing_if = "SsrConfig::is_default")]
    pub ssr: SsrConfig,
}

impl ConfigurationSection for RootConfig {
    fn validate(&self, figment: &figment::Figment) -> Result<(), BoxError> {
        self.http.validate(figment)?;
        self.inertia.validate(figment)?;
        self.ssr.validate(figment)?;

        Ok(())
    }
}
