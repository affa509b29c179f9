// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::util::ConfigurationSection;

/// Configuration of the server-side rendering process
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SsrConfig {
    /// Pre-render pages with the SSR process
    #[serde(default)]
    pub enabled: bool,

    /// URL of the SSR process. Defaults to `http://127.0.0.1:13714`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
}

impl SsrConfig {
    /// Returns true if the configuration is the default one
    pub(crate) fn is_default(&self) -> bool {
        !self.enabled && self.url.is_none()
    }
}

impl ConfigurationSection for SsrConfig {
    const PATH: Option<&'static str> = Some("ssr");
}
