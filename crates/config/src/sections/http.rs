// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::net::{Ipv4Addr, SocketAddr};

use camino::Utf8PathBuf;
use figment::error::Error as FigmentError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::util::{BoxError, ConfigurationSection, error_on_field};

fn default_listen() -> SocketAddr {
    (Ipv4Addr::UNSPECIFIED, 3000).into()
}

fn default_assets_path() -> Utf8PathBuf {
    "./public/build".into()
}

fn default_assets_prefix() -> String {
    "/build".to_owned()
}

/// Configuration of the HTTP server
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HttpConfig {
    /// Address to listen on
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Directory of the built assets, served as static files
    #[serde(default = "default_assets_path")]
    #[schemars(with = "String")]
    pub assets_path: Utf8PathBuf,

    /// Path under which the built assets are served
    #[serde(default = "default_assets_prefix")]
    pub assets_prefix: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            assets_path: default_assets_path(),
            assets_prefix: default_assets_prefix(),
        }
    }
}

impl ConfigurationSection for HttpConfig {
    const PATH: Option<&'static str> = Some("http");

    fn validate(&self, figment: &figment::Figment) -> Result<(), BoxError> {
        if !self.assets_prefix.starts_with('/') {
            return Err(error_on_field(
                figment,
                "http",
                "assets_prefix",
                FigmentError::from(format!(
                    "assets prefix must start with a slash, got {:?}",
                    self.assets_prefix
                )),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Format, Yaml},
    };

    use super::*;

    #[test]
    fn load_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    http:
                      listen: '[::1]:8000'
                      assets_path: dist
                ",
            )?;

            let config = HttpConfig::extract(&Figment::new().merge(Yaml::file("config.yaml")))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.listen, "[::1]:8000".parse().unwrap());
            assert_eq!(config.assets_path, "dist");
            assert_eq!(config.assets_prefix, "/build");

            Ok(())
        });
    }

    #[test]
    fn reject_relative_prefix() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    http:
                      assets_prefix: build
                ",
            )?;

            let err = HttpConfig::extract(&Figment::new().merge(Yaml::file("config.yaml")))
                .unwrap_err();
            assert!(err.to_string().contains("must start with a slash"));

            Ok(())
        });
    }
}
