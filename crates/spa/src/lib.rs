// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

#![deny(rustdoc::missing_crate_level_docs)]

//! A crate to help serve single-page apps built by Vite or Laravel Mix.
//!
//! It reads the manifests the bundlers write next to the built assets, and
//! derives the asset version the Inertia protocol uses to detect stale
//! clients.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

mod mix;
mod version;
mod vite;

pub use self::{
    mix::MixManifest,
    version::{asset_version_from_bytes, asset_version_from_file, asset_version_from_url},
    vite::{Asset, FileNotFound, Manifest as ViteManifest},
};

/// Failed to load a bundler manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest could not be read
    #[error("failed to read manifest {path:?}")]
    Io {
        /// Path of the manifest
        path: Utf8PathBuf,

        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid JSON, or has an unexpected shape
    #[error("invalid manifest {path:?}")]
    Json {
        /// Path of the manifest
        path: Utf8PathBuf,

        /// The underlying error
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn read_manifest<T: serde::de::DeserializeOwned>(
    path: &Utf8Path,
) -> Result<T, ManifestError> {
    let raw = std::fs::read(path).map_err(|source| ManifestError::Io {
        path: path.to_owned(),
        source,
    })?;

    serde_json::from_slice(&raw).map_err(|source| ManifestError::Json {
        path: path.to_owned(),
        source,
    })
}
