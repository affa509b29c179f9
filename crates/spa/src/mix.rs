// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::collections::HashMap;

use camino::Utf8Path;
use serde::Deserialize;

use crate::ManifestError;

/// The `mix-manifest.json` file written by Laravel Mix when versioning is
/// enabled.
///
/// It maps public paths to their versioned counterpart, e.g.
/// `/js/app.js` → `/js/app.js?id=8f4c1f…`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct MixManifest {
    inner: HashMap<String, String>,
}

impl MixManifest {
    /// Load the manifest from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file could not be read or is not a valid Mix
    /// manifest.
    pub fn load(path: &Utf8Path) -> Result<Self, ManifestError> {
        crate::read_manifest(path)
    }

    /// Get the versioned path of an asset.
    ///
    /// Paths are looked up with and without their leading slash. Unknown
    /// paths are returned as-is, so that an unversioned build still works.
    #[must_use]
    pub fn resolve<'a>(&'a self, path: &'a str) -> &'a str {
        let trimmed = path.trim_start_matches('/');
        if let Some(versioned) = self.inner.get(path) {
            return versioned;
        }

        self.inner
            .iter()
            .find(|(key, _)| key.trim_start_matches('/') == trimmed)
            .map_or(path, |(_, versioned)| versioned.as_str())
    }

    /// Number of assets listed in the manifest
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the manifest lists no asset
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> MixManifest {
        serde_json::from_str(
            r#"{
                "/build/assets/app.js": "/build/assets/app.js?id=6d4a2f1c",
                "/build/assets/app.css": "/build/assets/app.css?id=91be00aa"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_versioned() {
        let manifest = manifest();
        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.resolve("/build/assets/app.js"),
            "/build/assets/app.js?id=6d4a2f1c"
        );
        // Leading slashes are not significant
        assert_eq!(
            manifest.resolve("build/assets/app.css"),
            "/build/assets/app.css?id=91be00aa"
        );
    }

    #[test]
    fn test_resolve_unknown() {
        let manifest = manifest();
        assert_eq!(manifest.resolve("/favicon.ico"), "/favicon.ico");
    }

    #[test]
    fn test_load_invalid() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"[1, 2, 3]").unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();

        let err = MixManifest::load(path).unwrap_err();
        assert!(matches!(err, ManifestError::Json { .. }));
    }
}
