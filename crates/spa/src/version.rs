// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use camino::Utf8Path;
use md5::{Digest, Md5};

use crate::ManifestError;

/// Compute an asset version out of arbitrary bytes, as a hex-encoded MD5
/// digest.
#[must_use]
pub fn asset_version_from_bytes(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Compute an asset version out of the URL the assets are served from.
///
/// Useful when the assets live on a CDN and the URL changes on each deploy.
#[must_use]
pub fn asset_version_from_url(url: &str) -> String {
    asset_version_from_bytes(url.as_bytes())
}

/// Compute an asset version out of the contents of a file, usually the
/// manifest written by the bundler.
///
/// # Errors
///
/// Returns an error if the file could not be read.
pub fn asset_version_from_file(path: &Utf8Path) -> Result<String, ManifestError> {
    let bytes = std::fs::read(path).map_err(|source| ManifestError::Io {
        path: path.to_owned(),
        source,
    })?;

    Ok(asset_version_from_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_version_from_url() {
        assert_eq!(
            asset_version_from_url("foo"),
            "acbd18db4cc2f85cedef654fccc4a4d8"
        );
        assert_eq!(
            asset_version_from_url("https://cdn.example.com/build/"),
            asset_version_from_bytes(b"https://cdn.example.com/build/")
        );
    }

    #[test]
    fn test_version_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"foo").unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();

        assert_eq!(
            asset_version_from_file(path).unwrap(),
            "acbd18db4cc2f85cedef654fccc4a4d8"
        );
    }

    #[test]
    fn test_version_from_missing_file() {
        let err = asset_version_from_file(Utf8Path::new("/this/file/does/not/exist.json"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
