// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::collections::{BTreeSet, HashMap, HashSet};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

use crate::ManifestError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    file: Utf8PathBuf,

    #[serde(default)]
    css: Vec<Utf8PathBuf>,

    #[serde(default)]
    imports: Vec<Utf8PathBuf>,

    #[serde(default)]
    is_entry: bool,
}

/// The `manifest.json` file written by Vite when `build.manifest` is enabled
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    inner: HashMap<Utf8PathBuf, ManifestEntry>,
}

/// An asset to include in the page, in the order it should be included
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Asset<'a> {
    /// A CSS file, included with a `<link rel="stylesheet">`
    Stylesheet(&'a Utf8Path),

    /// A JS chunk imported by the entrypoint, preloaded with
    /// `<link rel="modulepreload">`
    Preload(&'a Utf8Path),

    /// The entrypoint itself, included with a `<script type="module">`
    Script(&'a Utf8Path),
}

impl Asset<'_> {
    /// The path of the asset, relative to the build directory
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Stylesheet(path) | Self::Preload(path) | Self::Script(path) => path,
        }
    }

    /// Generate the HTML tag including this asset, with `base` being the
    /// public path of the build directory.
    #[must_use]
    pub fn tag(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        let path = self.path();
        match self {
            Self::Stylesheet(_) => {
                format!(r#"<link rel="stylesheet" href="{base}/{path}" crossorigin />"#)
            }
            Self::Preload(_) => {
                format!(r#"<link rel="modulepreload" href="{base}/{path}" crossorigin />"#)
            }
            Self::Script(_) => {
                format!(r#"<script type="module" src="{base}/{path}" crossorigin></script>"#)
            }
        }
    }
}

/// A file referenced by the entrypoint is missing from the manifest
#[derive(Debug, Error)]
#[error("file {path:?} is missing from the assets manifest")]
pub struct FileNotFound {
    /// The path which could not be found
    pub path: Utf8PathBuf,
}

impl Manifest {
    /// Load the manifest from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file could not be read or is not a valid Vite
    /// manifest.
    pub fn load(path: &Utf8Path) -> Result<Self, ManifestError> {
        crate::read_manifest(path)
    }

    /// List the entrypoints declared in the manifest
    pub fn entrypoints(&self) -> impl Iterator<Item = &Utf8Path> {
        self.inner
            .iter()
            .filter(|(_, entry)| entry.is_entry)
            .map(|(name, _)| name.as_path())
    }

    fn lookup(&self, path: &Utf8Path) -> Result<&ManifestEntry, FileNotFound> {
        self.inner.get(path).ok_or_else(|| FileNotFound {
            path: path.to_owned(),
        })
    }

    /// Find all the assets needed by the given entrypoint: the entrypoint
    /// script, the chunks it imports (transitively), and the stylesheets of
    /// all of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the entrypoint or one of its imports is missing
    /// from the manifest.
    pub fn assets<'a>(&'a self, entrypoint: &Utf8Path) -> Result<Vec<Asset<'a>>, FileNotFound> {
        let entry = self.lookup(entrypoint)?;

        let mut assets = BTreeSet::new();
        assets.insert(Asset::Script(&entry.file));
        assets.extend(entry.css.iter().map(|css| Asset::Stylesheet(css)));

        let mut visited: HashSet<&Utf8Path> = HashSet::new();
        let mut queue: Vec<&Utf8Path> = entry.imports.iter().map(Utf8PathBuf::as_path).collect();
        while let Some(import) = queue.pop() {
            if !visited.insert(import) {
                continue;
            }

            let chunk = self.lookup(import)?;
            assets.insert(Asset::Preload(&chunk.file));
            assets.extend(chunk.css.iter().map(|css| Asset::Stylesheet(css)));
            queue.extend(chunk.imports.iter().map(Utf8PathBuf::as_path));
        }

        Ok(assets.into_iter().collect())
    }

    /// Render the HTML tags needed to load the given entrypoint
    ///
    /// # Errors
    ///
    /// Returns an error if the entrypoint or one of its imports is missing
    /// from the manifest.
    pub fn tags(&self, base: &str, entrypoint: &Utf8Path) -> Result<String, FileNotFound> {
        let tags: Vec<String> = self
            .assets(entrypoint)?
            .iter()
            .map(|asset| asset.tag(base))
            .collect();

        Ok(tags.join("\n"))
    }
}
