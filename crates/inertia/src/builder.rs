// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{io::Read, sync::Arc};

use arc_swap::ArcSwap;
use camino::Utf8PathBuf;
use inertia_spa::{ManifestError, MixManifest, ViteManifest};
use inertia_templates::{Assets, RootTemplate, TemplateLoadingError, Value};
use thiserror::Error;
use tracing::info;

use crate::{FlashProvider, Inertia, Inner, Prop, Props, SsrClient};

/// Failed to build the adapter
#[derive(Debug, Error)]
pub enum BuildError {
    /// The root template could not be loaded
    #[error(transparent)]
    Template(#[from] TemplateLoadingError),

    /// A bundler manifest could not be loaded
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The HTTP client for the SSR process could not be created
    #[error("failed to create the SSR HTTP client")]
    HttpClient(#[from] reqwest::Error),
}

enum TemplateSource {
    Inline(String),
    File(Utf8PathBuf),
}

enum VersionSource {
    Fixed(String),
    File(Utf8PathBuf),
}

/// Builder for [`Inertia`]
#[must_use = "call `build` to create the adapter"]
pub struct InertiaBuilder {
    template: TemplateSource,
    version: Option<VersionSource>,
    vite_manifest: Option<Utf8PathBuf>,
    mix_manifest: Option<Utf8PathBuf>,
    asset_base: String,
    container_id: String,
    encrypt_history: bool,
    ssr_url: Option<String>,
    ssr_client: Option<reqwest::Client>,
    flash: Option<Arc<dyn FlashProvider>>,
    template_data: Vec<(String, Value)>,
    template_functions: Vec<(String, Value)>,
    shared_props: Props,
}

impl Inertia {
    /// Start building an adapter with the given root template
    pub fn builder(template: impl Into<String>) -> InertiaBuilder {
        InertiaBuilder::new(TemplateSource::Inline(template.into()))
    }

    /// Start building an adapter with the root template at the given path.
    /// The file is read when the adapter is built.
    pub fn builder_from_file(path: impl Into<Utf8PathBuf>) -> InertiaBuilder {
        InertiaBuilder::new(TemplateSource::File(path.into()))
    }

    /// Start building an adapter with the root template read from `reader`
    ///
    /// # Errors
    ///
    /// Returns an error if the reader fails or does not contain UTF-8
    pub fn builder_from_reader<R: Read>(mut reader: R) -> Result<InertiaBuilder, BuildError> {
        let mut raw = Vec::new();
        reader
            .read_to_end(&mut raw)
            .map_err(TemplateLoadingError::from)?;
        Self::builder_from_bytes(raw)
    }

    /// Start building an adapter with the given root template
    ///
    /// # Errors
    ///
    /// Returns an error if the template is not UTF-8
    pub fn builder_from_bytes(bytes: impl Into<Vec<u8>>) -> Result<InertiaBuilder, BuildError> {
        let template = String::from_utf8(bytes.into()).map_err(TemplateLoadingError::from)?;
        Ok(Self::builder(template))
    }
}

impl InertiaBuilder {
    fn new(template: TemplateSource) -> Self {
        Self {
            template,
            version: None,
            vite_manifest: None,
            mix_manifest: None,
            asset_base: "/build/".to_owned(),
            container_id: "app".to_owned(),
            encrypt_history: false,
            ssr_url: None,
            ssr_client: None,
            flash: None,
            template_data: Vec::new(),
            template_functions: Vec::new(),
            shared_props: Props::new(),
        }
    }

    /// Set the asset version
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(VersionSource::Fixed(version.into()));
        self
    }

    /// Derive the asset version from the URL the assets are served from
    pub fn asset_url(mut self, url: &str) -> Self {
        self.version = Some(VersionSource::Fixed(
            inertia_spa::asset_version_from_url(url),
        ));
        self
    }

    /// Derive the asset version from the contents of a file
    pub fn manifest_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.version = Some(VersionSource::File(path.into()));
        self
    }

    /// Load a Vite manifest, exposing the `vite_assets(entrypoint)` template
    /// function and deriving the asset version from it
    pub fn vite_manifest_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        self.version = Some(VersionSource::File(path.clone()));
        self.vite_manifest = Some(path);
        self
    }

    /// Load a Laravel Mix manifest, exposing the `mix(path)` template
    /// function and deriving the asset version from it
    pub fn mix_manifest_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        self.version = Some(VersionSource::File(path.clone()));
        self.mix_manifest = Some(path);
        self
    }

    /// Public path the built assets are served under. Defaults to `/build/`.
    pub fn asset_base(mut self, base: impl Into<String>) -> Self {
        self.asset_base = base.into();
        self
    }

    /// `id` of the element the client mounts on. Defaults to `app`.
    pub fn container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = id.into();
        self
    }

    /// Whether the client should encrypt its history by default
    pub fn encrypt_history(mut self, encrypt: bool) -> Self {
        self.encrypt_history = encrypt;
        self
    }

    /// Pre-render pages with the SSR process at `url`, see
    /// [`crate::ssr::DEFAULT_SSR_URL`]
    pub fn ssr(mut self, url: impl Into<String>) -> Self {
        self.ssr_url = Some(url.into());
        self
    }

    /// Pre-render pages with the SSR process at `url`, using the given HTTP
    /// client
    pub fn ssr_with_client(mut self, url: impl Into<String>, client: reqwest::Client) -> Self {
        self.ssr_url = Some(url.into());
        self.ssr_client = Some(client);
        self
    }

    /// Keep validation errors and the clear-history flag across redirects
    pub fn flash_provider(mut self, provider: impl FlashProvider + 'static) -> Self {
        self.flash = Some(Arc::new(provider));
        self
    }

    /// Make a function available in the root template
    pub fn template_function(mut self, name: impl Into<String>, function: Value) -> Self {
        self.template_functions.push((name.into(), function));
        self
    }

    /// Share a variable with every render of the root template
    pub fn template_datum(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.template_data.push((key.into(), value.into()));
        self
    }

    /// Share a prop with every page
    pub fn share_prop(mut self, key: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.shared_props.insert(key, prop);
        self
    }

    /// Build the adapter
    ///
    /// # Errors
    ///
    /// Returns an error if the root template or one of the manifests fails
    /// to load, or if the SSR HTTP client can't be created.
    pub fn build(self) -> Result<Inertia, BuildError> {
        let mut assets = Assets::new(self.asset_base);
        if let Some(path) = &self.vite_manifest {
            assets = assets.with_vite_manifest(ViteManifest::load(path)?);
        }
        if let Some(path) = &self.mix_manifest {
            assets = assets.with_mix_manifest(MixManifest::load(path)?);
        }

        let version = match self.version {
            None => String::new(),
            Some(VersionSource::Fixed(version)) => version,
            Some(VersionSource::File(path)) => inertia_spa::asset_version_from_file(&path)?,
        };

        let template = match self.template {
            TemplateSource::Inline(source) => RootTemplate::new(source, assets)?,
            TemplateSource::File(path) => RootTemplate::from_file(&path, assets)?,
        };

        for (key, value) in self.template_data {
            template.share_data(key, value);
        }
        for (name, function) in self.template_functions {
            template.share_function(name, function);
        }

        let ssr = match self.ssr_url {
            Some(url) => {
                let client = match self.ssr_client {
                    Some(client) => client,
                    None => crate::ssr::client()?,
                };
                Some(SsrClient::new(client, &url))
            }
            None => None,
        };

        info!(
            %version,
            ssr = ssr.as_ref().map(|ssr| tracing::field::display(ssr.render_url())),
            "Inertia adapter ready"
        );

        Ok(Inertia {
            inner: Arc::new(Inner {
                template,
                shared_props: ArcSwap::from_pointee(self.shared_props),
                version,
                container_id: self.container_id,
                encrypt_history: self.encrypt_history,
                ssr,
                flash: self.flash,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use camino::Utf8Path;

    use super::*;

    #[test]
    fn test_template_sources() {
        assert!(Inertia::builder("{{ inertia }}").build().is_ok());
        assert!(
            Inertia::builder_from_bytes(b"{{ inertia }}".to_vec())
                .unwrap()
                .build()
                .is_ok()
        );
        assert!(
            Inertia::builder_from_reader(&b"{{ inertia }}"[..])
                .unwrap()
                .build()
                .is_ok()
        );

        assert!(matches!(
            Inertia::builder_from_bytes(vec![0xff]),
            Err(BuildError::Template(TemplateLoadingError::NonUtf8(_)))
        ));
        assert!(matches!(
            Inertia::builder("").build(),
            Err(BuildError::Template(TemplateLoadingError::Blank))
        ));
        assert!(matches!(
            Inertia::builder_from_file("/does/not/exist.html").build(),
            Err(BuildError::Template(TemplateLoadingError::IO(_)))
        ));
    }

    #[test]
    fn test_versions() {
        let inertia = Inertia::builder("{{ inertia }}").build().unwrap();
        assert_eq!(inertia.version(), "");
        assert!(!inertia.is_ssr_enabled());

        let inertia = Inertia::builder("{{ inertia }}")
            .version("1.0")
            .build()
            .unwrap();
        assert_eq!(inertia.version(), "1.0");

        let inertia = Inertia::builder("{{ inertia }}")
            .asset_url("foo")
            .build()
            .unwrap();
        assert_eq!(inertia.version(), "acbd18db4cc2f85cedef654fccc4a4d8");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"foo").unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();
        let inertia = Inertia::builder("{{ inertia }}")
            .manifest_file(path)
            .build()
            .unwrap();
        assert_eq!(inertia.version(), "acbd18db4cc2f85cedef654fccc4a4d8");
    }

    #[test]
    fn test_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap();
        let vite = dir.join("manifest.json");
        std::fs::write(
            &vite,
            r#"{"resources/js/app.js": {"file": "assets/app.js", "isEntry": true}}"#,
        )
        .unwrap();
        let mix = dir.join("mix-manifest.json");
        std::fs::write(&mix, r#"{"/js/app.js": "/js/app.js?id=42"}"#).unwrap();

        let inertia = Inertia::builder(
            r#"{{ vite_assets("resources/js/app.js") }}|{{ mix("/js/app.js") | safe }}"#,
        )
        .vite_manifest_file(&vite)
        .mix_manifest_file(&mix)
        .asset_base("https://cdn.example.com/")
        .build()
        .unwrap();

        // The last manifest wins for the version
        assert_eq!(
            inertia.version(),
            inertia_spa::asset_version_from_file(&mix).unwrap()
        );
        assert_eq!(
            inertia
                .template()
                .render("", "", &inertia_templates::TemplateData::new())
                .unwrap(),
            r#"<script type="module" src="https://cdn.example.com/assets/app.js" crossorigin></script>|/js/app.js?id=42"#
        );

        let err = Inertia::builder("{{ inertia }}")
            .vite_manifest_file(dir.join("missing.json"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::Manifest(ManifestError::Io { .. })));
    }

    #[test]
    fn test_ssr() {
        let inertia = Inertia::builder("{{ inertia }}")
            .ssr(crate::ssr::DEFAULT_SSR_URL)
            .container_id("root")
            .build()
            .unwrap();
        assert!(inertia.is_ssr_enabled());
        assert_eq!(inertia.inner.container_id, "root");
    }
}
