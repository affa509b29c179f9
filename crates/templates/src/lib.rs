// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

//! Root template rendering
//!
//! The root template is the HTML document served on the first visit. It
//! embeds the page through the `inertia` and `inertiaHead` variables.

use std::{collections::BTreeMap, io::Read, sync::Arc};

use arc_swap::ArcSwap;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, info};

mod functions;

pub use minijinja::Value;

pub use self::functions::Assets;

/// Name under which the root template is registered. The `.html` extension
/// turns on auto-escaping.
const ROOT_TEMPLATE: &str = "root.html";

/// Variables available in the root template
pub type TemplateData = BTreeMap<String, Value>;

/// Escape the given string for use in HTML
///
/// It uses the same crate as the one used by the minijinja templates
#[must_use]
pub fn escape_html(input: &str) -> String {
    v_htmlescape::escape(input).to_string()
}

/// There was an issue while loading the root template
#[derive(Error, Debug)]
pub enum TemplateLoadingError {
    /// The template is empty
    #[error("the root template is blank")]
    Blank,

    /// I/O error
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// The template is not valid UTF-8
    #[error("the root template is not valid UTF-8")]
    NonUtf8(#[from] std::string::FromUtf8Error),

    /// The template failed to compile
    #[error("could not compile the root template")]
    Compile(#[from] minijinja::Error),

    /// The template was not loaded from a file, it can't be reloaded
    #[error("the root template was not loaded from a file")]
    NotReloadable,
}

/// Failed to render the root template
#[derive(Error, Debug)]
#[error("could not render the root template")]
pub struct TemplateError(#[from] minijinja::Error);

/// Wrapper around [`minijinja::Environment`] holding the root template, and
/// the data and functions shared with it
#[derive(Debug, Clone)]
pub struct RootTemplate {
    /// Compiled template with the asset functions
    base: Arc<ArcSwap<minijinja::Environment<'static>>>,
    /// [`Self::base`] plus the shared functions
    environment: Arc<ArcSwap<minijinja::Environment<'static>>>,
    functions: Arc<ArcSwap<TemplateData>>,
    data: Arc<ArcSwap<TemplateData>>,
    assets: Assets,
    path: Option<Utf8PathBuf>,
}

fn compile(
    source: String,
    assets: &Assets,
) -> Result<minijinja::Environment<'static>, TemplateLoadingError> {
    if source.trim().is_empty() {
        return Err(TemplateLoadingError::Blank);
    }

    let mut env = minijinja::Environment::new();
    env.add_template_owned(ROOT_TEMPLATE, source)?;
    self::functions::register(&mut env, assets);
    Ok(env)
}

impl RootTemplate {
    /// Compile the root template from its source
    ///
    /// # Errors
    ///
    /// Returns an error if the template is blank or does not compile.
    pub fn new(source: impl Into<String>, assets: Assets) -> Result<Self, TemplateLoadingError> {
        let env = Arc::new(compile(source.into(), &assets)?);
        Ok(Self {
            base: Arc::new(ArcSwap::new(Arc::clone(&env))),
            environment: Arc::new(ArcSwap::new(env)),
            functions: Arc::default(),
            data: Arc::default(),
            assets,
            path: None,
        })
    }

    /// Load the root template from a file. Templates loaded this way can be
    /// reloaded with [`RootTemplate::reload`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read, or the template is blank
    /// or does not compile.
    #[tracing::instrument(name = "templates.load", skip_all, fields(%path))]
    pub fn from_file(path: &Utf8Path, assets: Assets) -> Result<Self, TemplateLoadingError> {
        info!("Loading root template from filesystem");
        let source = std::fs::read_to_string(path)?;
        let mut template = Self::new(source, assets)?;
        template.path = Some(path.to_owned());
        Ok(template)
    }

    /// Load the root template from a reader
    ///
    /// # Errors
    ///
    /// Returns an error if the reader fails, or the template is not UTF-8,
    /// blank, or does not compile.
    pub fn from_reader<R: Read>(mut reader: R, assets: Assets) -> Result<Self, TemplateLoadingError> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        Self::new(String::from_utf8(raw)?, assets)
    }

    /// Reload the root template from disk, keeping the shared data and
    /// functions
    ///
    /// # Errors
    ///
    /// Returns an error if the template was not loaded from a file, or if it
    /// could not be loaded again. The previous template stays in use.
    #[tracing::instrument(name = "templates.reload", skip_all, fields(path = ?self.path))]
    pub fn reload(&self) -> Result<(), TemplateLoadingError> {
        let path = self
            .path
            .as_deref()
            .ok_or(TemplateLoadingError::NotReloadable)?;
        let source = std::fs::read_to_string(path)?;
        let env = compile(source, &self.assets)?;

        self.base.store(Arc::new(env));
        self.refresh_environment();
        Ok(())
    }

    fn refresh_environment(&self) {
        let mut env = minijinja::Environment::clone(&self.base.load());
        for (name, function) in self.functions.load().iter() {
            env.add_global(name.clone(), function.clone());
        }
        self.environment.store(Arc::new(env));
    }

    /// The assets the template functions point to
    #[must_use]
    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    /// Share a variable with every render of the template
    pub fn share_data(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        debug!(%key, "Sharing template data");
        self.data.rcu(|data| {
            let mut data = TemplateData::clone(data);
            data.insert(key.clone(), value.clone());
            data
        });
    }

    /// The variables shared with every render
    #[must_use]
    pub fn shared_data(&self) -> Arc<TemplateData> {
        self.data.load_full()
    }

    /// Remove all the shared variables
    pub fn flush_data(&self) {
        self.data.store(Arc::default());
    }

    /// Make a function available in the template.
    ///
    /// The function is usually built with [`Value::from_function`].
    pub fn share_function(&self, name: impl Into<String>, function: Value) {
        let name = name.into();
        debug!(%name, "Sharing template function");
        self.functions.rcu(|functions| {
            let mut functions = TemplateData::clone(functions);
            functions.insert(name.clone(), function.clone());
            functions
        });
        self.refresh_environment();
    }

    /// Remove all the shared functions. The asset functions stay available.
    pub fn flush_functions(&self) {
        self.functions.store(Arc::default());
        self.refresh_environment();
    }

    /// Render the root template.
    ///
    /// `inertia` and `inertiaHead` are inserted as safe strings, then the
    /// shared variables, then `data`, each overriding the previous ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render(
        &self,
        inertia: &str,
        inertia_head: &str,
        data: &TemplateData,
    ) -> Result<String, TemplateError> {
        let mut context = TemplateData::new();
        context.insert("inertia".to_owned(), Value::from_safe_string(inertia.to_owned()));
        context.insert(
            "inertiaHead".to_owned(),
            Value::from_safe_string(inertia_head.to_owned()),
        );
        context.extend(
            self.data
                .load()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        context.extend(data.iter().map(|(key, value)| (key.clone(), value.clone())));

        let env = self.environment.load();
        let template = env.get_template(ROOT_TEMPLATE)?;
        Ok(template.render(context)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SOURCE: &str = r#"<html><head>{{ inertiaHead }}<title>{{ title }}</title></head><body>{{ inertia }}</body></html>"#;

    #[test]
    fn test_render() {
        let template = RootTemplate::new(SOURCE, Assets::default()).unwrap();
        let mut data = TemplateData::new();
        data.insert("title".to_owned(), Value::from("<Home>"));

        let html = template
            .render(r#"<div id="app"></div>"#, "<meta name=\"x\">", &data)
            .unwrap();
        insta::assert_snapshot!(html, @r#"<html><head><meta name="x"><title>&lt;Home&gt;</title></head><body><div id="app"></div></body></html>"#);
    }

    #[test]
    fn test_blank() {
        let err = RootTemplate::new("  \n\t", Assets::default()).unwrap_err();
        assert!(matches!(err, TemplateLoadingError::Blank));

        let err = RootTemplate::from_reader(&[0xff, 0xfe][..], Assets::default()).unwrap_err();
        assert!(matches!(err, TemplateLoadingError::NonUtf8(_)));

        let err = RootTemplate::new("{% if %}", Assets::default()).unwrap_err();
        assert!(matches!(err, TemplateLoadingError::Compile(_)));
    }

    #[test]
    fn test_data_precedence() {
        let template = RootTemplate::new("{{ a }}-{{ b }}-{{ inertia }}", Assets::default()).unwrap();
        template.share_data("a", Value::from("shared-a"));
        template.share_data("b", Value::from("shared-b"));
        template.share_data("inertia", Value::from("overridden"));

        let mut data = TemplateData::new();
        data.insert("b".to_owned(), Value::from("request-b"));

        let html = template.render("container", "", &data).unwrap();
        assert_eq!(html, "shared-a-request-b-overridden");

        template.flush_data();
        assert!(template.shared_data().is_empty());
        let html = template.render("container", "", &TemplateData::new()).unwrap();
        assert_eq!(html, "--container");
    }

    #[test]
    fn test_functions() {
        let template = RootTemplate::new("{{ shout(\"hi\") }}", Assets::default()).unwrap();
        template.share_function(
            "shout",
            Value::from_function(|input: String| input.to_uppercase()),
        );
        let html = template.render("", "", &TemplateData::new()).unwrap();
        assert_eq!(html, "HI");

        template.flush_functions();
        assert!(template.render("", "", &TemplateData::new()).is_err());
    }

    #[test]
    fn test_asset_functions() {
        let vite: inertia_spa::ViteManifest = serde_json::from_str(
            r#"{"resources/js/app.js": {"file": "assets/app.js", "isEntry": true, "css": ["assets/app.css"]}}"#,
        )
        .unwrap();
        let mix: inertia_spa::MixManifest =
            serde_json::from_str(r#"{"/css/app.css": "/css/app.css?id=1234"}"#).unwrap();
        let assets = Assets::new("/build")
            .with_vite_manifest(vite)
            .with_mix_manifest(mix);

        let template = RootTemplate::new(
            "{{ vite_assets(\"resources/js/app.js\") }}\n{{ mix(\"/css/app.css\") }}\n{{ mix(\"/unknown.js\") }}",
            assets,
        )
        .unwrap();

        let html = template.render("", "", &TemplateData::new()).unwrap();
        insta::assert_snapshot!(html, @r#"
        <link rel="stylesheet" href="/build/assets/app.css" crossorigin />
        <script type="module" src="/build/assets/app.js" crossorigin></script>
        /css/app.css?id=1234
        /unknown.js
        "#);

        let template =
            RootTemplate::new("{{ vite_assets(\"missing.js\") }}", template.assets().clone()).unwrap();
        assert!(template.render("", "", &TemplateData::new()).is_err());
    }

    #[test]
    fn test_reload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"first {{ inertia }}").unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();

        let template = RootTemplate::from_file(path, Assets::default()).unwrap();
        template.share_function("answer", Value::from_function(|| 42));
        assert_eq!(
            template.render("x", "", &TemplateData::new()).unwrap(),
            "first x"
        );

        std::fs::write(path, "second {{ inertia }} {{ answer() }}").unwrap();
        template.reload().unwrap();
        assert_eq!(
            template.render("x", "", &TemplateData::new()).unwrap(),
            "second x 42"
        );

        let in_memory = RootTemplate::new("{{ inertia }}", Assets::default()).unwrap();
        assert!(matches!(
            in_memory.reload().unwrap_err(),
            TemplateLoadingError::NotReloadable
        ));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="/">"#), "&lt;a href=&quot;&#x2f;&quot;&gt;");
    }
}
