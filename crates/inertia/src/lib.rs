// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

//! Server-side adapter for the [Inertia.js](https://inertiajs.com) protocol.
//!
//! Handlers pick a client-side component and its props, and the adapter
//! answers with either a JSON page object (for visits made by the Inertia
//! client), or the HTML root template embedding that page object (for
//! first visits).
//!
//! ```no_run
//! use axum::{Router, response::IntoResponse, routing::get};
//! use inertia::{ErrorWrapper, Inertia, InertiaContext, InertiaLayer, RenderError, props};
//!
//! async fn home(ctx: InertiaContext) -> Result<impl IntoResponse, ErrorWrapper<RenderError>> {
//!     Ok(ctx.render("Home/Index", props! { "text" => "world" }).await?)
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let inertia = Inertia::builder_from_file("resources/views/root.html")
//!     .vite_manifest_file("public/build/.vite/manifest.json")
//!     .build()?;
//!
//! let app: Router = Router::new()
//!     .route("/", get(home))
//!     .layer(InertiaLayer::new(inertia));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use inertia_templates::{RootTemplate, TemplateData, Value};

mod builder;
mod error_wrapper;
mod extract;
pub mod flash;
mod middleware;
mod page;
mod props;
pub mod request;
mod response;
pub mod ssr;
pub mod testing;

pub use self::{
    builder::{BuildError, InertiaBuilder},
    error_wrapper::ErrorWrapper,
    extract::{InertiaContext, MissingInertiaLayer},
    flash::{FlashProvider, MemoryFlashProvider},
    middleware::{InertiaLayer, InertiaService},
    page::Page,
    props::{BoxError, Prop, PropError, PropKind, PropResolver, Props, ValidationErrors},
    request::{InertiaRequestExt, RequestData, is_inertia_request},
    response::RenderError,
    ssr::SsrClient,
};

/// Handle to the Inertia adapter. Cheap to clone.
#[derive(Clone)]
pub struct Inertia {
    inner: Arc<Inner>,
}

struct Inner {
    template: RootTemplate,
    shared_props: ArcSwap<Props>,
    version: String,
    container_id: String,
    encrypt_history: bool,
    ssr: Option<SsrClient>,
    flash: Option<Arc<dyn FlashProvider>>,
}

impl std::fmt::Debug for Inertia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inertia")
            .field("version", &self.inner.version)
            .field("container_id", &self.inner.container_id)
            .field("encrypt_history", &self.inner.encrypt_history)
            .field("ssr", &self.inner.ssr)
            .field("flash", &self.inner.flash.is_some())
            .finish_non_exhaustive()
    }
}

impl Inertia {
    /// The current asset version
    #[must_use]
    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// Whether pages are pre-rendered by an SSR process
    #[must_use]
    pub fn is_ssr_enabled(&self) -> bool {
        self.inner.ssr.is_some()
    }

    /// The root template
    #[must_use]
    pub fn template(&self) -> &RootTemplate {
        &self.inner.template
    }

    /// Share a prop with every page
    pub fn share_prop(&self, key: impl Into<String>, prop: impl Into<Prop>) {
        let (key, prop) = (key.into(), prop.into());
        self.inner.shared_props.rcu(|props| {
            let mut props = Props::clone(props);
            props.insert(key.clone(), prop.clone());
            props
        });
    }

    /// The props shared with every page
    #[must_use]
    pub fn shared_props(&self) -> Arc<Props> {
        self.inner.shared_props.load_full()
    }

    /// A prop shared with every page
    #[must_use]
    pub fn shared_prop(&self, key: &str) -> Option<Prop> {
        self.inner.shared_props.load().get(key).cloned()
    }

    /// Remove all the shared props
    pub fn flush_shared_props(&self) {
        self.inner.shared_props.store(Arc::default());
    }

    /// Share a variable with every render of the root template
    pub fn share_template_datum(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.template.share_data(key, value.into());
    }

    /// Share variables with every render of the root template
    pub fn share_template_data(&self, data: TemplateData) {
        for (key, value) in data {
            self.inner.template.share_data(key, value);
        }
    }

    /// The variables shared with every render of the root template
    #[must_use]
    pub fn shared_template_data(&self) -> Arc<TemplateData> {
        self.inner.template.shared_data()
    }

    /// Remove all the variables shared with the root template
    pub fn flush_shared_template_data(&self) {
        self.inner.template.flush_data();
    }

    /// Make a function available in the root template, usually built with
    /// [`Value::from_function`]
    pub fn share_template_function(&self, name: impl Into<String>, function: Value) {
        self.inner.template.share_function(name, function);
    }

    /// Remove all the functions shared with the root template
    pub fn flush_shared_template_functions(&self) {
        self.inner.template.flush_functions();
    }
}
