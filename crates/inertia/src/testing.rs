// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Assertions on rendered pages, for the tests of Inertia apps.
//!
//! ```
//! use inertia::testing::AssertableInertia;
//! use serde_json::json;
//!
//! let html = r#"<div id="app" data-page="{&quot;component&quot;:&quot;Home&quot;,&quot;props&quot;:{&quot;text&quot;:&quot;world&quot;},&quot;url&quot;:&quot;&#x2f;&quot;,&quot;version&quot;:&quot;&quot;,&quot;encryptHistory&quot;:false,&quot;clearHistory&quot;:false}"></div>"#;
//!
//! AssertableInertia::from_html(html)
//!     .assert_component("Home")
//!     .assert_url("/")
//!     .assert_props(json!({"text": "world"}));
//! ```

use axum::{body::Body, response::Response};
use serde_json::Value;

use crate::Page;

/// A page extracted from a response, with assertions on its fields.
///
/// The assertions panic with a message describing the mismatch.
#[derive(Debug, Clone)]
pub struct AssertableInertia {
    page: Page,
}

const DATA_PAGE: &str = " data-page=\"";

/// Reverse the escaping done when embedding the page in the root template
fn unescape_html(input: &str) -> String {
    input
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&#x2f;", "/")
        .replace("&#47;", "/")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Find the page object in the `data-page` attribute of an HTML document
fn find_page(html: &str) -> Option<Page> {
    html.match_indices(DATA_PAGE).find_map(|(start, _)| {
        let value = &html[start + DATA_PAGE.len()..];
        let end = value.find('"')?;
        serde_json::from_str(&unescape_html(&value[..end])).ok()
    })
}

impl AssertableInertia {
    /// Wrap an already extracted page
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Parse the body of a response to an Inertia visit
    ///
    /// # Panics
    ///
    /// Panics if the body is not a page object
    #[must_use]
    #[track_caller]
    pub fn from_json(body: &[u8]) -> Self {
        match serde_json::from_slice(body) {
            Ok(page) => Self { page },
            Err(e) => panic!("invalid inertia response: {e}"),
        }
    }

    /// Extract the page embedded in an HTML document
    ///
    /// # Panics
    ///
    /// Panics if the document has no valid `data-page` attribute
    #[must_use]
    #[track_caller]
    pub fn from_html(html: &str) -> Self {
        match find_page(html) {
            Some(page) => Self { page },
            None => panic!("invalid inertia response: no page found in the document"),
        }
    }

    /// Extract the page from a body, either JSON or HTML
    ///
    /// # Panics
    ///
    /// Panics if no page can be found in the body
    #[must_use]
    #[track_caller]
    pub fn from_body(body: &[u8]) -> Self {
        if let Ok(page) = serde_json::from_slice(body) {
            return Self { page };
        }

        match std::str::from_utf8(body).ok().and_then(find_page) {
            Some(page) => Self { page },
            None => panic!("invalid inertia response: no page found in the body"),
        }
    }

    /// Read the body of a response and extract its page
    ///
    /// # Panics
    ///
    /// Panics if the body can't be read, or if no page can be found in it
    pub async fn from_response(response: Response<Body>) -> Self {
        let bytes = match axum::body::to_bytes(response.into_body(), usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => panic!("invalid inertia response: failed to read the body: {e}"),
        };
        Self::from_body(&bytes)
    }

    /// The extracted page
    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Assert the page renders the given component
    #[track_caller]
    pub fn assert_component(&self, component: &str) -> &Self {
        assert!(
            self.page.component == component,
            "inertia: component={}, want={component}",
            self.page.component,
        );
        self
    }

    /// Assert the asset version of the page
    #[track_caller]
    pub fn assert_version(&self, version: &str) -> &Self {
        assert!(
            self.page.version == version,
            "inertia: version={}, want={version}",
            self.page.version,
        );
        self
    }

    /// Assert the URL of the page
    #[track_caller]
    pub fn assert_url(&self, url: &str) -> &Self {
        assert!(
            self.page.url == url,
            "inertia: url={}, want={url}",
            self.page.url,
        );
        self
    }

    /// Assert the props of the page, as a JSON object
    #[track_caller]
    pub fn assert_props(&self, props: Value) -> &Self {
        let actual = serde_json::to_value(&self.page.props).unwrap_or_default();
        assert!(
            actual == props,
            "inertia: props={actual}, want={props}",
        );
        self
    }

    /// Assert the value of a single prop
    #[track_caller]
    pub fn assert_prop(&self, key: &str, value: Value) -> &Self {
        match self.page.props.get(key) {
            Some(actual) => assert!(
                *actual == value,
                "inertia: props.{key}={actual}, want={value}",
            ),
            None => panic!("inertia: props.{key} is missing, want={value}"),
        }
        self
    }

    /// Assert the page has no prop with the given key
    #[track_caller]
    pub fn assert_missing_prop(&self, key: &str) -> &Self {
        if let Some(actual) = self.page.props.get(key) {
            panic!("inertia: props.{key}={actual}, want it missing");
        }
        self
    }

    /// Assert the page asks the client to encrypt its history, or not
    #[track_caller]
    pub fn assert_encrypt_history(&self, encrypt_history: bool) -> &Self {
        assert!(
            self.page.encrypt_history == encrypt_history,
            "inertia: encryptHistory={}, want={encrypt_history}",
            self.page.encrypt_history,
        );
        self
    }

    /// Assert the page asks the client to clear its history, or not
    #[track_caller]
    pub fn assert_clear_history(&self, clear_history: bool) -> &Self {
        assert!(
            self.page.clear_history == clear_history,
            "inertia: clearHistory={}, want={clear_history}",
            self.page.clear_history,
        );
        self
    }

    /// Assert the deferred props of the page, as a JSON object of groups
    #[track_caller]
    pub fn assert_deferred_props(&self, deferred_props: Value) -> &Self {
        let actual = serde_json::to_value(&self.page.deferred_props).unwrap_or_default();
        assert!(
            actual == deferred_props,
            "inertia: deferredProps={actual}, want={deferred_props}",
        );
        self
    }

    /// Assert the keys of the props the client should merge
    #[track_caller]
    pub fn assert_merge_props(&self, merge_props: &[&str]) -> &Self {
        assert!(
            self.page.merge_props == merge_props,
            "inertia: mergeProps={:?}, want={merge_props:?}",
            self.page.merge_props,
        );
        self
    }
}
