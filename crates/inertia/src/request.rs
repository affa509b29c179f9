// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Protocol headers, and data attached to a request by handlers and
//! middlewares

use std::collections::BTreeSet;

use http::{Extensions, HeaderMap, HeaderName, Request, request::Parts};
use inertia_templates::{TemplateData, Value};

use crate::{Prop, Props, ValidationErrors};

/// Set by the client on every Inertia visit, and on every Inertia response
pub const X_INERTIA: HeaderName = HeaderName::from_static("x-inertia");

/// The asset version the client was built with
pub const X_INERTIA_VERSION: HeaderName = HeaderName::from_static("x-inertia-version");

/// The component a partial reload targets
pub const X_INERTIA_PARTIAL_COMPONENT: HeaderName =
    HeaderName::from_static("x-inertia-partial-component");

/// Comma-separated props a partial reload asks for
pub const X_INERTIA_PARTIAL_DATA: HeaderName = HeaderName::from_static("x-inertia-partial-data");

/// Comma-separated props a partial reload does not want
pub const X_INERTIA_PARTIAL_EXCEPT: HeaderName =
    HeaderName::from_static("x-inertia-partial-except");

/// Comma-separated merge props the client wants replaced instead
pub const X_INERTIA_RESET: HeaderName = HeaderName::from_static("x-inertia-reset");

/// Where the client should navigate with a full page load
pub const X_INERTIA_LOCATION: HeaderName = HeaderName::from_static("x-inertia-location");

/// Whether the request was made by the Inertia client
#[must_use]
pub fn is_inertia_request(headers: &HeaderMap) -> bool {
    headers.get(X_INERTIA).is_some_and(|value| !value.is_empty())
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Split a comma-separated header, skipping blank items
pub(crate) fn header_list<'a>(headers: &'a HeaderMap, name: &HeaderName) -> BTreeSet<&'a str> {
    header_str(headers, name)
        .into_iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Inertia data attached to a single request, merged with the shared data
/// when the page is rendered
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    /// Props, overriding the shared props
    pub props: Props,

    /// Root template variables, overriding the shared ones
    pub template_data: TemplateData,

    /// Sent in the `errors` prop, and flashed on redirects
    pub validation_errors: ValidationErrors,

    /// Overrides whether the history should be encrypted
    pub encrypt_history: Option<bool>,

    /// Ask the client to clear its history
    pub clear_history: bool,
}

/// Attach Inertia data to a request.
///
/// This is implemented on [`Request`] for middlewares, and on [`Parts`] for
/// handlers.
pub trait InertiaRequestExt {
    /// The request extensions
    fn extensions(&self) -> &Extensions;

    /// The request extensions, mutably
    fn extensions_mut(&mut self) -> &mut Extensions;

    /// The Inertia data attached to the request, if any
    fn inertia_data(&self) -> Option<&RequestData> {
        self.extensions().get()
    }

    /// Change the Inertia data attached to the request
    fn update_inertia_data(&mut self, f: impl FnOnce(&mut RequestData)) {
        let extensions = self.extensions_mut();
        let mut data = extensions.remove::<RequestData>().unwrap_or_default();
        f(&mut data);
        extensions.insert(data);
    }

    /// Set a prop for this request
    fn set_prop(&mut self, key: impl Into<String>, prop: impl Into<Prop>) {
        let (key, prop) = (key.into(), prop.into());
        self.update_inertia_data(|data| {
            data.props.insert(key, prop);
        });
    }

    /// Replace all the props of this request
    fn set_props(&mut self, props: Props) {
        self.update_inertia_data(|data| data.props = props);
    }

    /// The props of this request
    fn props(&self) -> Props {
        self.inertia_data()
            .map(|data| data.props.clone())
            .unwrap_or_default()
    }

    /// Set a root template variable for this request
    fn set_template_datum(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let (key, value) = (key.into(), value.into());
        self.update_inertia_data(|data| {
            data.template_data.insert(key, value);
        });
    }

    /// Replace all the root template variables of this request
    fn set_template_data(&mut self, template_data: TemplateData) {
        self.update_inertia_data(|data| data.template_data = template_data);
    }

    /// The root template variables of this request
    fn template_data(&self) -> TemplateData {
        self.inertia_data()
            .map(|data| data.template_data.clone())
            .unwrap_or_default()
    }

    /// Replace all the validation errors of this request
    fn set_validation_errors(&mut self, errors: ValidationErrors) {
        self.update_inertia_data(|data| data.validation_errors = errors);
    }

    /// Add validation errors, overriding existing ones with the same key
    fn add_validation_errors(&mut self, errors: ValidationErrors) {
        self.update_inertia_data(|data| data.validation_errors.extend(errors));
    }

    /// Set a single validation error
    fn set_validation_error(&mut self, key: impl Into<String>, message: impl Into<serde_json::Value>) {
        let (key, message) = (key.into(), message.into());
        self.update_inertia_data(|data| {
            data.validation_errors.insert(key, message);
        });
    }

    /// The validation errors of this request
    fn validation_errors(&self) -> ValidationErrors {
        self.inertia_data()
            .map(|data| data.validation_errors.clone())
            .unwrap_or_default()
    }

    /// Override whether the history should be encrypted for this request
    fn set_encrypt_history(&mut self, encrypt: bool) {
        self.update_inertia_data(|data| data.encrypt_history = Some(encrypt));
    }

    /// Whether the history encryption was overridden for this request
    fn encrypt_history(&self) -> Option<bool> {
        self.inertia_data().and_then(|data| data.encrypt_history)
    }

    /// Ask the client to clear its history
    fn clear_history(&mut self) {
        self.update_inertia_data(|data| data.clear_history = true);
    }

    /// Whether the client should clear its history
    fn should_clear_history(&self) -> bool {
        self.inertia_data().is_some_and(|data| data.clear_history)
    }
}

impl InertiaRequestExt for Parts {
    fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl<B> InertiaRequestExt for Request<B> {
    fn extensions(&self) -> &Extensions {
        Request::extensions(self)
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        Request::extensions_mut(self)
    }
}

/// Copy the parts of a request, extensions included
pub(crate) fn copy_parts(parts: &Parts) -> Parts {
    let mut request = Request::new(());
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = parts.uri.clone();
    *request.version_mut() = parts.version;
    *request.headers_mut() = parts.headers.clone();
    *request.extensions_mut() = parts.extensions.clone();
    request.into_parts().0
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_is_inertia_request() {
        let mut headers = HeaderMap::new();
        assert!(!is_inertia_request(&headers));

        headers.insert(X_INERTIA, HeaderValue::from_static(""));
        assert!(!is_inertia_request(&headers));

        headers.insert(X_INERTIA, HeaderValue::from_static("true"));
        assert!(is_inertia_request(&headers));
    }

    #[test]
    fn test_header_list() {
        let mut headers = HeaderMap::new();
        assert!(header_list(&headers, &X_INERTIA_PARTIAL_DATA).is_empty());

        headers.insert(
            X_INERTIA_PARTIAL_DATA,
            HeaderValue::from_static(" foo, bar,,baz ,"),
        );
        let list: Vec<_> = header_list(&headers, &X_INERTIA_PARTIAL_DATA)
            .into_iter()
            .collect();
        assert_eq!(list, ["bar", "baz", "foo"]);
    }

    #[test]
    fn test_request_data() {
        let mut request = Request::new(());
        assert!(request.inertia_data().is_none());
        assert!(request.validation_errors().is_empty());
        assert!(!request.should_clear_history());
        assert_eq!(request.encrypt_history(), None);

        request.set_prop("foo", "bar");
        request.set_prop("baz", 1);
        request.set_template_datum("title", "Home");
        request.set_validation_error("name", "required");
        request.add_validation_errors([("email".to_owned(), json!("invalid"))].into());
        request.set_encrypt_history(true);
        request.clear_history();

        assert_eq!(request.props().len(), 2);
        assert_eq!(request.template_data().len(), 1);
        assert_eq!(
            json!(request.validation_errors()),
            json!({"email": "invalid", "name": "required"})
        );
        assert_eq!(request.encrypt_history(), Some(true));
        assert!(request.should_clear_history());

        let (mut parts, ()) = request.into_parts();
        parts.set_props(Props::new().with("only", true));
        parts.set_validation_errors(ValidationErrors::new());
        parts.set_template_data(TemplateData::new());
        assert_eq!(parts.props().len(), 1);
        assert!(parts.validation_errors().is_empty());
        assert!(parts.template_data().is_empty());

        let copy = copy_parts(&parts);
        assert_eq!(copy.props().len(), 1);
        assert!(copy.should_clear_history());
    }
}
