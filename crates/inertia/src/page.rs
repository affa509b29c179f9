// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::collections::{BTreeMap, BTreeSet};

use http::request::Parts;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Inertia, Prop, PropError, PropKind, Props,
    request::{
        InertiaRequestExt as _, X_INERTIA_PARTIAL_COMPONENT, X_INERTIA_PARTIAL_DATA,
        X_INERTIA_PARTIAL_EXCEPT, X_INERTIA_RESET, header_list, header_str,
    },
};

/// The page object, sent as JSON to the client or embedded in the root
/// template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Name of the client-side component to render
    pub component: String,

    /// Resolved props
    pub props: BTreeMap<String, Value>,

    /// Path and query of the request
    pub url: String,

    /// Current asset version
    pub version: String,

    /// Whether the client should encrypt its history state
    pub encrypt_history: bool,

    /// Whether the client should clear its history
    pub clear_history: bool,

    /// Deferred props keys, by group
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deferred_props: BTreeMap<String, Vec<String>>,

    /// Keys of the props the client should merge
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_props: Vec<String>,
}

impl Inertia {
    /// Build the page object for the given component.
    ///
    /// Props are collected from the validation errors, the shared props, the
    /// request props and `props`, each overriding the previous ones, then
    /// filtered according to the partial reload headers, and resolved
    /// concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the remaining props fails to resolve.
    pub async fn build_page(
        &self,
        parts: &Parts,
        component: &str,
        props: Props,
    ) -> Result<Page, PropError> {
        let data = parts.inertia_data();

        let errors = data
            .map(|data| data.validation_errors.clone())
            .unwrap_or_default();
        let mut all = Props::new().with("errors", Prop::always(errors));
        all.extend(
            self.shared_props()
                .iter()
                .map(|(key, prop)| (key, prop.clone())),
        );
        if let Some(data) = data {
            all.extend(data.props.clone());
        }
        all.extend(props);

        let headers = &parts.headers;
        let partial = header_str(headers, &X_INERTIA_PARTIAL_COMPONENT) == Some(component);

        let mut deferred_props: BTreeMap<String, Vec<String>> = BTreeMap::new();
        if partial {
            let only = header_list(headers, &X_INERTIA_PARTIAL_DATA);
            let except = header_list(headers, &X_INERTIA_PARTIAL_EXCEPT);
            all.retain(|key, prop| match prop.kind() {
                PropKind::Always => true,
                _ if except.contains(key.as_str()) => false,
                // Lazy props are only sent when explicitly requested
                PropKind::Optional | PropKind::Deferred { .. } => only.contains(key.as_str()),
                PropKind::Regular => only.is_empty() || only.contains(key.as_str()),
            });
        } else {
            for (key, prop) in all.iter() {
                if let PropKind::Deferred { group } = prop.kind() {
                    deferred_props
                        .entry(group.clone())
                        .or_default()
                        .push(key.to_owned());
                }
            }

            all.retain(|_, prop| {
                !matches!(prop.kind(), PropKind::Optional | PropKind::Deferred { .. })
            });
        }

        let reset: BTreeSet<&str> = header_list(headers, &X_INERTIA_RESET);
        let merge_props = all
            .iter()
            .filter(|(key, prop)| prop.is_merge() && !reset.contains(key))
            .map(|(key, _)| key.to_owned())
            .collect();

        let props = all.resolve().await?;

        let url = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_owned(), ToString::to_string);

        Ok(Page {
            component: component.to_owned(),
            props,
            url,
            version: self.version().to_owned(),
            encrypt_history: data
                .and_then(|data| data.encrypt_history)
                .unwrap_or(self.inner.encrypt_history),
            clear_history: data.is_some_and(|data| data.clear_history),
            deferred_props,
            merge_props,
        })
    }
}
