// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use axum::{
    extract::FromRequestParts,
    response::{IntoResponse, Response},
};
use http::{Extensions, StatusCode, request::Parts};
use thiserror::Error;

use crate::{
    Inertia, Props, RenderError,
    request::{InertiaRequestExt, copy_parts},
};

/// The [`InertiaLayer`](crate::InertiaLayer) is missing in front of the
/// handler
#[derive(Debug, Error)]
#[error("the Inertia layer is missing")]
pub struct MissingInertiaLayer;

impl IntoResponse for MissingInertiaLayer {
    fn into_response(self) -> Response {
        tracing::error!("{self}");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Extracts the adapter along with the request, to render pages and
/// redirect from axum handlers.
///
/// Data attached to it through [`InertiaRequestExt`] is used by the
/// responses it creates.
#[derive(Debug)]
pub struct InertiaContext {
    inertia: Inertia,
    parts: Parts,
}

impl<S: Send + Sync> FromRequestParts<S> for InertiaContext {
    type Rejection = MissingInertiaLayer;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let inertia = parts
            .extensions
            .get::<Inertia>()
            .cloned()
            .ok_or(MissingInertiaLayer)?;

        Ok(Self {
            inertia,
            parts: copy_parts(parts),
        })
    }
}

impl InertiaRequestExt for InertiaContext {
    fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }
}

impl InertiaContext {
    /// The adapter
    #[must_use]
    pub fn inertia(&self) -> &Inertia {
        &self.inertia
    }

    /// The request
    #[must_use]
    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Render a page, see [`Inertia::render`]
    ///
    /// # Errors
    ///
    /// Returns an error if the page fails to render
    pub async fn render(&self, component: &str, props: Props) -> Result<Response, RenderError> {
        self.inertia.render(&self.parts, component, props).await
    }

    /// Redirect with a full page load, see [`Inertia::location`]
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid header value
    pub async fn location(&self, url: &str) -> Result<Response, RenderError> {
        self.inertia.location(&self.parts, url).await
    }

    /// Redirect, see [`Inertia::redirect`]
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid header value
    pub async fn redirect(&self, url: &str) -> Result<Response, RenderError> {
        self.inertia.redirect(&self.parts, url).await
    }

    /// Redirect to the previous page, see [`Inertia::back`]
    pub async fn back(&self) -> Response {
        self.inertia.back(&self.parts).await
    }
}
