// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use axum::{body::Body, response::Response};
use headers::{ContentType, HeaderMapExt as _};
use http::{HeaderValue, StatusCode, header::LOCATION, request::Parts};
use inertia_templates::{TemplateError, escape_html};
use thiserror::Error;
use tracing::warn;

use crate::{
    Inertia, PropError, Props,
    request::{InertiaRequestExt as _, X_INERTIA, X_INERTIA_LOCATION, is_inertia_request},
};

/// Failed to render a page, or to redirect
#[derive(Debug, Error)]
pub enum RenderError {
    /// A prop failed to resolve
    #[error(transparent)]
    Props(#[from] PropError),

    /// The page object failed to serialize
    #[error("failed to serialize the page")]
    Json(#[from] serde_json::Error),

    /// The root template failed to render
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The redirect target is not a valid header value
    #[error("invalid redirect location")]
    InvalidLocation(#[from] http::header::InvalidHeaderValue),
}

fn redirect_response(location: HeaderValue, status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response.headers_mut().insert(LOCATION, location);
    response
}

/// The URL to go back to: the `Referer`, or `/`
pub(crate) fn back_url(parts: &Parts) -> HeaderValue {
    parts
        .headers
        .get(http::header::REFERER)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("/"))
}

impl Inertia {
    /// Render a page.
    ///
    /// Inertia visits get the page object as JSON. Other requests get the
    /// root template, with the page embedded in the container element or
    /// pre-rendered by the SSR process.
    ///
    /// # Errors
    ///
    /// Returns an error if a prop fails to resolve, or the root template
    /// fails to render.
    #[tracing::instrument(
        name = "inertia.render",
        skip_all,
        fields(inertia.component = component),
        err,
    )]
    pub async fn render(
        &self,
        parts: &Parts,
        component: &str,
        props: Props,
    ) -> Result<Response, RenderError> {
        let page = self.build_page(parts, component, props).await?;

        if is_inertia_request(&parts.headers) {
            let body = serde_json::to_vec(&page)?;
            let mut response = Response::new(Body::from(body));
            response
                .headers_mut()
                .insert(X_INERTIA, HeaderValue::from_static("true"));
            response.headers_mut().typed_insert(ContentType::json());
            return Ok(response);
        }

        let page_json = serde_json::to_string(&page)?;
        let (inertia, inertia_head) = self.page_html(&page_json).await;
        let html = self
            .inner
            .template
            .render(&inertia, &inertia_head, &parts.template_data())?;

        let mut response = Response::new(Body::from(html));
        response.headers_mut().typed_insert(ContentType::from(mime::TEXT_HTML_UTF_8));
        Ok(response)
    }

    /// The markup of the page and its head tags, from the SSR process if
    /// enabled and working
    async fn page_html(&self, page_json: &str) -> (String, String) {
        if let Some(ssr) = &self.inner.ssr {
            match ssr.render(page_json).await {
                Ok(rendered) => {
                    let head = rendered.head_html();
                    return (rendered.body, head);
                }
                Err(e) => {
                    warn!(
                        error = &e as &dyn std::error::Error,
                        "Server-side rendering failed, falling back to client-side rendering"
                    );
                }
            }
        }

        let container = format!(
            r#"<div id="{}" data-page="{}"></div>"#,
            self.inner.container_id,
            escape_html(page_json)
        );
        (container, String::new())
    }

    /// Keep the validation errors and the clear-history flag of the request
    /// for the next one
    pub(crate) async fn flash_request_data(&self, parts: &Parts) {
        let Some(flash) = &self.inner.flash else {
            return;
        };

        let errors = parts.validation_errors();
        if !errors.is_empty() {
            if let Err(e) = flash.flash_errors(parts, errors).await {
                warn!(error = &*e as &dyn std::error::Error, "Failed to flash validation errors");
            }
        }

        if parts.should_clear_history() {
            if let Err(e) = flash.flash_clear_history(parts).await {
                warn!(error = &*e as &dyn std::error::Error, "Failed to flash the clear history flag");
            }
        }
    }

    /// Redirect to `url`, with a full page load for Inertia visits
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid header value
    pub async fn location(&self, parts: &Parts, url: &str) -> Result<Response, RenderError> {
        self.location_with_status(parts, url, StatusCode::FOUND)
            .await
    }

    /// Redirect to `url`, with a full page load for Inertia visits, using
    /// the given status for other requests
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid header value
    pub async fn location_with_status(
        &self,
        parts: &Parts,
        url: &str,
        status: StatusCode,
    ) -> Result<Response, RenderError> {
        let location = HeaderValue::try_from(url)?;
        self.flash_request_data(parts).await;

        if is_inertia_request(&parts.headers) {
            return Ok(location_conflict(location));
        }

        Ok(redirect_response(location, status))
    }

    /// Redirect to `url`
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid header value
    pub async fn redirect(&self, parts: &Parts, url: &str) -> Result<Response, RenderError> {
        self.redirect_with_status(parts, url, StatusCode::FOUND)
            .await
    }

    /// Redirect to `url` with the given status
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid header value
    pub async fn redirect_with_status(
        &self,
        parts: &Parts,
        url: &str,
        status: StatusCode,
    ) -> Result<Response, RenderError> {
        let location = HeaderValue::try_from(url)?;
        self.flash_request_data(parts).await;
        Ok(redirect_response(location, status))
    }

    /// Redirect to the previous page, as given by the `Referer` header, or
    /// to `/`
    pub async fn back(&self, parts: &Parts) -> Response {
        self.back_with_status(parts, StatusCode::FOUND).await
    }

    /// Redirect to the previous page with the given status
    pub async fn back_with_status(&self, parts: &Parts, status: StatusCode) -> Response {
        self.flash_request_data(parts).await;
        redirect_response(back_url(parts), status)
    }
}

/// Ask the Inertia client to navigate to `location` with a full page load
pub(crate) fn location_conflict(location: HeaderValue) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::CONFLICT;
    response.headers_mut().insert(X_INERTIA_LOCATION, location);
    response
}
