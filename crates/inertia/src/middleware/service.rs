// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::task::{Context, Poll};

use axum::body::Body;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{
    HeaderValue, Method, Request, Response, StatusCode, header::VARY, request::Parts,
};
use http_body::Body as HttpBody;
use tower_service::Service;
use tracing::{debug, warn};

use crate::{
    BoxError, Inertia,
    request::{
        InertiaRequestExt as _, X_INERTIA_LOCATION, X_INERTIA_VERSION, copy_parts, header_str,
        is_inertia_request,
    },
    response::location_conflict,
};

/// A service which wraps the handlers of an Inertia app, see
/// [`crate::InertiaLayer`]
#[derive(Debug, Clone)]
pub struct InertiaService<S> {
    inner: S,
    inertia: Inertia,
}

impl<S> InertiaService<S> {
    /// Wrap a service
    pub fn new(inner: S, inertia: Inertia) -> Self {
        Self { inner, inertia }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for InertiaService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // Use the service which was polled ready, leave the clone in its place
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let inertia = self.inertia.clone();
        Box::pin(handle(inertia, inner, request))
    }
}

async fn handle<S, ReqBody, ResBody>(
    inertia: Inertia,
    mut inner: S,
    request: Request<ReqBody>,
) -> Result<Response<Body>, S::Error>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    let (mut parts, body) = request.into_parts();
    parts.extensions.insert(inertia.clone());
    inertia.pull_flashed_data(&mut parts).await;

    if !is_inertia_request(&parts.headers) {
        let response = inner.call(Request::from_parts(parts, body)).await?;
        let mut response = response.map(Body::new);
        add_vary(&mut response);
        return Ok(response);
    }

    let client_version = header_str(&parts.headers, &X_INERTIA_VERSION).unwrap_or_default();
    if parts.method == Method::GET && client_version != inertia.version() {
        debug!(
            client_version,
            server_version = inertia.version(),
            "Asset version changed, asking the client to reload"
        );

        // Keep the errors for the reloaded page
        inertia.flash_request_data(&parts).await;

        let location = parts
            .uri
            .path_and_query()
            .and_then(|path| HeaderValue::from_str(path.as_str()).ok())
            .unwrap_or_else(|| HeaderValue::from_static("/"));
        return Ok(location_conflict(location));
    }

    let request_parts = copy_parts(&parts);
    let response = inner.call(Request::from_parts(parts, body)).await?;

    let empty = response.body().size_hint().exact() == Some(0);
    let mut response = if response.status() == StatusCode::OK && empty {
        inertia.back(&request_parts).await
    } else {
        response.map(Body::new)
    };

    // Redirects after PUT, PATCH and DELETE must use GET
    if response.status() == StatusCode::FOUND
        && matches!(
            request_parts.method,
            Method::PUT | Method::PATCH | Method::DELETE
        )
    {
        *response.status_mut() = StatusCode::SEE_OTHER;
    }

    add_vary(&mut response);
    Ok(response)
}

/// Responses differ between Inertia and regular visits, except the location
/// conflicts which only Inertia visits get
fn add_vary(response: &mut Response<Body>) {
    if response.status() == StatusCode::CONFLICT
        && response.headers().contains_key(X_INERTIA_LOCATION)
    {
        return;
    }

    response
        .headers_mut()
        .append(VARY, HeaderValue::from_static("X-Inertia"));
}

impl Inertia {
    /// Take the data flashed by the previous request
    async fn pull_flashed_data(&self, parts: &mut Parts) {
        let Some(flash) = &self.inner.flash else {
            return;
        };

        match flash.get_errors(parts).await {
            Ok(errors) if !errors.is_empty() => parts.set_validation_errors(errors),
            Ok(_) => {}
            Err(e) => {
                warn!(
                    error = &*e as &dyn std::error::Error,
                    "Failed to get the flashed validation errors"
                );
            }
        }

        match flash.should_clear_history(parts).await {
            Ok(true) => parts.clear_history(),
            Ok(false) => {}
            Err(e) => {
                warn!(
                    error = &*e as &dyn std::error::Error,
                    "Failed to get the flashed clear history flag"
                );
            }
        }
    }
}
