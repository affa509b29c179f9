// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::time::Duration;

use axum::{Router, response::Response};
use headers::{CacheControl, HeaderMapExt as _};
use inertia::{Inertia, InertiaLayer};
use inertia_config::HttpConfig;
use tower::Layer;
use tower_http::{
    services::{ServeDir, fs::ServeFileSystemResponseBody},
    trace::TraceLayer,
};

/// Build the router of the demo app, along with the static assets
pub fn build_router(inertia: Inertia, config: &HttpConfig) -> Router<()> {
    let static_service = ServeDir::new(&config.assets_path)
        .append_index_html_on_directories(false)
        .precompressed_br()
        .precompressed_gzip();

    let add_cache_headers =
        axum::middleware::map_response(async |mut res: Response<ServeFileSystemResponseBody>| {
            let cache_control = if res.status().is_client_error() {
                // Cache 404s for 5 minutes
                CacheControl::new()
                    .with_public()
                    .with_max_age(Duration::from_secs(5 * 60))
            } else {
                // Built assets have a hash in their name, cache them for a year
                CacheControl::new()
                    .with_public()
                    .with_max_age(Duration::from_secs(365 * 24 * 60 * 60))
                    .with_immutable()
            };
            res.headers_mut().typed_insert(cache_control);
            res
        });

    let assets = add_cache_headers.layer(static_service);
    let router = crate::app::router().layer(InertiaLayer::new(inertia));

    let prefix = config.assets_prefix.trim_end_matches('/');
    let router = if prefix.is_empty() {
        router.fallback_service(assets)
    } else {
        router.nest_service(prefix, assets)
    };

    router.layer(TraceLayer::new_for_http())
}
