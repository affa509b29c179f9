// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Client for the server-side rendering process

use std::time::Duration;

use headers::{ContentType, HeaderMapExt as _};
use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Where the SSR process listens by default
pub const DEFAULT_SSR_URL: &str = "http://127.0.0.1:13714";

static USER_AGENT: &str = concat!("inertia-rs/", env!("CARGO_PKG_VERSION"));

/// Create a new [`reqwest::Client`] suitable to talk to the SSR process
///
/// # Errors
///
/// Returns an error if the client fails to build
pub fn client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(2))
        .build()
}

/// The markup rendered by the SSR process
#[derive(Debug, Clone, Deserialize)]
pub struct SsrResponse {
    /// Tags to include in the `<head>`
    #[serde(default)]
    pub head: Vec<String>,

    /// The rendered page
    pub body: String,
}

impl SsrResponse {
    /// The head tags, one per line
    #[must_use]
    pub fn head_html(&self) -> String {
        self.head.join("\n")
    }
}

/// Failed to render a page through the SSR process
#[derive(Debug, Error)]
pub enum SsrError {
    /// The request failed, or the response could not be decoded
    #[error("failed to call the SSR process")]
    Request(#[from] reqwest::Error),

    /// The SSR process answered with an error
    #[error("the SSR process answered with status {0}")]
    Status(StatusCode),
}

/// Sends pages to the SSR process and gets the rendered markup back
#[derive(Debug, Clone)]
pub struct SsrClient {
    client: reqwest::Client,
    render_url: String,
}

impl SsrClient {
    /// Create a client for the SSR process at `url`. The `/render` suffix is
    /// optional.
    #[must_use]
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        let base = url.trim_end_matches('/');
        let base = base.strip_suffix("/render").unwrap_or(base);
        Self {
            client,
            render_url: format!("{base}/render"),
        }
    }

    /// The endpoint pages are sent to
    #[must_use]
    pub fn render_url(&self) -> &str {
        &self.render_url
    }

    /// Render a page, given as its JSON representation
    ///
    /// # Errors
    ///
    /// Returns an error if the SSR process can't be reached, answers with an
    /// error status, or with an invalid body.
    #[tracing::instrument(
        name = "inertia.ssr.render",
        skip_all,
        fields(url = %self.render_url),
        err,
    )]
    pub async fn render(&self, page_json: &str) -> Result<SsrResponse, SsrError> {
        let mut headers = http::HeaderMap::new();
        headers.typed_insert(ContentType::json());

        let response = self
            .client
            .post(&self.render_url)
            .headers(headers)
            .body(page_json.to_owned())
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(SsrError::Status(status));
        }

        Ok(response.json().await?)
    }
}
