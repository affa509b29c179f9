// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Routes of the demo app

use std::time::Duration;

use axum::{
    Form, Router,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use inertia::{
    ErrorWrapper, InertiaContext, InertiaRequestExt as _, Prop, RenderError, props,
};
use rand::{
    Rng,
    distributions::{Alphanumeric, DistString},
};
use serde::Deserialize;
use serde_json::json;

use crate::util::SESSION_COOKIE;

pub fn router() -> Router<()> {
    Router::new()
        .route("/", get(home))
        .route("/users", get(users).post(create_user))
        .route("/logout", post(logout))
        .layer(axum::middleware::from_fn(ensure_session))
}

async fn home(ctx: InertiaContext) -> Result<Response, ErrorWrapper<RenderError>> {
    Ok(ctx.render("Home/Index", props! { "text" => "world" }).await?)
}

async fn users(ctx: InertiaContext) -> Result<Response, ErrorWrapper<RenderError>> {
    let props = props! {
        "users" => Prop::lazy(|| async {
            Ok::<_, std::convert::Infallible>(json!([
                {"id": 1, "name": "Alice"},
                {"id": 2, "name": "Bob"},
            ]))
        }),
        "permissions" => Prop::optional(json!(["users.create"])),
        "stats" => Prop::defer(Prop::lazy(|| async {
            // Pretend this is expensive
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, std::convert::Infallible>(json!({"total": 2}))
        })),
        "activity" => Prop::defer_in("sidebar", json!([])).merge(),
    };

    Ok(ctx.render("Users/Index", props).await?)
}

#[derive(Debug, Deserialize)]
struct CreateUser {
    #[serde(default)]
    name: String,
}

async fn create_user(
    mut ctx: InertiaContext,
    Form(form): Form<CreateUser>,
) -> Result<Response, ErrorWrapper<RenderError>> {
    if form.name.trim().is_empty() {
        ctx.set_validation_error("name", "The name field is required.");
        return Ok(ctx.back().await);
    }

    tracing::info!(name = %form.name, "Created user");
    Ok(ctx.redirect("/users").await?)
}

async fn logout(mut ctx: InertiaContext) -> Result<Response, ErrorWrapper<RenderError>> {
    ctx.clear_history();
    Ok(ctx.location("/").await?)
}

const SESSION_ID_LENGTH: usize = 32;

/// Generate a random session ID
fn generate_session_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    Alphanumeric.sample_string(rng, SESSION_ID_LENGTH)
}

/// Give every visitor a session cookie, which keys the flashed data
async fn ensure_session(request: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    if jar.get(SESSION_COOKIE).is_some() {
        return next.run(request).await;
    }

    let response = next.run(request).await;

    let cookie = Cookie::build((SESSION_COOKIE, generate_session_id(&mut rand::thread_rng())))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    (jar.add(cookie), response).into_response()
}
