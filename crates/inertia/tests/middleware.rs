// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use http::{Method, Request, StatusCode, header, request::Parts};
use inertia::{
    BoxError, ErrorWrapper, FlashProvider, Inertia, InertiaContext, InertiaLayer,
    InertiaRequestExt as _, MemoryFlashProvider, Prop, RenderError, ValidationErrors, props,
    testing::AssertableInertia,
};
use serde_json::json;
use tower::ServiceExt as _;

const TEMPLATE: &str = "<html><head>{{ inertiaHead }}</head><body>{{ inertia }}</body></html>";

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn index(ctx: InertiaContext) -> Result<Response, ErrorWrapper<RenderError>> {
    Ok(ctx
        .render(
            "Users/Index",
            props! {
                "users" => Prop::lazy(|| async {
                    Ok::<_, std::convert::Infallible>(json!(["alice", "bob"]))
                }),
                "count" => Prop::optional(2),
                "stats" => Prop::defer(json!({"active": 1})),
            },
        )
        .await?)
}

async fn store(mut ctx: InertiaContext) -> Response {
    ctx.set_validation_error("name", "The name field is required.");
    ctx.back().await
}

async fn update(ctx: InertiaContext) -> Result<Response, ErrorWrapper<RenderError>> {
    Ok(ctx.redirect("/users").await?)
}

async fn logout(mut ctx: InertiaContext) -> Result<Response, ErrorWrapper<RenderError>> {
    ctx.clear_history();
    Ok(ctx.location("/users").await?)
}

async fn empty() {}

struct App {
    router: Router,
    calls: Arc<AtomicUsize>,
}

fn app() -> App {
    let calls = Arc::new(AtomicUsize::new(0));
    let inertia = Inertia::builder(TEMPLATE)
        .version("v1")
        .flash_provider(MemoryFlashProvider::with_cookie("session"))
        .share_prop("app", "demo")
        .build()
        .unwrap();

    let counter = Arc::clone(&calls);
    let router = Router::new()
        .route(
            "/users",
            get(move |ctx: InertiaContext| {
                counter.fetch_add(1, Ordering::SeqCst);
                index(ctx)
            })
            .post(store)
            .put(update)
            .patch(update)
            .delete(update),
        )
        .route("/logout", post(logout))
        .route("/empty", post(empty))
        .route("/plain", get(|| async { "plain" }))
        .layer(InertiaLayer::new(inertia));

    App { router, calls }
}

fn inertia_request(method: Method, uri: &str) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-inertia", "true")
        .header("x-inertia-version", "v1")
}

#[tokio::test]
async fn test_first_visit() {
    init_tracing();
    let App { router, calls } = app();

    let request = Request::get("/users").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::VARY], "X-Inertia");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    AssertableInertia::from_response(response)
        .await
        .assert_component("Users/Index")
        .assert_version("v1")
        .assert_props(json!({
            "app": "demo",
            "errors": {},
            "users": ["alice", "bob"],
        }))
        .assert_deferred_props(json!({"default": ["stats"]}));
}

#[tokio::test]
async fn test_inertia_visit() {
    init_tracing();
    let App { router, .. } = app();

    let request = inertia_request(Method::GET, "/users?page=2")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-inertia"], "true");
    assert_eq!(response.headers()[header::VARY], "X-Inertia");

    AssertableInertia::from_response(response)
        .await
        .assert_url("/users?page=2")
        .assert_missing_prop("count")
        .assert_missing_prop("stats");
}

#[tokio::test]
async fn test_partial_reload() {
    init_tracing();
    let App { router, .. } = app();

    let request = inertia_request(Method::GET, "/users")
        .header("x-inertia-partial-component", "Users/Index")
        .header("x-inertia-partial-data", "count, stats")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    AssertableInertia::from_response(response)
        .await
        .assert_props(json!({
            "count": 2,
            "errors": {},
            "stats": {"active": 1},
        }))
        .assert_deferred_props(json!({}));
}

#[tokio::test]
async fn test_version_conflict() {
    init_tracing();
    let App { router, calls } = app();

    let request = Request::get("/users?page=2")
        .header("x-inertia", "true")
        .header("x-inertia-version", "v0")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response.headers()["x-inertia-location"], "/users?page=2");
    assert!(response.headers().get(header::VARY).is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_version_ignored_on_post() {
    init_tracing();
    let App { router, .. } = app();

    let request = Request::post("/users")
        .header("x-inertia", "true")
        .header("x-inertia-version", "v0")
        .header(header::REFERER, "/users/create")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/users/create");
}

#[tokio::test]
async fn test_empty_response_goes_back() {
    init_tracing();
    let App { router, .. } = app();

    let request = inertia_request(Method::POST, "/empty")
        .header(header::REFERER, "/users")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/users");
    assert_eq!(response.headers()[header::VARY], "X-Inertia");

    // Without a referer
    let request = inertia_request(Method::POST, "/empty")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[header::LOCATION], "/");

    // Regular requests are left alone
    let request = Request::post("/empty").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_redirect_after_update() {
    init_tracing();
    let App { router, .. } = app();

    for method in [Method::PUT, Method::PATCH, Method::DELETE] {
        let request = inertia_request(method.clone(), "/users")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{method}");
        assert_eq!(response.headers()[header::LOCATION], "/users");
    }

    // Regular requests keep their status
    let request = Request::put("/users").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_flashed_errors() {
    init_tracing();
    let App { router, .. } = app();

    let request = inertia_request(Method::POST, "/users")
        .header(header::COOKIE, "session=alice")
        .header(header::REFERER, "/users")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/users");

    // Another session doesn't see them
    let request = inertia_request(Method::GET, "/users")
        .header(header::COOKIE, "session=bob")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    AssertableInertia::from_response(response)
        .await
        .assert_prop("errors", json!({}));

    let request = inertia_request(Method::GET, "/users")
        .header(header::COOKIE, "session=alice")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    AssertableInertia::from_response(response)
        .await
        .assert_prop("errors", json!({"name": "The name field is required."}));

    // They are only shown once
    let request = inertia_request(Method::GET, "/users")
        .header(header::COOKIE, "session=alice")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    AssertableInertia::from_response(response)
        .await
        .assert_prop("errors", json!({}));
}

#[tokio::test]
async fn test_non_inertia_route() {
    init_tracing();
    let App { router, .. } = app();

    let request = Request::get("/plain").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::VARY], "X-Inertia");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"plain");
}

#[tokio::test]
async fn test_missing_layer() {
    init_tracing();
    let router = Router::new().route(
        "/",
        get(|ctx: InertiaContext| async move { ctx.back().await.into_response() }),
    );

    let request = Request::get("/").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_clear_history_on_next_visit() {
    init_tracing();
    let App { router, .. } = app();

    let request = inertia_request(Method::POST, "/logout")
        .header(header::COOKIE, "session=alice")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response.headers()["x-inertia-location"], "/users");

    let request = inertia_request(Method::GET, "/users")
        .header(header::COOKIE, "session=alice")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    AssertableInertia::from_response(response)
        .await
        .assert_clear_history(true)
        .assert_prop("errors", json!({}));

    // The flag is only sent once
    let request = inertia_request(Method::GET, "/users")
        .header(header::COOKIE, "session=alice")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    AssertableInertia::from_response(response)
        .await
        .assert_clear_history(false);
}

struct UnavailableStore(Arc<AtomicUsize>);

#[async_trait]
impl FlashProvider for UnavailableStore {
    async fn flash_errors(&self, _: &Parts, _: ValidationErrors) -> Result<(), BoxError> {
        Err("flash store unavailable".into())
    }

    async fn get_errors(&self, _: &Parts) -> Result<ValidationErrors, BoxError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err("flash store unavailable".into())
    }

    async fn should_clear_history(&self, _: &Parts) -> Result<bool, BoxError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err("flash store unavailable".into())
    }
}

#[tokio::test]
async fn test_flash_store_errors_are_ignored() {
    init_tracing();
    let reads = Arc::new(AtomicUsize::new(0));
    let inertia = Inertia::builder(TEMPLATE)
        .version("v1")
        .flash_provider(UnavailableStore(Arc::clone(&reads)))
        .build()
        .unwrap();
    let router = Router::new()
        .route("/users", get(index))
        .layer(InertiaLayer::new(inertia));

    let request = inertia_request(Method::GET, "/users")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(reads.load(Ordering::SeqCst), 2);
    AssertableInertia::from_response(response)
        .await
        .assert_component("Users/Index")
        .assert_prop("errors", json!({}))
        .assert_clear_history(false);
}
