// ABOUTME: HTTP tests for lane pinning and the MongoDbRequest extractor
// ABOUTME: Verifies handlers run on their request's lane and misconfigured routers fail with 500
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Extension, Router,
};
use common::{create_configured_application, create_test_application, teardown};
use mongodb_axum::errors::{AppError, AppResult};
use mongodb_axum::lanes::ExecutionLane;
use mongodb_axum::middleware::ApplicationRouterExt;
use mongodb_axum::mongo::MongoDbRequest;
use mongodb_axum::Application;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tower::ServiceExt;

async fn lane_index(mongodb: MongoDbRequest) -> AppResult<String> {
    if !mongodb.lane().is_current() {
        return Err(AppError::internal("handler is not running on its lane"));
    }
    let bound = mongodb.client();
    if bound.lane() != mongodb.lane() || bound != mongodb.client() {
        return Err(AppError::internal("bound client is not on the request lane"));
    }
    Ok(mongodb.lane().index().to_string())
}

async fn current_lane(Extension(lane): Extension<ExecutionLane>) -> String {
    let on_lane = ExecutionLane::current() == Some(lane.id());
    format!("{}:{on_lane}", lane.index())
}

async fn configured(mongodb: MongoDbRequest) -> &'static str {
    if mongodb.try_client().is_some() {
        "configured"
    } else {
        "unconfigured"
    }
}

async fn eager_client(mongodb: MongoDbRequest) -> String {
    mongodb.client().lane().index().to_string()
}

static SLOW_HANDLER_DROPPED: AtomicBool = AtomicBool::new(false);

struct FlagOnDrop(&'static AtomicBool);

impl Drop for FlagOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

async fn never_responds() -> &'static str {
    let _flag = FlagOnDrop(&SLOW_HANDLER_DROPPED);
    std::future::pending::<()>().await;
    "unreachable"
}

fn router(application: &Application) -> Router {
    Router::<Application>::new()
        .route("/lane", get(lane_index))
        .route("/current", get(current_lane))
        .route("/configured", get(configured))
        .route("/eager", get(eager_client))
        .route("/slow", get(never_responds))
        .with_application(application.clone())
}

async fn get_text(router: Router, uri: &str) -> Result<(StatusCode, String)> {
    let request = Request::builder().uri(uri).body(Body::empty())?;
    let response = router.oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, String::from_utf8(bytes.to_vec())?))
}

#[tokio::test]
async fn test_handlers_run_on_request_lane() -> Result<()> {
    let application = create_configured_application(2).await;
    let router = router(&application);

    let (status, first) = get_text(router.clone(), "/lane").await?;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = get_text(router, "/lane").await?;
    assert_eq!(status, StatusCode::OK);

    // Consecutive requests are spread round robin over the two lanes
    assert_ne!(first, second);

    teardown(&application).await;
    Ok(())
}

#[tokio::test]
async fn test_lane_extension_matches_current_lane() -> Result<()> {
    let application = create_test_application(3);

    let (status, body) = get_text(router(&application), "/current").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.ends_with(":true"), "unexpected body {body}");

    application.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_try_client_reports_configuration() -> Result<()> {
    let application = create_test_application(1);
    let (_, body) = get_text(router(&application), "/configured").await?;
    assert_eq!(body, "unconfigured");

    application
        .mongodb()
        .configure(common::UNUSED_LOCAL_URI, None)
        .await?;
    let (_, body) = get_text(router(&application), "/configured").await?;
    assert_eq!(body, "configured");

    teardown(&application).await;
    Ok(())
}

#[tokio::test]
async fn test_unconfigured_client_fails_the_request() -> Result<()> {
    let application = create_test_application(1);

    let (status, _) = get_text(router(&application), "/eager").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // The lane survives the failed request
    let (status, _) = get_text(router(&application), "/current").await?;
    assert_eq!(status, StatusCode::OK);

    application.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_unpinned_router_rejects_extractor() -> Result<()> {
    let application = create_configured_application(1).await;
    let router = Router::new()
        .route("/lane", get(lane_index))
        .with_state(application.clone());

    let (status, body) = get_text(router, "/lane").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("CONFIG_MISSING"), "unexpected body {body}");

    teardown(&application).await;
    Ok(())
}

#[tokio::test]
async fn test_stopped_lanes_return_503() -> Result<()> {
    let application = create_test_application(1);
    let router = router(&application);
    application.shutdown().await;

    let (status, _) = get_text(router, "/current").await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn test_abandoned_request_is_cancelled_on_its_lane() -> Result<()> {
    let application = create_test_application(1);
    let request = Request::builder().uri("/slow").body(Body::empty())?;

    let abandoned =
        tokio::time::timeout(Duration::from_millis(100), router(&application).oneshot(request))
            .await;
    assert!(abandoned.is_err());

    for _ in 0..100 {
        if SLOW_HANDLER_DROPPED.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(SLOW_HANDLER_DROPPED.load(Ordering::SeqCst));

    application.shutdown().await;
    Ok(())
}
