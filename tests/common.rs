// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides quiet logging, application builders and the live-deployment skip helper
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `mongodb_axum`

use mongodb_axum::Application;
use std::sync::Once;

/// Connection string that parses but never needs a running server
pub const UNUSED_LOCAL_URI: &str = "mongodb://localhost:27017";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Application with `lanes` execution lanes
pub fn create_test_application(lanes: usize) -> Application {
    init_test_logging();
    Application::with_lane_count(lanes).expect("start execution lanes")
}

/// Application whose client is configured against a local connection string
///
/// No server is contacted until an operation runs.
pub async fn create_configured_application(lanes: usize) -> Application {
    let application = create_test_application(lanes);
    application
        .mongodb()
        .configure(UNUSED_LOCAL_URI, None)
        .await
        .expect("configure local client");
    application
}

/// Connection string of a live deployment, from `MONGODB_URI`
///
/// Returns None if `MONGODB_URI` is not set (allows skipping tests without a deployment)
pub fn live_mongodb_uri() -> Option<String> {
    let uri = std::env::var("MONGODB_URI").ok();
    if uri.is_none() {
        println!("MONGODB_URI not set, skipping live MongoDB tests");
    }
    uri
}

/// Stop the application's client and lanes
pub async fn teardown(application: &Application) {
    application.mongodb().cleanup().await;
    application.shutdown().await;
}
