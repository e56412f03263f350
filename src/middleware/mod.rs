// ABOUTME: HTTP middleware that pins requests to execution lanes and encodes Content responses
// ABOUTME: Also provides the router extension that installs both layers with the application state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

pub mod content;
pub mod lanes;

// Response encoding for `Content<T>` values
pub use content::encode_content;

// Per-request lane pinning
pub use lanes::pin_to_lane;

use crate::application::Application;
use axum::middleware::from_fn_with_state;
use axum::Router;

/// Install the adapter's layers on a router and attach the application state
pub trait ApplicationRouterExt {
    /// Pin every request to an execution lane, encode `Content` responses and
    /// provide `application` as router state
    fn with_application(self, application: Application) -> Router;
}

impl ApplicationRouterExt for Router<Application> {
    fn with_application(self, application: Application) -> Router {
        // The last layer added runs first: requests are pinned before anything else
        self.layer(from_fn_with_state(application.clone(), encode_content))
            .layer(from_fn_with_state(application.clone(), pin_to_lane))
            .with_state(application)
    }
}
