// ABOUTME: Middleware that assigns each request an execution lane and runs the rest of the stack on it
// ABOUTME: Handlers read the assigned lane from request extensions to bind clients to it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

//! Lane Pinning Middleware
//!
//! Picks the next lane of the application's [`LaneGroup`](crate::lanes::LaneGroup),
//! inserts its [`ExecutionLane`] into the request extensions and runs the
//! inner service on that lane. Everything downstream, including handlers and
//! the client operations they bind to the same lane, completes on one thread.
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{middleware, routing::get, Extension, Router};
//! use mongodb_axum::lanes::ExecutionLane;
//! use mongodb_axum::middleware::pin_to_lane;
//! use mongodb_axum::Application;
//!
//! async fn handler(Extension(lane): Extension<ExecutionLane>) -> String {
//!     format!("lane {}", lane.index())
//! }
//!
//! # fn example(application: Application) {
//! let app: Router = Router::new()
//!     .route("/", get(handler))
//!     .layer(middleware::from_fn_with_state(application.clone(), pin_to_lane))
//!     .with_state(application);
//! # }
//! ```

use crate::application::Application;
use crate::errors::AppError;
use crate::lanes::ExecutionLane;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, Instrument};

/// Run the request on an execution lane
///
/// A request that already carries an [`ExecutionLane`] keeps it. If the lane
/// cannot run the request, the response is the matching [`AppError`].
pub async fn pin_to_lane(
    State(application): State<Application>,
    mut req: Request,
    next: Next,
) -> Response {
    let lane = match req.extensions().get::<ExecutionLane>() {
        Some(lane) => lane.clone(),
        None => {
            let lane = application.lanes().next();
            req.extensions_mut().insert(lane.clone());
            lane
        }
    };

    if lane.is_current() {
        return next.run(req).await;
    }

    debug!(lane = %lane.id(), path = %req.uri().path(), "pinned request to execution lane");
    let span = tracing::Span::current();
    // Dropping this future (client gone) cancels the request on the lane as well
    match lane
        .spawn(next.run(req).instrument(span))
        .abort_on_drop()
        .await
    {
        Ok(response) => response,
        Err(error) => AppError::from(error).into_response(),
    }
}
