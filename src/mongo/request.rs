// ABOUTME: Per-request extractor giving handlers a client bound to the request's execution lane
// ABOUTME: Rejects requests that were not pinned to a lane by the pin_to_lane middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

use super::bound::BoundClient;
use crate::application::Application;
use crate::errors::AppError;
use crate::lanes::ExecutionLane;
use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use http::request::Parts;

/// Request-scoped access to the application's MongoDB client
///
/// ```rust,no_run
/// use mongodb_axum::errors::AppResult;
/// use mongodb_axum::mongo::MongoDbRequest;
///
/// async fn databases(mongodb: MongoDbRequest) -> AppResult<String> {
///     let names = mongodb.client().list_database_names().await?;
///     Ok(names.join(","))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MongoDbRequest {
    application: Application,
    lane: ExecutionLane,
}

impl MongoDbRequest {
    /// Lane the request is running on
    #[must_use]
    pub const fn lane(&self) -> &ExecutionLane {
        &self.lane
    }

    /// The application's client bound to this request's lane
    ///
    /// Each call returns a new handle; handles from the same request compare
    /// equal.
    ///
    /// # Panics
    ///
    /// Panics if the application's client has not been configured
    #[must_use]
    pub fn client(&self) -> BoundClient {
        self.application.mongodb().bind(&self.lane)
    }

    /// Like [`client`](Self::client), but `None` when no client is configured
    #[must_use]
    pub fn try_client(&self) -> Option<BoundClient> {
        self.application
            .mongodb()
            .try_client()
            .map(|shared| shared.bound(&self.lane))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MongoDbRequest
where
    S: Send + Sync,
    Application: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let lane = parts.extensions.get::<ExecutionLane>().cloned().ok_or_else(|| {
            AppError::config_missing(
                "request is not pinned to an execution lane; add the pin_to_lane middleware",
            )
        })?;
        Ok(Self {
            application: Application::from_ref(state),
            lane,
        })
    }
}
