// ABOUTME: Domain error types for configuration, client access, execution lanes and content coding
// ABOUTME: Converts every domain error into the unified AppError at the HTTP boundary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

//! Error types
//!
//! Each concern gets its own `thiserror` enum so callers can match on exactly
//! the failures an operation can produce. All of them convert into
//! [`AppError`], which renders the JSON error body for HTTP responses.

use crate::lanes::LaneId;
use mongodb::bson;
pub use mongodb_axum_core::errors::{AppError, AppResult, ErrorCode, ErrorResponse};
use std::time::Duration;
use thiserror::Error;

/// Failures while configuring the application-scoped client
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The connection string could not be parsed
    #[error("invalid MongoDB connection string `{target}`: {source}")]
    InvalidConnectionTarget {
        /// Connection string with credentials redacted
        target: String,
        /// Driver parse error
        #[source]
        source: mongodb::error::Error,
    },
    /// The driver rejected the assembled client options
    #[error("invalid MongoDB client options: {0}")]
    InvalidOptions(#[source] mongodb::error::Error),
    /// An environment variable holds a value that does not parse
    #[error("invalid value `{value}` for environment variable {name}")]
    InvalidEnvironment {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },
}

/// Failures of operations issued through a shared or bound client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client was closed by `cleanup()`
    #[error("MongoDB client has been closed")]
    Closed,
    /// The driver reported an error
    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),
    /// The execution lane could not run the operation
    #[error(transparent)]
    Lane(#[from] LaneError),
}

/// Result alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures of tasks spawned onto an execution lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LaneError {
    /// The lane's runtime has shut down
    #[error("execution lane {0} is shut down")]
    ShutDown(LaneId),
    /// The task panicked while running on the lane
    #[error("task on execution lane {0} panicked")]
    Panicked(LaneId),
}

/// Failure to close a client gracefully
#[derive(Debug, Error)]
pub enum CloseError {
    /// Graceful close did not finish in time
    #[error("MongoDB client did not close within {0:?}")]
    TimedOut(Duration),
}

/// Failures of the content encode/decode pipeline
#[derive(Debug, Error)]
pub enum ContentError {
    /// The value could not be turned into a BSON value
    #[error("failed to serialize content: {0}")]
    Serialize(#[from] bson::ser::Error),
    /// The decoded BSON value does not match the requested type
    #[error("failed to deserialize content: {0}")]
    Deserialize(#[from] bson::de::Error),
    /// The body is not valid JSON
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
    /// The body is JSON but not valid extended JSON
    #[error("malformed extended JSON body: {0}")]
    ExtendedJson(#[from] bson::extjson::de::Error),
    /// No coder is registered for the media type
    #[error("no content coder registered for media type `{0}`")]
    UnsupportedMediaType(String),
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::config(error.to_string()).with_source(error)
    }
}

impl From<LaneError> for AppError {
    fn from(error: LaneError) -> Self {
        match error {
            LaneError::ShutDown(_) => Self::unavailable(error.to_string()),
            LaneError::Panicked(_) => Self::internal(error.to_string()),
        }
    }
}

impl From<ClientError> for AppError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Closed => Self::unavailable(error.to_string()),
            ClientError::Lane(lane) => lane.into(),
            ClientError::Driver(source) => Self::database(source.to_string()).with_source(source),
        }
    }
}

impl From<ContentError> for AppError {
    fn from(error: ContentError) -> Self {
        match error {
            ContentError::UnsupportedMediaType(media_type) => {
                Self::unsupported_media_type(media_type)
            }
            ContentError::Serialize(_) => Self::serialization(error.to_string()),
            ContentError::Deserialize(_) | ContentError::Json(_) | ContentError::ExtendedJson(_) => {
                Self::invalid_format(error.to_string())
            }
        }
    }
}
