// ABOUTME: Constants for library metadata, environment variables and defaults
// ABOUTME: Pure data constants grouped by domain for the mongodb-axum adapter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

//! Constants module
//!
//! Constants are grouped by domain rather than kept in one flat namespace.

/// Identifying metadata reported to the driver for diagnostics
pub mod library {
    /// Name registered with the driver handshake as a wrapping library
    pub const NAME: &str = "mongodb-axum";
}

/// Service names used in structured logging
pub mod service_names {
    /// Default service name for the demo server
    pub const DEMO_SERVER: &str = "mongodb-axum-demo";
}

/// Media types understood by the content pipeline
pub mod media_types {
    /// JSON media type, also used for extended JSON
    pub const APPLICATION_JSON: &str = "application/json";
}

/// MongoDB connection defaults
pub mod mongodb {
    /// Connection string used when none is configured
    pub const DEFAULT_CONNECTION_STRING: &str = "mongodb://localhost:27017";

    /// Upper bound on a graceful client close during cleanup
    pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;
}

/// Network defaults
pub mod ports {
    /// Default HTTP port for the demo server
    pub const DEFAULT_HTTP_PORT: u16 = 8080;
}

/// Environment variable names
pub mod env_vars {
    /// MongoDB connection string
    pub const MONGODB_URI: &str = "MONGODB_URI";
    /// Maximum connections per server in the pool
    pub const MONGODB_MAX_POOL_SIZE: &str = "MONGODB_MAX_POOL_SIZE";
    /// Minimum connections kept open per server
    pub const MONGODB_MIN_POOL_SIZE: &str = "MONGODB_MIN_POOL_SIZE";
    /// Connect timeout in seconds
    pub const MONGODB_CONNECT_TIMEOUT_SECS: &str = "MONGODB_CONNECT_TIMEOUT_SECS";
    /// Server selection timeout in seconds
    pub const MONGODB_SERVER_SELECTION_TIMEOUT_SECS: &str =
        "MONGODB_SERVER_SELECTION_TIMEOUT_SECS";
    /// Application name reported in the driver handshake
    pub const MONGODB_APP_NAME: &str = "MONGODB_APP_NAME";
    /// Force TLS on or off
    pub const MONGODB_TLS: &str = "MONGODB_TLS";
    /// Graceful close timeout in seconds
    pub const MONGODB_SHUTDOWN_TIMEOUT_SECS: &str = "MONGODB_SHUTDOWN_TIMEOUT_SECS";
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Number of execution lanes
    pub const LANE_COUNT: &str = "LANE_COUNT";
    /// Register extended JSON coders for `application/json` at startup
    pub const EXTENDED_JSON: &str = "EXTENDED_JSON";
}
