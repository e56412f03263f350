// ABOUTME: Configuration module for the MongoDB client and the demo server
// ABOUTME: Loads settings from environment variables with documented defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

//! Configuration
//!
//! - **Mongo**: connection string and client options forwarded to `configure`
//! - **Server**: HTTP port, lane count and content coder selection

/// MongoDB connection configuration
pub mod mongo;
/// HTTP server configuration
pub mod server;

pub use mongo::{MongoClientOptions, MongoConfig};
pub use server::ServerConfig;

use crate::errors::ConfigError;
use std::env;
use std::str::FromStr;

/// Parse an optional environment variable
///
/// Unset variables yield `None`; set but unparsable ones are an error.
pub(crate) fn env_parse<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvironment { name, value }),
        Err(_) => Ok(None),
    }
}

/// Parse a boolean environment variable (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`)
pub(crate) fn env_flag(name: &'static str) -> Result<Option<bool>, ConfigError> {
    let Ok(value) = env::var(name) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidEnvironment { name, value }),
    }
}
