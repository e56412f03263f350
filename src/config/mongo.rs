// ABOUTME: MongoDB client configuration: connection string plus the options forwarded to the driver
// ABOUTME: Loaded from MONGODB_* environment variables and applied on top of the parsed connection string
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

use super::{env_flag, env_parse};
use crate::errors::ConfigError;
use mongodb::options::{ClientOptions, Tls, TlsOptions};
use mongodb_axum_core::constants::{env_vars, mongodb as defaults};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Options forwarded to the driver when configuring the client
///
/// Unset fields leave whatever the connection string specifies (or the
/// driver default) untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoClientOptions {
    /// Maximum connections per server
    pub max_pool_size: Option<u32>,
    /// Minimum connections kept open per server
    pub min_pool_size: Option<u32>,
    /// Timeout for establishing a connection, in seconds
    pub connect_timeout_secs: Option<u64>,
    /// Timeout for selecting a server, in seconds
    pub server_selection_timeout_secs: Option<u64>,
    /// Application name reported in the handshake
    pub app_name: Option<String>,
    /// Force TLS on or off
    pub tls: Option<bool>,
    /// Upper bound on a graceful close during cleanup, in seconds
    pub shutdown_timeout_secs: Option<u64>,
}

impl MongoClientOptions {
    /// Load options from `MONGODB_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvironment`] if a variable is set to an
    /// unparsable value
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            max_pool_size: env_parse(env_vars::MONGODB_MAX_POOL_SIZE)?,
            min_pool_size: env_parse(env_vars::MONGODB_MIN_POOL_SIZE)?,
            connect_timeout_secs: env_parse(env_vars::MONGODB_CONNECT_TIMEOUT_SECS)?,
            server_selection_timeout_secs: env_parse(
                env_vars::MONGODB_SERVER_SELECTION_TIMEOUT_SECS,
            )?,
            app_name: env::var(env_vars::MONGODB_APP_NAME)
                .ok()
                .filter(|name| !name.trim().is_empty()),
            tls: env_flag(env_vars::MONGODB_TLS)?,
            shutdown_timeout_secs: env_parse(env_vars::MONGODB_SHUTDOWN_TIMEOUT_SECS)?,
        })
    }

    /// Write the set fields into driver options
    pub fn apply_to(&self, options: &mut ClientOptions) {
        if let Some(size) = self.max_pool_size {
            options.max_pool_size = Some(size);
        }
        if let Some(size) = self.min_pool_size {
            options.min_pool_size = Some(size);
        }
        if let Some(secs) = self.connect_timeout_secs {
            options.connect_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = self.server_selection_timeout_secs {
            options.server_selection_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(name) = &self.app_name {
            options.app_name = Some(name.clone());
        }
        match self.tls {
            Some(true) => options.tls = Some(Tls::Enabled(TlsOptions::default())),
            Some(false) => options.tls = Some(Tls::Disabled),
            None => {}
        }
    }

    /// Timeout applied to the graceful close in `cleanup`
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(
            self.shutdown_timeout_secs
                .unwrap_or(defaults::DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        )
    }
}

/// Connection string and client options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoConfig {
    /// MongoDB connection string
    pub connection_string: String,
    /// Options applied on top of the connection string
    pub options: MongoClientOptions,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            connection_string: defaults::DEFAULT_CONNECTION_STRING.to_owned(),
            options: MongoClientOptions::default(),
        }
    }
}

impl MongoConfig {
    /// Load from `MONGODB_URI` and the `MONGODB_*` option variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvironment`] if an option variable is
    /// set to an unparsable value
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            connection_string: env::var(env_vars::MONGODB_URI)
                .unwrap_or_else(|_| defaults::DEFAULT_CONNECTION_STRING.to_owned()),
            options: MongoClientOptions::from_env()?,
        })
    }

    /// One-line description safe to log
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "MongoDB: {} (max pool: {}, app name: {}, TLS: {}, shutdown timeout: {}s)",
            redact_connection_string(&self.connection_string),
            self.options
                .max_pool_size
                .map_or_else(|| "default".to_owned(), |size| size.to_string()),
            self.options.app_name.as_deref().unwrap_or("default"),
            match self.options.tls {
                Some(true) => "forced on",
                Some(false) => "forced off",
                None => "from connection string",
            },
            self.options.shutdown_timeout().as_secs(),
        )
    }
}

/// Connection string with the password replaced by `***`
#[must_use]
pub fn redact_connection_string(connection_string: &str) -> String {
    let Some((scheme, rest)) = connection_string.split_once("://") else {
        return connection_string.to_owned();
    };
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return connection_string.to_owned();
    };
    let user = rest[..at].split(':').next().unwrap_or_default();
    format!("{scheme}://{user}:***@{}", &rest[at + 1..])
}
