// ABOUTME: Demo server configuration: listen port, execution lane count and content coder selection
// ABOUTME: Loaded from environment variables together with the nested MongoDB configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

use super::{env_flag, env_parse, MongoConfig};
use crate::errors::ConfigError;
use crate::lanes::available_parallelism;
use mongodb_axum_core::constants::{env_vars, ports};
use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Number of execution lanes requests are spread over
    pub lane_count: usize,
    /// Code `application/json` bodies as extended JSON
    pub extended_json: bool,
    /// MongoDB connection
    pub mongo: MongoConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: ports::DEFAULT_HTTP_PORT,
            lane_count: available_parallelism(),
            extended_json: false,
            mongo: MongoConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `HTTP_PORT`, `LANE_COUNT`, `EXTENDED_JSON` and the MongoDB variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvironment`] if a variable is set to an
    /// unparsable value
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            http_port: env_parse(env_vars::HTTP_PORT)?.unwrap_or(ports::DEFAULT_HTTP_PORT),
            lane_count: env_parse::<usize>(env_vars::LANE_COUNT)?
                .filter(|count| *count > 0)
                .unwrap_or_else(available_parallelism),
            extended_json: env_flag(env_vars::EXTENDED_JSON)?.unwrap_or(false),
            mongo: MongoConfig::from_env()?,
        })
    }

    /// Multi-line description safe to log
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Server Configuration:\n\
             - HTTP Port: {}\n\
             - Execution Lanes: {}\n\
             - Content Coding: {}\n\
             - {}",
            self.http_port,
            self.lane_count,
            if self.extended_json {
                "extended JSON"
            } else {
                "JSON"
            },
            self.mongo.summary(),
        )
    }
}
