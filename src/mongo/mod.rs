// ABOUTME: Application-scoped MongoDB client registry: configure once, read anywhere, clean up at shutdown
// ABOUTME: Also exposes the lane-bound handles and the per-request extractor built on top of it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

//! # MongoDB Registry
//!
//! The application holds at most one [`SharedClient`] in its storage.
//! [`MongoDb::configure`] creates and stores it at startup, [`MongoDb::client`]
//! reads it (panicking if startup never configured it), [`MongoDb::bind`]
//! pins it to an execution lane for a request, and [`MongoDb::cleanup`]
//! removes and closes it at shutdown.
//!
//! ```rust,no_run
//! use mongodb_axum::Application;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let application = Application::with_lane_count(4)?;
//! application.mongodb().configure("mongodb://localhost:27017", None).await?;
//!
//! let names = application.mongodb().client().list_database_names().await?;
//! println!("{names:?}");
//!
//! application.mongodb().cleanup().await;
//! application.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod bound;
mod client;
mod request;

pub use bound::{BoundClient, BoundCollection, BoundDatabase};
pub use client::SharedClient;
pub use request::MongoDbRequest;

use crate::application::Application;
use crate::config::mongo::{redact_connection_string, MongoClientOptions, MongoConfig};
use crate::errors::ConfigError;
use crate::lanes::ExecutionLane;
use crate::storage::StorageKey;
use mongodb::options::{ClientOptions, DriverInfo};
use mongodb::Client;
use mongodb_axum_core::constants::library;
use std::time::Duration;
use tracing::{debug, error, info, warn};

struct MongoClientKey;

impl StorageKey for MongoClientKey {
    type Value = SharedClient;
}

/// The application's MongoDB registry
///
/// Obtained from [`Application::mongodb`]; it borrows the application and
/// holds no state of its own.
#[derive(Debug, Clone, Copy)]
pub struct MongoDb<'a> {
    application: &'a Application,
}

impl<'a> MongoDb<'a> {
    pub(crate) const fn new(application: &'a Application) -> Self {
        Self { application }
    }

    /// Create the application's client from a connection string
    ///
    /// `options` are applied on top of what the connection string specifies.
    /// A previously configured client is replaced without being closed; call
    /// [`cleanup`](Self::cleanup) first to release it. Must run inside a Tokio
    /// runtime, which then hosts the driver's background monitoring.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConnectionTarget`] if the connection
    /// string is malformed, or [`ConfigError::InvalidOptions`] if the driver
    /// rejects the resulting options. Nothing is stored on error.
    pub async fn configure(
        &self,
        connection_string: &str,
        options: Option<MongoClientOptions>,
    ) -> Result<(), ConfigError> {
        let mut client_options = ClientOptions::parse(connection_string)
            .await
            .map_err(|source| ConfigError::InvalidConnectionTarget {
                target: redact_connection_string(connection_string),
                source,
            })?;

        let options = options.unwrap_or_default();
        options.apply_to(&mut client_options);
        self.install(client_options, options.shutdown_timeout())
    }

    /// Create the application's client from loaded configuration
    ///
    /// # Errors
    ///
    /// Same as [`configure`](Self::configure)
    pub async fn configure_from(&self, config: &MongoConfig) -> Result<(), ConfigError> {
        self.configure(&config.connection_string, Some(config.options.clone()))
            .await
    }

    /// Create the application's client from fully built driver options
    ///
    /// Library metadata is still attached. Must be called from inside a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOptions`] if the driver rejects `client_options`
    pub fn configure_with(&self, client_options: ClientOptions) -> Result<(), ConfigError> {
        self.install(client_options, MongoClientOptions::default().shutdown_timeout())
    }

    fn install(
        &self,
        mut client_options: ClientOptions,
        shutdown_timeout: Duration,
    ) -> Result<(), ConfigError> {
        client_options.driver_info = Some(driver_info(client_options.driver_info.take()));
        let hosts = client_options.hosts.len();
        let client = Client::with_options(client_options).map_err(ConfigError::InvalidOptions)?;

        let shared = SharedClient::new(client, shutdown_timeout);
        if self
            .application
            .storage()
            .insert::<MongoClientKey>(shared)
            .is_some()
        {
            warn!("replaced the configured MongoDB client without closing it; call cleanup() first to release its connections");
        }
        info!(hosts, ?shutdown_timeout, "MongoDB client configured");
        Ok(())
    }

    /// The application's client
    ///
    /// # Panics
    ///
    /// Panics if [`configure`](Self::configure) has not succeeded. Configure
    /// the client at startup before serving requests.
    #[must_use]
    #[allow(clippy::panic)] // Using the client before startup configured it is a programming error
    pub fn client(&self) -> SharedClient {
        self.try_client().unwrap_or_else(|| {
            panic!("MongoDB client accessed before `Application::mongodb().configure()` was called")
        })
    }

    /// The application's client, or `None` when unconfigured
    #[must_use]
    pub fn try_client(&self) -> Option<SharedClient> {
        self.application.storage().get::<MongoClientKey>()
    }

    /// Whether a client is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.application.storage().contains::<MongoClientKey>()
    }

    /// The application's client bound to `lane`
    ///
    /// # Panics
    ///
    /// Panics if [`configure`](Self::configure) has not succeeded
    #[must_use]
    pub fn bind(&self, lane: &ExecutionLane) -> BoundClient {
        let bound = self.client().bound(lane);
        debug!(lane = %lane.id(), "bound MongoDB client to execution lane");
        bound
    }

    /// Remove and close the application's client
    ///
    /// Handles obtained earlier fail with `ClientError::Closed` afterwards. A
    /// close that does not finish in time is logged, not returned. Does
    /// nothing when no client is configured.
    pub async fn cleanup(&self) {
        let Some(client) = self.application.storage().remove::<MongoClientKey>() else {
            debug!("no MongoDB client configured; nothing to clean up");
            return;
        };
        match client.close().await {
            Ok(()) => info!("MongoDB client closed"),
            Err(e) => error!("Failed to shut down MongoDB client: {e}"),
        }
    }
}

/// Library metadata sent to the server in the connection handshake
///
/// Metadata supplied by the caller is kept, with this library appended.
fn driver_info(existing: Option<DriverInfo>) -> DriverInfo {
    let version = env!("CARGO_PKG_VERSION");
    match existing {
        None => DriverInfo::builder()
            .name(library::NAME)
            .version(version.to_owned())
            .build(),
        Some(existing) => DriverInfo::builder()
            .name(format!("{}|{}", existing.name, library::NAME))
            .version(format!(
                "{}|{version}",
                existing.version.unwrap_or_default()
            ))
            .build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_info_names_library() {
        let info = driver_info(None);
        assert_eq!(info.name, library::NAME);
        assert_eq!(info.version.as_deref(), Some(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_driver_info_appends_to_existing_metadata() {
        let existing = DriverInfo::builder()
            .name("my-service")
            .version("2.0".to_owned())
            .build();
        let info = driver_info(Some(existing));
        assert_eq!(info.name, format!("my-service|{}", library::NAME));
        assert_eq!(
            info.version,
            Some(format!("2.0|{}", env!("CARGO_PKG_VERSION")))
        );
    }
}
