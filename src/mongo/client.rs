// ABOUTME: Application-wide MongoDB client shared by every request
// ABOUTME: Tracks whether cleanup closed it so later operations fail instead of reconnecting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

use super::bound::BoundClient;
use crate::errors::{ClientError, ClientResult, CloseError};
use crate::lanes::ExecutionLane;
use mongodb::bson::{doc, Document};
use mongodb::Client;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

struct ClientState {
    closed: AtomicBool,
    shutdown_timeout: Duration,
}

/// The application's MongoDB client
///
/// Clones share the underlying connection pool and its closed state. Two
/// handles are equal when they come from the same `configure` call.
#[derive(Clone)]
pub struct SharedClient {
    client: Client,
    state: Arc<ClientState>,
}

impl SharedClient {
    pub(crate) fn new(client: Client, shutdown_timeout: Duration) -> Self {
        Self {
            client,
            state: Arc::new(ClientState {
                closed: AtomicBool::new(false),
                shutdown_timeout,
            }),
        }
    }

    /// The driver client
    ///
    /// Operations issued directly on it bypass the closed check.
    #[must_use]
    pub const fn inner(&self) -> &Client {
        &self.client
    }

    /// Whether the client has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    /// Driver client, or [`ClientError::Closed`] after close
    pub(crate) fn checked(&self) -> ClientResult<Client> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        Ok(self.client.clone())
    }

    /// Handle to this client whose operations complete on `lane`
    #[must_use]
    pub fn bound(&self, lane: &ExecutionLane) -> BoundClient {
        BoundClient::new(self.clone(), lane.clone())
    }

    /// Names of all databases on the deployment
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, or the driver's error
    pub async fn list_database_names(&self) -> ClientResult<Vec<String>> {
        let client = self.checked()?;
        Ok(client.list_database_names().await?)
    }

    /// Round-trip a `ping` command to the deployment
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, or the driver's error
    pub async fn ping(&self) -> ClientResult<Document> {
        let client = self.checked()?;
        Ok(client.database("admin").run_command(doc! { "ping": 1 }).await?)
    }

    /// Close the client and release its connections
    ///
    /// Every clone and every bound handle observes the close. Closing an
    /// already closed client is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CloseError::TimedOut`] if the driver does not finish closing
    /// within the configured shutdown timeout; the client stays closed
    pub async fn close(&self) -> Result<(), CloseError> {
        if self.state.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let client = self.client.clone();
        timeout(self.state.shutdown_timeout, async move {
            client.shutdown().await;
        })
        .await
        .map_err(|_| CloseError::TimedOut(self.state.shutdown_timeout))
    }
}

impl PartialEq for SharedClient {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for SharedClient {}

impl fmt::Debug for SharedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedClient")
            .field("closed", &self.is_closed())
            .field("shutdown_timeout", &self.state.shutdown_timeout)
            .finish_non_exhaustive()
    }
}
