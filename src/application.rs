// ABOUTME: The application container shared by startup code, middleware and handlers
// ABOUTME: Owns the typed storage, the execution lanes and the content coder registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

use crate::content::ContentConfiguration;
use crate::lanes::LaneGroup;
use crate::mongo::MongoDb;
use crate::storage::{Storage, StorageKey};
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::{error, info};

struct ContentConfigurationKey;

impl StorageKey for ContentConfigurationKey {
    type Value = ContentConfiguration;
}

struct ApplicationInner {
    storage: Storage,
    lanes: LaneGroup,
}

/// Application-wide state, passed explicitly wherever it is needed
///
/// Cheap to clone; clones share storage and lanes. Use it as the axum router
/// state so extractors and middleware can reach it.
#[derive(Clone)]
pub struct Application {
    inner: Arc<ApplicationInner>,
}

impl Application {
    /// Application running requests on `lanes`
    #[must_use]
    pub fn new(lanes: LaneGroup) -> Self {
        Self {
            inner: Arc::new(ApplicationInner {
                storage: Storage::new(),
                lanes,
            }),
        }
    }

    /// Application with `count` freshly started lanes
    ///
    /// # Errors
    ///
    /// Returns an error if the lanes cannot be started
    pub fn with_lane_count(count: usize) -> io::Result<Self> {
        Ok(Self::new(LaneGroup::new(count)?))
    }

    /// Application-wide typed storage
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    /// The execution lanes requests are pinned to
    #[must_use]
    pub fn lanes(&self) -> &LaneGroup {
        &self.inner.lanes
    }

    /// The MongoDB client registry
    #[must_use]
    pub const fn mongodb(&self) -> MongoDb<'_> {
        MongoDb::new(self)
    }

    /// The content coder registry, created with JSON defaults on first use
    #[must_use]
    pub fn content(&self) -> ContentConfiguration {
        self.storage()
            .get_or_insert_with::<ContentConfigurationKey>(ContentConfiguration::new)
    }

    /// Stop the execution lanes
    ///
    /// Run [`MongoDb::cleanup`] first so the client closes while lanes can
    /// still finish in-flight operations.
    pub async fn shutdown(&self) {
        let lanes = self.lanes().clone();
        match tokio::task::spawn_blocking(move || lanes.shutdown()).await {
            Ok(()) => info!("application shut down"),
            Err(e) => error!("Failed to shut down execution lanes: {e}"),
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("storage", &self.inner.storage)
            .field("lanes", &self.inner.lanes)
            .finish()
    }
}
