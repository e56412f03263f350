// ABOUTME: Lane-bound client, database and collection handles for request handlers
// ABOUTME: Every operation runs on the bound lane and fails with Closed once the shared client is closed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

//! # Lane-Bound Handles
//!
//! A [`BoundClient`] pairs the application's [`SharedClient`] with an
//! [`ExecutionLane`]. Its operations, and those of the [`BoundDatabase`] and
//! [`BoundCollection`] handles derived from it, are spawned onto that lane, so
//! their results are delivered on the lane the request runs on. Derived
//! handles are new values on every call; they hold no state beyond the
//! binding and the driver handle.

use super::client::SharedClient;
use crate::errors::{ClientError, ClientResult};
use crate::lanes::ExecutionLane;
use futures_util::TryStreamExt;
use mongodb::bson::{Bson, Document};
use mongodb::results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};
use mongodb::{Client, Collection, Database};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    shared: SharedClient,
    lane: ExecutionLane,
}

impl Binding {
    /// Run a driver operation on the bound lane
    async fn run<F, T>(&self, operation: F) -> ClientResult<T>
    where
        F: Future<Output = mongodb::error::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let shared = self.shared.clone();
        self.lane
            .spawn(async move {
                if shared.is_closed() {
                    return Err(ClientError::Closed);
                }
                Ok(operation.await?)
            })
            .await?
    }
}

/// The application's client bound to one execution lane
///
/// Two bound clients are equal when they wrap the same shared client and the
/// same lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundClient {
    binding: Binding,
}

impl BoundClient {
    pub(crate) const fn new(shared: SharedClient, lane: ExecutionLane) -> Self {
        Self {
            binding: Binding { shared, lane },
        }
    }

    /// Lane this client delivers results on
    #[must_use]
    pub const fn lane(&self) -> &ExecutionLane {
        &self.binding.lane
    }

    /// The shared client behind this binding
    #[must_use]
    pub const fn shared(&self) -> &SharedClient {
        &self.binding.shared
    }

    /// Whether the shared client has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.binding.shared.is_closed()
    }

    /// Run arbitrary driver work on the bound lane
    ///
    /// `operation` receives the driver client and is started on the lane, so
    /// the whole future, not only its result, runs there.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a
    /// lane error if the lane is shut down or the operation panics
    pub async fn execute<F, Fut, T>(&self, operation: F) -> ClientResult<T>
    where
        F: FnOnce(Client) -> Fut + Send + 'static,
        Fut: Future<Output = mongodb::error::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let client = self.binding.shared.inner().clone();
        self.binding.run(async move { operation(client).await }).await
    }

    /// Names of all databases on the deployment
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn list_database_names(&self) -> ClientResult<Vec<String>> {
        let client = self.binding.shared.inner().clone();
        self.binding
            .run(async move { client.list_database_names().await })
            .await
    }

    /// Database `name`, bound to the same lane
    #[must_use]
    pub fn database(&self, name: &str) -> BoundDatabase {
        BoundDatabase {
            binding: self.binding.clone(),
            database: self.binding.shared.inner().database(name),
        }
    }

    /// Default database from the connection string, if it names one
    #[must_use]
    pub fn default_database(&self) -> Option<BoundDatabase> {
        self.binding
            .shared
            .inner()
            .default_database()
            .map(|database| BoundDatabase {
                binding: self.binding.clone(),
                database,
            })
    }
}

/// A database whose operations complete on the bound lane
#[derive(Debug, Clone)]
pub struct BoundDatabase {
    binding: Binding,
    database: Database,
}

impl BoundDatabase {
    /// Database name
    #[must_use]
    pub fn name(&self) -> &str {
        self.database.name()
    }

    /// Lane this database delivers results on
    #[must_use]
    pub const fn lane(&self) -> &ExecutionLane {
        &self.binding.lane
    }

    /// The driver database handle
    #[must_use]
    pub const fn inner(&self) -> &Database {
        &self.database
    }

    /// Names of the collections in this database
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn list_collection_names(&self) -> ClientResult<Vec<String>> {
        let database = self.database.clone();
        self.binding
            .run(async move { database.list_collection_names().await })
            .await
    }

    /// Run a database command
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn run_command(&self, command: Document) -> ClientResult<Document> {
        let database = self.database.clone();
        self.binding
            .run(async move { database.run_command(command).await })
            .await
    }

    /// Collection `name` with documents of type `T`, bound to the same lane
    #[must_use]
    pub fn collection<T: Send + Sync>(&self, name: &str) -> BoundCollection<T> {
        BoundCollection {
            binding: self.binding.clone(),
            collection: self.database.collection(name),
        }
    }
}

/// A collection whose operations complete on the bound lane
#[derive(Debug, Clone)]
pub struct BoundCollection<T: Send + Sync> {
    binding: Binding,
    collection: Collection<T>,
}

impl<T: Send + Sync> BoundCollection<T> {
    /// Collection name
    #[must_use]
    pub fn name(&self) -> &str {
        self.collection.name()
    }

    /// Lane this collection delivers results on
    #[must_use]
    pub const fn lane(&self) -> &ExecutionLane {
        &self.binding.lane
    }

    /// The driver collection handle
    #[must_use]
    pub const fn inner(&self) -> &Collection<T> {
        &self.collection
    }

    /// Count documents matching `filter`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn count_documents(&self, filter: Document) -> ClientResult<u64>
    where
        T: 'static,
    {
        let collection = self.collection.clone();
        self.binding
            .run(async move { collection.count_documents(filter).await })
            .await
    }

    /// Update the first document matching `filter`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn update_one(&self, filter: Document, update: Document) -> ClientResult<UpdateResult>
    where
        T: 'static,
    {
        let collection = self.collection.clone();
        self.binding
            .run(async move { collection.update_one(filter, update).await })
            .await
    }

    /// Delete the first document matching `filter`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn delete_one(&self, filter: Document) -> ClientResult<DeleteResult>
    where
        T: 'static,
    {
        let collection = self.collection.clone();
        self.binding
            .run(async move { collection.delete_one(filter).await })
            .await
    }

    /// Delete every document matching `filter`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn delete_many(&self, filter: Document) -> ClientResult<DeleteResult>
    where
        T: 'static,
    {
        let collection = self.collection.clone();
        self.binding
            .run(async move { collection.delete_many(filter).await })
            .await
    }
}

impl<T> BoundCollection<T>
where
    T: Serialize + Send + Sync + 'static,
{
    /// Insert one document
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn insert_one(&self, document: T) -> ClientResult<InsertOneResult> {
        let collection = self.collection.clone();
        self.binding
            .run(async move { collection.insert_one(document).await })
            .await
    }

    /// Insert several documents
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn insert_many(&self, documents: Vec<T>) -> ClientResult<InsertManyResult> {
        let collection = self.collection.clone();
        self.binding
            .run(async move { collection.insert_many(documents).await })
            .await
    }

    /// Insert one document and return its `_id`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn insert_one_returning_id(&self, document: T) -> ClientResult<Bson> {
        Ok(self.insert_one(document).await?.inserted_id)
    }
}

impl<T> BoundCollection<T>
where
    T: DeserializeOwned + Unpin + Send + Sync + 'static,
{
    /// First document matching `filter`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn find_one(&self, filter: Document) -> ClientResult<Option<T>> {
        let collection = self.collection.clone();
        self.binding
            .run(async move { collection.find_one(filter).await })
            .await
    }

    /// All documents matching `filter`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after close, the driver's error, or a lane error
    pub async fn find(&self, filter: Document) -> ClientResult<Vec<T>> {
        let collection = self.collection.clone();
        self.binding
            .run(async move { collection.find(filter).await?.try_collect::<Vec<T>>().await })
            .await
    }
}
