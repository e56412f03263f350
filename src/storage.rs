// ABOUTME: Typed application-wide key/value storage with type-scoped keys
// ABOUTME: Holds long-lived resources such as the shared MongoDB client for the application lifetime
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

//! Application storage
//!
//! A [`Storage`] maps key *types* to values. A key is a (usually private,
//! zero-sized) type implementing [`StorageKey`]; its associated `Value` fixes
//! what may be stored under it. Because keys are identified by `TypeId`, two
//! modules can never collide by picking the same string.
//!
//! ```rust
//! use mongodb_axum::storage::{Storage, StorageKey};
//!
//! struct GreetingKey;
//!
//! impl StorageKey for GreetingKey {
//!     type Value = String;
//! }
//!
//! let storage = Storage::new();
//! storage.insert::<GreetingKey>("hello".to_owned());
//! assert_eq!(storage.get::<GreetingKey>().as_deref(), Some("hello"));
//! ```

use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::fmt;

/// A type usable as a key into [`Storage`]
pub trait StorageKey: 'static {
    /// Type of the value stored under this key
    type Value: Clone + Send + Sync + 'static;
}

/// Process-wide typed key/value store
///
/// Reads clone the stored value, so values should be cheap handles
/// (`Arc`-backed clients, configuration registries).
#[derive(Default)]
pub struct Storage {
    values: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Storage {
    /// Create an empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the value stored under `K`
    #[must_use]
    pub fn get<K: StorageKey>(&self) -> Option<K::Value> {
        self.values
            .get(&TypeId::of::<K>())
            .and_then(|entry| entry.value().downcast_ref::<K::Value>().cloned())
    }

    /// Store `value` under `K`, returning the value it replaced
    pub fn insert<K: StorageKey>(&self, value: K::Value) -> Option<K::Value> {
        self.values
            .insert(TypeId::of::<K>(), Box::new(value))
            .and_then(|previous| previous.downcast::<K::Value>().ok())
            .map(|previous| *previous)
    }

    /// Remove and return the value stored under `K`
    pub fn remove<K: StorageKey>(&self) -> Option<K::Value> {
        self.values
            .remove(&TypeId::of::<K>())
            .and_then(|(_, value)| value.downcast::<K::Value>().ok())
            .map(|value| *value)
    }

    /// Whether a value is stored under `K`
    #[must_use]
    pub fn contains<K: StorageKey>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<K>())
    }

    /// Read the value under `K`, storing `init()` first when absent
    pub fn get_or_insert_with<K: StorageKey>(&self, init: impl FnOnce() -> K::Value) -> K::Value {
        let entry = self
            .values
            .entry(TypeId::of::<K>())
            .or_insert_with(|| Box::new(init()));
        match entry.value().downcast_ref::<K::Value>() {
            Some(value) => value.clone(),
            // Only `insert::<K>` writes under `TypeId::of::<K>()`, always with `K::Value`
            None => unreachable!("storage entry holds a value of the wrong type"),
        }
    }

    /// Number of stored values
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("entries", &self.values.len())
            .finish()
    }
}
