// ABOUTME: Coding context: user-info key/value pairs visible to Serialize/Deserialize impls while coding
// ABOUTME: Scoped to the current thread for the duration of one encode or decode call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

use mongodb::bson::Bson;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::btree_map::{self, BTreeMap};

thread_local! {
    static CURRENT: RefCell<Option<CodingContext>> = const { RefCell::new(None) };
}

/// User-info entries made available to `Serialize` and `Deserialize`
/// implementations while a value is being encoded or decoded
///
/// Coders carry a baseline context; each call may pass its own, whose keys
/// take precedence over the baseline for that call only. Inside a
/// `Serialize`/`Deserialize` impl, read it with [`CodingContext::current`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodingContext {
    values: BTreeMap<String, Bson>,
}

impl CodingContext {
    /// Empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key`, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Bson>) -> Option<Bson> {
        self.values.insert(key.into(), value.into())
    }

    /// Value under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Bson> {
        self.values.get(key)
    }

    /// String value under `key`
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Bson::as_str)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> btree_map::Iter<'_, String, Bson> {
        self.values.iter()
    }

    /// This context with `overrides` applied on top
    ///
    /// Borrows `self` unchanged when there is nothing to override.
    #[must_use]
    pub fn merged<'a>(&'a self, overrides: &Self) -> Cow<'a, Self> {
        if overrides.is_empty() {
            return Cow::Borrowed(self);
        }
        let mut merged = self.clone();
        merged
            .values
            .extend(overrides.iter().map(|(key, value)| (key.clone(), value.clone())));
        Cow::Owned(merged)
    }

    /// Run `f` with this context installed as [`current`](Self::current)
    ///
    /// The previously installed context is restored afterwards, also when `f`
    /// unwinds.
    pub fn scope<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous = CURRENT.with(|current| current.replace(Some(self.clone())));
        let _restore = RestoreOnDrop { previous };
        f()
    }

    /// Context installed by the innermost enclosing [`scope`](Self::scope)
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.with(|current| current.borrow().clone())
    }
}

impl<K: Into<String>, V: Into<Bson>> FromIterator<(K, V)> for CodingContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

struct RestoreOnDrop {
    previous: Option<CodingContext>,
}

impl Drop for RestoreOnDrop {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_baseline() {
        let baseline = CodingContext::new().with("a", 1).with("b", "base");
        let overrides = CodingContext::new().with("b", "call");

        let merged = baseline.merged(&overrides);
        assert_eq!(merged.get("a"), Some(&Bson::Int32(1)));
        assert_eq!(merged.get_str("b"), Some("call"));
        assert_eq!(baseline.get_str("b"), Some("base"));
    }

    #[test]
    fn test_empty_overrides_borrow_baseline() {
        let baseline = CodingContext::new().with("a", true);
        assert!(matches!(baseline.merged(&CodingContext::new()), Cow::Borrowed(_)));
    }

    #[test]
    fn test_scope_nests_and_restores() {
        let outer = CodingContext::new().with("level", "outer");
        let inner = CodingContext::new().with("level", "inner");

        assert_eq!(CodingContext::current(), None);
        outer.scope(|| {
            inner.scope(|| {
                let current = CodingContext::current().unwrap();
                assert_eq!(current.get_str("level"), Some("inner"));
            });
            let current = CodingContext::current().unwrap();
            assert_eq!(current.get_str("level"), Some("outer"));
        });
        assert_eq!(CodingContext::current(), None);
    }
}
