// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single lazily computed value stamped with the revisions it was derived from.

/// A cached value together with the dependency key it was computed against.
///
/// The value is valid iff the recorded key equals the key the caller presents.
/// A cell starts out without a key and can be forced stale with [`Cached::invalidate`],
/// so the first read and any read after an invalidation always recompute.
///
/// The key is usually a revision counter or a tuple of them. Keys are compared with
/// `PartialEq`, so any key that can change when an input changes works.
#[derive(Clone, Debug)]
pub(crate) struct Cached<T, K> {
    value: Option<T>,
    stamp: Option<K>,
}

impl<T, K> Default for Cached<T, K> {
    fn default() -> Self {
        Self {
            value: None,
            stamp: None,
        }
    }
}

impl<T, K: PartialEq> Cached<T, K> {
    /// Returns `true` if the cached value was computed against `key`.
    pub(crate) fn is_valid(&self, key: &K) -> bool {
        self.value.is_some() && self.stamp.as_ref() == Some(key)
    }

    /// Returns the cached value if it is valid for `key`.
    pub(crate) fn get(&self, key: &K) -> Option<&T> {
        if self.stamp.as_ref() == Some(key) {
            self.value.as_ref()
        } else {
            None
        }
    }

    /// Stores `value` as computed against `key`.
    pub(crate) fn store(&mut self, key: K, value: T) -> &T {
        self.stamp = Some(key);
        self.value.insert(value)
    }

    /// Returns the value for `key`, computing and storing it with `compute` on a miss.
    ///
    /// The boolean is `true` when `compute` ran.
    pub(crate) fn ensure(&mut self, key: K, compute: impl FnOnce() -> T) -> (&T, bool) {
        let miss = !self.is_valid(&key);
        if miss {
            self.value = None;
            self.stamp = Some(key);
        }
        (self.value.get_or_insert_with(compute), miss)
    }

    /// Forgets the stamp so the next read recomputes.
    pub(crate) fn invalidate(&mut self) {
        self.stamp = None;
    }
}
