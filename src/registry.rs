//! Saved search results, addressed by small integer handles.
//!
//! Every search or sort stores its result set here under a fresh [`Handle`]. Handles are handed
//! out from a counter that starts at 1 and only ever grows, so a handle is never reused within a
//! session, even after the entry it named has been deleted. Entries are immutable: consumers
//! either read a set or delete it, and a new query always produces a new handle.

use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::Seq;

/// An ordered set of message sequence numbers, as returned by the server.
pub type ResultSet = Vec<Seq>;

/// Opaque identifier of a saved result set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32);

impl Handle {
    /// The raw number shown to the user.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for Handle {
    fn from(n: u32) -> Self {
        Handle(n)
    }
}

impl FromStr for Handle {
    type Err = ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(Handle)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The handle table.
#[derive(Debug)]
pub struct SearchRegistry {
    next: u32,
    // handles grow monotonically, so key order is insertion order
    entries: BTreeMap<Handle, ResultSet>,
}

impl Default for SearchRegistry {
    fn default() -> Self {
        SearchRegistry {
            next: 1,
            entries: BTreeMap::new(),
        }
    }
}

impl SearchRegistry {
    /// Creates an empty registry whose first handle will be 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `result` under a fresh handle.
    pub fn add(&mut self, result: ResultSet) -> Handle {
        let handle = Handle(self.next);
        self.next += 1;
        self.entries.insert(handle, result);
        handle
    }

    /// Borrows the result set saved under `handle`.
    pub fn get(&self, handle: Handle) -> Result<&[Seq]> {
        self.entries
            .get(&handle)
            .map(Vec::as_slice)
            .ok_or(Error::NotFound(handle))
    }

    pub fn exists(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Removes the entry for `handle`.
    ///
    /// Deleting an absent handle is an error and leaves the registry untouched.
    pub fn delete(&mut self, handle: Handle) -> Result<ResultSet> {
        self.entries.remove(&handle).ok_or(Error::NotFound(handle))
    }

    /// Summarizes every saved set as `(handle, size)`, oldest first.
    pub fn list(&self) -> Vec<(Handle, usize)> {
        self.entries.iter().map(|(h, set)| (*h, set.len())).collect()
    }

    /// The full contents of one saved set, for direct display.
    pub fn describe(&self, handle: Handle) -> Result<&[Seq]> {
        self.get(handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
