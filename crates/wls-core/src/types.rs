//! Core type definitions with validation.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// A validated work-item key (e.g. `PRJ-1234`).
///
/// Keys must be non-empty strings. The remote service maps each key to an
/// internal numeric identifier; see [`IdentityMap`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssueKey(String);

impl IssueKey {
    /// Creates a new key after validation.
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ValidationError::Empty { field: "issue key" });
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IssueKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IssueKey> for String {
    fn from(key: IssueKey) -> Self {
        key.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for IssueKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One user-supplied record of time spent on a work item on a date.
///
/// Produced by the ledger loader, immutable thereafter, and consumed by the
/// reconciliation engine. Duration is strictly positive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub duration: Duration,
    pub issue_key: IssueKey,
    pub description: Option<String>,
}

/// A time record already stored by the remote tracking service.
///
/// A read-only snapshot: the engine only ever decides an action to apply
/// against it, never mutates it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteWorklog {
    /// Service-assigned opaque identifier.
    pub id: String,
    /// Numeric work-item identifier (remote-internal).
    pub issue_id: i64,
    /// Absolute start instant of the recorded work.
    pub start: DateTime<Utc>,
    pub duration_seconds: i64,
    pub description: Option<String>,
    pub author_id: String,
}

/// Bidirectional mapping between work-item keys and remote numeric ids,
/// resolved once per run for all distinct keys referenced by the ledger.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    by_key: HashMap<IssueKey, i64>,
    by_id: HashMap<i64, IssueKey>,
}

impl IdentityMap {
    /// Builds the mapping from resolved `(key, numeric id)` pairs.
    ///
    /// At most one numeric id is kept per key; later pairs win, though the
    /// resolver never returns duplicates in practice.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (IssueKey, i64)>) -> Self {
        let mut map = Self::default();
        for (key, id) in pairs {
            map.by_id.insert(id, key.clone());
            map.by_key.insert(key, id);
        }
        map
    }

    /// Returns the remote numeric id for a key, if it resolved.
    #[must_use]
    pub fn id_for(&self, key: &IssueKey) -> Option<i64> {
        self.by_key.get(key).copied()
    }

    /// Returns the key for a remote numeric id, if the ledger referenced it.
    #[must_use]
    pub fn key_for(&self, id: i64) -> Option<&IssueKey> {
        self.by_id.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
