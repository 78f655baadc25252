//! Account identity types shared between the flow and the reconciliation port.

use serde::{Deserialize, Serialize};

/// Opaque reference to a remote account record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountRef(pub String);

impl AccountRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one account reconciliation attempt.
///
/// Transient by contract: consumed once per lookup, never persisted.
/// `LookupFailed` carries a human-readable reason for logging only; the flow
/// treats it exactly like `NotFound` (fail-open).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountLookup {
    Found(AccountRef),
    NotFound,
    LookupFailed(String),
}
