#![forbid(unsafe_code)]

//! Error taxonomy for tab store operations.
//!
//! Every variant here is a programming or invariant error: callers are
//! expected to surface it (error boundary, toast, log) rather than retry.
//! Conditions that are explicitly harmless (closing a tab that is not open,
//! updating when nothing is active) never produce an error.

use thiserror::Error;

use crate::key::TabKey;

pub type Result<T> = std::result::Result<T, TabError>;

#[derive(Debug, Error)]
pub enum TabError {
    /// The operation requires an existing tab but `key` is not open.
    #[error("no open tab with key {key}")]
    InvalidKey { key: TabKey },

    /// An internal lookup failed where the invariants guarantee success.
    #[error("tab not found: {key}")]
    NotFound { key: TabKey },

    /// A rename targeted a key that already belongs to a different tab.
    #[error("cannot rename tab {from} to {to}: key already open")]
    KeyConflict { from: TabKey, to: TabKey },

    /// The dispatch queue reached its configured depth.
    #[error("dispatch queue overflow ({depth} pending intents)")]
    QueueOverflow { depth: usize },

    /// A snapshot handed to `restore` violates the state invariants.
    #[error("corrupt tab snapshot: {reason}")]
    CorruptSnapshot { reason: String },

    #[cfg(feature = "state-persistence")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TabError {
    #[must_use]
    pub fn invalid_key(key: impl Into<TabKey>) -> Self {
        Self::InvalidKey { key: key.into() }
    }

    #[must_use]
    pub fn not_found(key: impl Into<TabKey>) -> Self {
        Self::NotFound { key: key.into() }
    }

    #[must_use]
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptSnapshot {
            reason: reason.into(),
        }
    }

    /// Short machine-readable name, used as a structured log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidKey { .. } => "invalid_key",
            Self::NotFound { .. } => "not_found",
            Self::KeyConflict { .. } => "key_conflict",
            Self::QueueOverflow { .. } => "queue_overflow",
            Self::CorruptSnapshot { .. } => "corrupt_snapshot",
            #[cfg(feature = "state-persistence")]
            Self::Json(_) => "json",
        }
    }
}
