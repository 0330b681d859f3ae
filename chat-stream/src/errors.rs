//! Unified error types for the crate.
//!
//! All messages include the suffix `[Chat Stream]` to simplify attribution in logs.

use std::time::Duration;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ChatStreamError>;

/// Top-level error for submission and classification.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ChatStreamError {
    /// The question was blank after directive stripping.
    #[error("[Chat Stream] question must not be empty")]
    EmptyQuestion,

    /// A follow-up referenced an entry that is not in the store.
    #[error("[Chat Stream] no entry at index {0}")]
    UnknownEntry(usize),

    /// A stream unit could not be classified.
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// The question stream failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A unit after `<STREAMOFF>` that is not a usable terminal payload.
///
/// The offending unit is dropped; the entry keeps its state.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The unit is valid text but not a JSON object.
    #[error("[Chat Stream] terminal payload is not a JSON object: {snippet}")]
    NotAnObject {
        /// Leading characters of the unit.
        snippet: String,
    },

    /// The unit is not valid JSON.
    #[error("[Chat Stream] failed to decode terminal payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the server-push question stream.
///
/// Kept string-typed so any transport (HTTP, in-memory, test) can report into it.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TransportError {
    /// The stream could not be opened.
    #[error("[Chat Stream] failed to open question stream: {0}")]
    Open(String),

    /// The stream broke after it was opened.
    #[error("[Chat Stream] question stream interrupted: {0}")]
    Interrupted(String),

    /// No unit arrived within the configured idle window.
    #[error("[Chat Stream] question stream idle for {0:?}")]
    Idle(Duration),

    /// The stream ended before a terminal payload was applied.
    #[error("[Chat Stream] question stream closed before the answer was complete")]
    ClosedEarly,
}
