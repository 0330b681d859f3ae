//! Unified error handling for `backend-client`.
//!
//! This module exposes a single top-level error type [`BackendError`] for the
//! whole library, with configuration problems grouped in [`ConfigError`].
//! Small helpers for reading/validating environment variables are provided and
//! return the unified [`Result<T>`] alias.
//!
//! All messages include the suffix `[Backend Client]` to simplify attribution in logs.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, BackendError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `backend-client` crate.
///
/// Every auxiliary operation (sign-in, upload, sync, feedback, profile)
/// reports through this type; [`BackendError::user_message`] turns it into
/// the text shown to the user.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[Backend Client] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[Backend Client] operation timed out after {0:?}")]
    Timeout(Duration),

    /// The backend refused the operation and said why.
    #[error("[Backend Client] HTTP {status}: {message}")]
    Rejected {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Backend-provided `message`/`error` detail.
        message: String,
    },

    /// Upstream returned a non-successful HTTP status without a usable detail.
    #[error("[Backend Client] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Optional short snippet of the response body (trimmed).
        snippet: String,
    },

    /// Response payload could not be decoded as expected.
    #[error("[Backend Client] decode error: {0}")]
    Decode(String),

    /// Local file could not be read (CSV upload).
    #[error("[Backend Client] io error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV file was rejected before upload.
    #[error("[Backend Client] invalid CSV file: {0}")]
    InvalidCsv(String),
}

impl BackendError {
    /// Maps a reqwest failure, surfacing timeouts as [`BackendError::Timeout`].
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            BackendError::Timeout(timeout)
        } else {
            BackendError::HttpTransport(err)
        }
    }

    /// Text to show the user: the backend's own detail when it sent one,
    /// else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            BackendError::Rejected { message, .. } if !message.trim().is_empty() => {
                message.clone()
            }
            BackendError::InvalidCsv(reason) => reason.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Keeps the first `max` chars of a response body for error messages.
pub(crate) fn make_snippet(body: &str, max: usize) -> String {
    body.trim().chars().take(max).collect()
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
///
/// Keep this focused: only errors that realistically happen at config
/// load/validation time.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[Backend Client] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like timeouts).
    #[error("[Backend Client] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `CHATBOT_TIMEOUT_SECS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u64`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[Backend Client] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `CHATBOT_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// Only one half of the sign-in credentials was provided.
    #[error("[Backend Client] CHATBOT_USERNAME and CHATBOT_PASSWORD must be set together")]
    PartialCredentials,
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Source of configuration values; `std::env::var` in production.
pub type VarLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Reads the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Fetches an optional variable (`None` if unset/empty).
pub fn env_opt(lookup: VarLookup<'_>, name: &'static str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

/// Fetches a required, non-empty variable.
///
/// # Errors
/// Returns [`BackendError::Config`] with [`ConfigError::MissingVar`] if the
/// variable is absent or empty.
pub fn must_env(lookup: VarLookup<'_>, name: &'static str) -> Result<String> {
    env_opt(lookup, name).ok_or_else(|| ConfigError::MissingVar(name).into())
}

/// Parses an optional `u64` (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`BackendError::Config`] with [`ConfigError::InvalidNumber`] if the
/// variable is set but not a positive `u64`.
pub fn env_opt_u64(lookup: VarLookup<'_>, name: &'static str) -> Result<Option<u64>> {
    match env_opt(lookup, name) {
        Some(v) => match v.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ConfigError::InvalidNumber {
                var: name,
                reason: "expected positive u64",
            }
            .into()),
        },
        None => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`BackendError::Config`] with [`ConfigError::InvalidFormat`] when
/// the string does not start with a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}
