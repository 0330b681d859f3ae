use std::{fmt, time::Duration};

/// Sign-in credentials for the chatbot backend.
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings for the chatbot backend.
///
/// # Fields
///
/// - `base_url`: Backend root (e.g. `http://localhost:9992`), no trailing slash.
/// - `request_timeout_secs`: Deadline for ordinary request/response calls.
/// - `sync_timeout_secs`: Deadline for vector-store sync, which runs for minutes.
/// - `stream_idle_secs`: Longest silence tolerated on an open question stream.
/// - `credentials`: Optional credentials for automatic sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend root URL.
    pub base_url: String,

    /// Per-request timeout (in seconds).
    pub request_timeout_secs: u64,

    /// Vector-store sync timeout (in seconds).
    pub sync_timeout_secs: u64,

    /// Question stream idle timeout (in seconds).
    pub stream_idle_secs: u64,

    /// Optional sign-in credentials.
    pub credentials: Option<Credentials>,
}

impl ClientConfig {
    /// Defaults for a given backend URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout_secs: 30,
            sync_timeout_secs: 300,
            stream_idle_secs: 600,
            credentials: None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    pub fn stream_idle(&self) -> Duration {
        Duration::from_secs(self.stream_idle_secs)
    }
}
