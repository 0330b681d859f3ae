//! Shared HTTP client for the chatbot backend.
//!
//! One `reqwest::Client` with a cookie store carries the sign-in session for
//! every call, the question stream included. Ordinary calls get a
//! per-request deadline; the question stream has none (it is bounded by the
//! idle timeout instead).

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::{
    config::client_config::ClientConfig,
    error_handler::{BackendError, Result, make_snippet},
};

/// Generic reply body used by most backend endpoints.
///
/// Success replies carry `success`/`message`; failures carry `message` or
/// `error`. All fields are optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BackendReply {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BackendReply {
    /// The human-readable detail, preferring `message` over `error`.
    pub fn detail(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|m| !m.trim().is_empty())
    }
}

/// Thin client for the chatbot backend.
///
/// Cheap to clone; clones share the connection pool and the session cookie.
#[derive(Clone)]
pub struct BackendClient {
    pub(crate) http: reqwest::Client,
    pub(crate) cfg: ClientConfig,
}

impl BackendClient {
    /// Creates a client from the given config.
    ///
    /// # Errors
    /// - [`BackendError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(cfg.request_timeout())
            .build()?;

        info!(base_url = %cfg.base_url, "backend client initialized");
        Ok(Self { http, cfg })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.cfg.base_url, path.trim_start_matches('/'))
    }

    /// Sends `req` under `timeout`, mapping transport failures.
    pub(crate) async fn send(&self, req: RequestBuilder, timeout: Duration) -> Result<Response> {
        req.timeout(timeout)
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(e, timeout))
    }

    /// Decodes a generic reply, turning non-2xx statuses into errors.
    ///
    /// A failing reply with a `message`/`error` detail becomes
    /// [`BackendError::Rejected`]; anything else [`BackendError::HttpStatus`].
    pub(crate) async fn reply(&self, resp: Response) -> Result<BackendReply> {
        self.decode::<BackendReply>(resp)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Decodes a JSON body of type `T`; `Ok(None)` for an empty 2xx body.
    pub(crate) async fn decode<T: DeserializeOwned>(&self, resp: Response) -> Result<Option<T>> {
        let status = resp.status();
        let url = resp.url().to_string();
        let body = resp.text().await.map_err(BackendError::HttpTransport)?;
        debug!(%status, %url, bytes = body.len(), "backend reply");

        if status.is_success() {
            if body.trim().is_empty() {
                return Ok(None);
            }
            return serde_json::from_str::<T>(&body)
                .map(Some)
                .map_err(|e| BackendError::Decode(format!("{e}; body: {}", make_snippet(&body, 240))));
        }

        let detail = serde_json::from_str::<BackendReply>(&body)
            .ok()
            .and_then(|r| r.detail().map(str::to_string));
        Err(match detail {
            Some(message) => BackendError::Rejected { status, message },
            None => BackendError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&body, 240),
            },
        })
    }
}
