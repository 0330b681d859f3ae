//! Backend feature flags (`GET /api/config`).

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::{client::BackendClient, error_handler::Result};

/// Read-only feature configuration exposed by the backend.
///
/// Unknown keys are kept; a missing flag reads as disabled.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl AppConfig {
    /// `true` only for a JSON `true` (or the strings `"true"`/`"1"`).
    pub fn flag(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            _ => false,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn feedback_enabled(&self) -> bool {
        self.flag("feedbackEnabled")
    }

    pub fn unstructured_mode(&self) -> bool {
        self.flag("unstructuredMode")
    }

    pub fn vector_sync_enabled(&self) -> bool {
        self.flag("hasAISDKCredentials")
    }

    pub fn data_catalog_url(&self) -> Option<&str> {
        self.get_str("dataCatalogUrl")
    }

    /// All keys the backend sent.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl BackendClient {
    /// Fetches the feature configuration; an empty reply is an empty config.
    ///
    /// # Errors
    /// Transport failures, non-2xx statuses and non-object replies.
    #[instrument(skip_all)]
    pub async fn fetch_config(&self) -> Result<AppConfig> {
        let req = self.http.get(self.url("/api/config"));
        let resp = self.send(req, self.cfg.request_timeout()).await?;
        let cfg = self.decode::<AppConfig>(resp).await?.unwrap_or_default();
        debug!(keys = cfg.values.len(), "backend config loaded");
        Ok(cfg)
    }
}
