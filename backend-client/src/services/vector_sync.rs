//! Vector-store resynchronisation (`POST /sync_vdbs`).

use serde::Serialize;
use tracing::{info, instrument};

use crate::{client::BackendClient, error_handler::Result};

/// Body of a sync request.
///
/// An empty `vdbs` list asks the backend to sync every database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncRequest {
    pub vdbs: Vec<String>,
    pub overwrite: bool,
    pub examples_per_table: u32,
    pub parallel: bool,
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self {
            vdbs: Vec::new(),
            overwrite: true,
            examples_per_table: 3,
            parallel: true,
        }
    }
}

impl SyncRequest {
    /// Sync of the given databases with default settings.
    pub fn for_vdbs<I, S>(vdbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vdbs: vdbs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl BackendClient {
    /// Runs a sync and returns the backend's success message.
    ///
    /// Uses the long sync timeout; a sync commonly takes minutes.
    ///
    /// # Errors
    /// [`crate::BackendError::Timeout`] past the sync timeout, and any
    /// backend rejection (missing credentials, failed sync).
    #[instrument(skip_all, fields(vdbs = ?req.vdbs, parallel = req.parallel))]
    pub async fn sync_vector_stores(&self, req: &SyncRequest) -> Result<String> {
        let timeout = self.cfg.sync_timeout();
        let http = self.http.post(self.url("/sync_vdbs")).json(req);
        let resp = self.send(http, timeout).await?;
        let reply = self.reply(resp).await?;
        let message = reply
            .detail()
            .unwrap_or("VectorDB synchronization successful")
            .to_string();
        info!(%message, "vector stores synced");
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    use super::*;
    use crate::{
        config::client_config::ClientConfig, error_handler::BackendError,
        services::test_support::client,
    };

    #[tokio::test]
    async fn posts_defaults_and_returns_message() {
        let (server, client) = client().await;
        Mock::given(method("POST"))
            .and(path("/sync_vdbs"))
            .and(body_json(serde_json::json!({
                "vdbs": ["samples_bank"],
                "overwrite": true,
                "examples_per_table": 3,
                "parallel": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "VectorDB synchronization successful for VDBs: samples_bank"
            })))
            .mount(&server)
            .await;

        let msg = client
            .sync_vector_stores(&SyncRequest::for_vdbs(["samples_bank"]))
            .await
            .unwrap();
        assert_eq!(msg, "VectorDB synchronization successful for VDBs: samples_bank");
    }

    #[tokio::test]
    async fn missing_credentials_message_is_surfaced() {
        let (server, client) = client().await;
        Mock::given(method("POST"))
            .and(path("/sync_vdbs"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "success": false,
                "message": "No AI SDK credentials provided"
            })))
            .mount(&server)
            .await;

        let err = client
            .sync_vector_stores(&SyncRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.user_message("sync failed"), "No AI SDK credentials provided");
    }

    #[tokio::test]
    async fn slow_sync_times_out() {
        let server = MockServer::start().await;
        let mut cfg = ClientConfig::new(server.uri());
        cfg.sync_timeout_secs = 1;
        let client = BackendClient::new(cfg).unwrap();
        Mock::given(method("POST"))
            .and(path("/sync_vdbs"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let err = client
            .sync_vector_stores(&SyncRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout(d) if d == Duration::from_secs(1)));
    }
}
