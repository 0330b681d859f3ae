//! Session calls: sign-in, logout and server-side history reset.

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    client::BackendClient,
    config::client_config::Credentials,
    error_handler::{BackendError, Result},
};

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

impl BackendClient {
    /// Signs in; the session cookie is kept for later calls.
    ///
    /// Returns `Ok(false)` when the backend rejects the credentials.
    ///
    /// # Errors
    /// Transport failures and unexpected statuses.
    #[instrument(skip_all, fields(username = %creds.username))]
    pub async fn sign_in(&self, creds: &Credentials) -> Result<bool> {
        let body = LoginRequest {
            username: &creds.username,
            password: &creds.password,
        };
        let req = self.http.post(self.url("/login")).json(&body);
        let resp = self.send(req, self.cfg.request_timeout()).await?;

        match self.reply(resp).await {
            Ok(reply) => {
                let ok = reply.success.unwrap_or(true);
                info!(ok, "sign-in completed");
                Ok(ok)
            }
            Err(BackendError::Rejected { status, message }) if status == StatusCode::UNAUTHORIZED => {
                warn!(%message, "sign-in rejected");
                Ok(false)
            }
            Err(BackendError::HttpStatus { status, .. }) if status == StatusCode::UNAUTHORIZED => {
                warn!("sign-in rejected");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Ends the session. Idempotent: an already-expired session counts as done.
    ///
    /// # Errors
    /// Transport failures and unexpected statuses.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<()> {
        let req = self.http.post(self.url("/logout"));
        let resp = self.send(req, self.cfg.request_timeout()).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            info!("logout: no active session");
            return Ok(());
        }
        self.reply(resp).await?;
        info!("logged out");
        Ok(())
    }

    /// Clears the backend's conversation memory.
    ///
    /// The local result store is not touched; callers clear it themselves.
    ///
    /// # Errors
    /// Transport failures and unexpected statuses.
    #[instrument(skip_all)]
    pub async fn clear_history(&self) -> Result<String> {
        let req = self.http.post(self.url("/clear_history"));
        let resp = self.send(req, self.cfg.request_timeout()).await?;
        let reply = self.reply(resp).await?;
        Ok(reply.detail().unwrap_or("Chat history cleared").to_string())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    use super::*;
    use crate::services::test_support::client;

    fn creds() -> Credentials {
        Credentials {
            username: "admin".into(),
            password: "admin".into(),
        }
    }

    #[tokio::test]
    async fn sign_in_success() {
        let (server, client) = client().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(serde_json::json!({"username":"admin","password":"admin"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .mount(&server)
            .await;

        assert!(client.sign_in(&creds()).await.unwrap());
    }

    #[tokio::test]
    async fn sign_in_invalid_credentials_is_false() {
        let (server, client) = client().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                serde_json::json!({"success": false, "message": "Invalid credentials"}),
            ))
            .mount(&server)
            .await;

        assert!(!client.sign_in(&creds()).await.unwrap());
    }

    #[tokio::test]
    async fn sign_in_server_error_is_an_error() {
        let (server, client) = client().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(500).set_body_json(
                serde_json::json!({"success": false, "message": "Failed to prepare unstructured vector store"}),
            ))
            .mount(&server)
            .await;

        let err = client.sign_in(&creds()).await.unwrap_err();
        assert_eq!(
            err.user_message("sign-in failed"),
            "Failed to prepare unstructured vector store"
        );
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let (server, client) = client().await;
        Mock::given(method("POST"))
            .and(path("/logout"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        client.logout().await.unwrap();
        client.logout().await.unwrap();
    }

    #[tokio::test]
    async fn clear_history_returns_message() {
        let (server, client) = client().await;
        Mock::given(method("POST"))
            .and(path("/clear_history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"message": "Chat history cleared for user admin"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(
            client.clear_history().await.unwrap(),
            "Chat history cleared for user admin"
        );
    }
}
