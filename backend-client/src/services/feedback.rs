//! Answer feedback (`POST /submit_feedback`).

use serde::Serialize;
use tracing::{info, instrument};

use crate::{client::BackendClient, error_handler::Result};

#[derive(Serialize)]
struct FeedbackRequest<'a> {
    uuid: &'a str,
    feedback: &'a str,
    feedback_details: &'a str,
}

impl BackendClient {
    /// Sends feedback for the answer identified by `uuid`.
    ///
    /// # Errors
    /// Transport failures and backend rejections.
    #[instrument(skip_all, fields(%uuid, %value))]
    pub async fn submit_feedback(
        &self,
        uuid: &str,
        value: &str,
        details: Option<&str>,
    ) -> Result<String> {
        let body = FeedbackRequest {
            uuid,
            feedback: value,
            feedback_details: details.unwrap_or_default(),
        };
        let req = self.http.post(self.url("/submit_feedback")).json(&body);
        let resp = self.send(req, self.cfg.request_timeout()).await?;
        let reply = self.reply(resp).await?;
        info!("feedback submitted");
        Ok(reply.detail().unwrap_or("Feedback submitted").to_string())
    }
}
