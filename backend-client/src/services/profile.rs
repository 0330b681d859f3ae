//! User profile calls.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    client::BackendClient,
    error_handler::{BackendError, Result},
};

#[derive(Deserialize)]
struct CurrentUser {
    username: Option<String>,
}

#[derive(Serialize)]
struct ProfileUpdate<'a> {
    custom_instructions: &'a str,
    user_details: &'a str,
}

impl BackendClient {
    /// Name of the signed-in user.
    ///
    /// # Errors
    /// [`BackendError::Decode`] when the reply carries no username.
    #[instrument(skip_all)]
    pub async fn current_user(&self) -> Result<String> {
        let req = self.http.get(self.url("/current_user"));
        let resp = self.send(req, self.cfg.request_timeout()).await?;
        self.decode::<CurrentUser>(resp)
            .await?
            .and_then(|u| u.username)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| BackendError::Decode("reply has no username".into()))
    }

    /// Replaces the user's custom instructions and profile details.
    ///
    /// # Errors
    /// Transport failures and backend rejections.
    #[instrument(skip_all, fields(instructions_len = custom_instructions.len()))]
    pub async fn update_custom_instructions(
        &self,
        custom_instructions: &str,
        user_details: &str,
    ) -> Result<String> {
        let body = ProfileUpdate {
            custom_instructions,
            user_details,
        };
        let req = self
            .http
            .post(self.url("/update_custom_instructions"))
            .json(&body);
        let resp = self.send(req, self.cfg.request_timeout()).await?;
        let reply = self.reply(resp).await?;
        info!("profile updated");
        Ok(reply.detail().unwrap_or("Profile updated successfully!").to_string())
    }
}
