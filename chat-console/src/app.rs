//! Command execution against the controller and the backend client.

use std::sync::Arc;

use backend_client::{AppConfig, BackendClient, SyncRequest};
use chat_stream::{QuestionController, QuestionType, ResultStore};
use tracing::{info, instrument};

use crate::{
    commands::{Command, HELP},
    error_handler::{ConsoleError, ConsoleResult},
    progress,
};

/// What the loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to print; the view reports progress.
    Silent,
    Notice(String),
    Quit(String),
}

pub struct Console {
    client: Arc<BackendClient>,
    controller: QuestionController<BackendClient>,
    features: AppConfig,
}

impl Console {
    pub fn new(client: Arc<BackendClient>, store: Arc<ResultStore>, features: AppConfig) -> Self {
        let controller = QuestionController::new(store, client.clone());
        Self {
            client,
            controller,
            features,
        }
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        self.controller.store()
    }

    /// Runs one command.
    ///
    /// # Errors
    /// Input errors and backend failures; neither affects other entries.
    #[instrument(skip_all)]
    pub async fn execute(&self, cmd: Command) -> ConsoleResult<Reply> {
        match cmd {
            Command::Ask(text) => {
                let sub = self.controller.submit(&text, QuestionType::Default).await?;
                info!(index = sub.index(), "question streaming");
                Ok(Reply::Silent)
            }
            Command::Related { entry, pick } => {
                let source = self
                    .store()
                    .at(entry)
                    .await
                    .ok_or(ConsoleError::NoSuchEntry(entry + 1))?;
                let question = source
                    .details()
                    .and_then(|d| d.related_questions.get(pick))
                    .ok_or(ConsoleError::NoSuchRelated(entry + 1, pick + 1))?;
                self.controller.ask_related(entry, question).await?;
                Ok(Reply::Silent)
            }
            Command::Clear => {
                // Local results go first, whatever the backend answers.
                self.controller.clear().await;
                let msg = self.client.clear_history().await?;
                Ok(Reply::Notice(msg))
            }
            Command::Upload {
                path,
                delimiter,
                description,
            } => {
                let spinner = progress::start("Uploading CSV");
                let res = self
                    .client
                    .upload_csv(&path, &description, Some(delimiter))
                    .await;
                spinner.clear();
                let msg = res?;
                // The backend restarts the conversation on a new data source.
                self.controller.clear().await;
                Ok(Reply::Notice(msg))
            }
            Command::Sync(vdbs) => {
                let label = if vdbs.is_empty() {
                    "Syncing all vector stores".to_string()
                } else {
                    format!("Syncing {}", vdbs.join(", "))
                };
                let spinner = progress::start(&label);
                let res = self.client.sync_vector_stores(&SyncRequest::for_vdbs(vdbs)).await;
                spinner.clear();
                Ok(Reply::Notice(res?))
            }
            Command::Feedback {
                entry,
                value,
                details,
            } => {
                let source = self
                    .store()
                    .at(entry)
                    .await
                    .ok_or(ConsoleError::NoSuchEntry(entry + 1))?;
                let uuid = source
                    .uuid()
                    .ok_or(ConsoleError::NotAnswered(entry + 1))?
                    .to_string();
                let msg = self
                    .client
                    .submit_feedback(&uuid, value, details.as_deref())
                    .await?;
                self.controller.record_feedback(&uuid, value, details).await;
                Ok(Reply::Notice(msg))
            }
            Command::WhoAmI => {
                let user = self.client.current_user().await?;
                Ok(Reply::Notice(format!("Signed in as {user}")))
            }
            Command::Profile {
                instructions,
                details,
            } => {
                let msg = self
                    .client
                    .update_custom_instructions(&instructions, &details)
                    .await?;
                Ok(Reply::Notice(msg))
            }
            Command::Config => Ok(Reply::Notice(self.describe_features())),
            Command::Logout => {
                self.client.logout().await?;
                self.controller.clear().await;
                Ok(Reply::Quit("Logged out".to_string()))
            }
            Command::Help => Ok(Reply::Notice(HELP.to_string())),
            Command::Quit => Ok(Reply::Quit("Bye".to_string())),
        }
    }

    /// Cancels open question streams and waits for them to close.
    pub async fn shutdown(&self) {
        info!(in_flight = self.controller.in_flight(), "shutting down sessions");
        self.controller.shutdown().await;
    }

    fn describe_features(&self) -> String {
        let on_off = |b: bool| if b { "on" } else { "off" };
        let mut lines = vec![
            format!("backend: {}", self.client.config().base_url),
            format!("feedback: {}", on_off(self.features.feedback_enabled())),
            format!("unstructured mode: {}", on_off(self.features.unstructured_mode())),
            format!("vector sync: {}", on_off(self.features.vector_sync_enabled())),
        ];
        if let Some(url) = self.features.data_catalog_url() {
            lines.push(format!("data catalog: {url}"));
        }
        let keys: Vec<&str> = self.features.keys().collect();
        if !keys.is_empty() {
            lines.push(format!("backend keys: {}", keys.join(", ")));
        }
        lines.join("\n")
    }
}

/// Message shown when `cmd` fails without a backend detail.
pub fn fallback_message(cmd: &Command) -> &'static str {
    match cmd {
        Command::Ask(_) | Command::Related { .. } => "Could not submit the question.",
        Command::Clear => "Failed to clear chat history.",
        Command::Upload { .. } => "An error occurred while uploading the file.",
        Command::Sync(_) => "An error occurred during VectorDB synchronization.",
        Command::Feedback { .. } => "Failed to submit feedback.",
        Command::WhoAmI => "Could not fetch the current user.",
        Command::Profile { .. } => "An error occurred while updating your profile.",
        Command::Logout => "Logout failed.",
        Command::Config | Command::Help | Command::Quit => "Unexpected error.",
    }
}

#[cfg(test)]
mod tests {
    use backend_client::ClientConfig;
    use chat_stream::{EntryState, SessionOutcome};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path, query_param},
    };

    use super::*;
    use crate::commands::{NEGATIVE, parse_line};

    async fn console() -> (MockServer, Console) {
        let server = MockServer::start().await;
        let client = Arc::new(BackendClient::new(ClientConfig::new(server.uri())).unwrap());
        let console = Console::new(client, Arc::new(ResultStore::new()), AppConfig::default());
        (server, console)
    }

    fn cmd(line: &str) -> Command {
        parse_line(line).unwrap().unwrap()
    }

    async fn answer(server: &MockServer, query: &str, uuid: &str) {
        let payload = serde_json::json!({
            "uuid": uuid,
            "related_questions": ["What about last year?"]
        });
        let body = format!(
            "data: <TOOL:data>\n\ndata: Done.\n\ndata: <STREAMOFF>\n\ndata: {payload}\n\n"
        );
        Mock::given(method("GET"))
            .and(path("/question"))
            .and(query_param("query", query))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(server)
            .await;
    }

    /// Waits until entry `index` is resolved or failed.
    async fn wait_settled(console: &Console, index: usize) {
        let mut events = console.store().subscribe();
        let settled = async {
            loop {
                if console.store().at(index).await.is_some_and(|e| !e.is_loading()) {
                    return;
                }
                let _ = events.recv().await;
            }
        };
        tokio::time::timeout(std::time::Duration::from_secs(10), settled)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn related_question_inherits_data_type() {
        let (server, console) = console().await;
        answer(&server, "sales by month", "u-1").await;
        answer(&server, "What about last year?", "u-2").await;

        console.execute(cmd("sales by month")).await.unwrap();
        wait_settled(&console, 0).await;
        console.execute(cmd(":related 1 1")).await.unwrap();
        wait_settled(&console, 1).await;

        let follow_up = console.store().at(1).await.unwrap();
        assert_eq!(follow_up.question, "What about last year?");
        assert_eq!(follow_up.question_type, QuestionType::Data);
        assert_eq!(follow_up.uuid(), Some("u-2"));
    }

    #[tokio::test]
    async fn feedback_is_sent_and_recorded() {
        let (server, console) = console().await;
        answer(&server, "top customers", "u-9").await;
        Mock::given(method("POST"))
            .and(path("/submit_feedback"))
            .and(body_json(serde_json::json!({
                "uuid": "u-9", "feedback": NEGATIVE, "feedback_details": "stale data"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let sub = console
            .controller
            .submit("top customers", QuestionType::Default)
            .await
            .unwrap();
        assert_eq!(sub.outcome().await, SessionOutcome::Resolved);

        let reply = console.execute(cmd(":feedback 1 bad stale data")).await.unwrap();
        assert_eq!(reply, Reply::Notice("Feedback submitted".into()));
        let entry = console.store().at(0).await.unwrap();
        assert_eq!(entry.feedback.unwrap().value, NEGATIVE);
    }

    #[tokio::test]
    async fn feedback_on_unknown_or_pending_entry_is_refused() {
        let (_server, console) = console().await;
        let err = console.execute(cmd(":feedback 2 good")).await.unwrap_err();
        assert!(matches!(err, ConsoleError::NoSuchEntry(2)));

        console
            .store()
            .append(chat_stream::ResultEntry::pending("q", QuestionType::Default))
            .await;
        let err = console.execute(cmd(":feedback 1 good")).await.unwrap_err();
        assert!(matches!(err, ConsoleError::NotAnswered(1)));
    }

    #[tokio::test]
    async fn successful_upload_clears_conversation() {
        let (server, console) = console().await;
        Mock::given(method("POST"))
            .and(path("/update_csv"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "CSV file uploaded and processed successfully"
            })))
            .mount(&server)
            .await;
        console
            .store()
            .append(chat_stream::ResultEntry::pending("old", QuestionType::Default))
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("people.csv");
        std::fs::write(&file, "name,age\nAna,31\n").unwrap();
        let line = format!(":upload {} , People list", file.display());

        let reply = console.execute(cmd(&line)).await.unwrap();
        assert_eq!(
            reply,
            Reply::Notice("CSV file uploaded and processed successfully".into())
        );
        assert!(console.store().is_empty().await);
    }

    #[tokio::test]
    async fn failed_sync_keeps_conversation() {
        let (server, console) = console().await;
        Mock::given(method("POST"))
            .and(path("/sync_vdbs"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "success": false, "message": "Connection refused by AI SDK"
            })))
            .mount(&server)
            .await;
        console
            .store()
            .append(chat_stream::ResultEntry::pending("keep me", QuestionType::Default))
            .await;

        let command = cmd(":sync samples_bank");
        let err = console.execute(command.clone()).await.unwrap_err();
        assert_eq!(
            err.user_message(fallback_message(&command)),
            "Connection refused by AI SDK"
        );
        assert_eq!(console.store().len().await, 1);
        assert_eq!(
            console.store().at(0).await.unwrap().state,
            EntryState::Loading
        );
    }

    #[tokio::test]
    async fn empty_directive_is_rejected() {
        let (_server, console) = console().await;
        let err = console.execute(cmd("/sql   ")).await.unwrap_err();
        assert_eq!(err.user_message("x"), "Please enter a question.");
        assert!(console.store().is_empty().await);
    }

    #[tokio::test]
    async fn clear_empties_local_results_even_when_backend_fails() {
        let (server, console) = console().await;
        Mock::given(method("POST"))
            .and(path("/clear_history"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        console
            .store()
            .append(chat_stream::ResultEntry::pending("old", QuestionType::Default))
            .await;

        let err = console.execute(Command::Clear).await.unwrap_err();
        assert_eq!(
            err.user_message(fallback_message(&Command::Clear)),
            "Failed to clear chat history."
        );
        assert!(console.store().is_empty().await);
    }

    #[tokio::test]
    async fn config_lists_flags_and_keys() {
        let server = MockServer::start().await;
        let client = Arc::new(BackendClient::new(ClientConfig::new(server.uri())).unwrap());
        let features: AppConfig = serde_json::from_value(serde_json::json!({
            "dataCatalogUrl": "https://catalog.local",
            "feedbackEnabled": true
        }))
        .unwrap();
        let console = Console::new(client, Arc::new(ResultStore::new()), features);

        let Reply::Notice(text) = console.execute(Command::Config).await.unwrap() else {
            panic!("expected a notice");
        };
        assert!(text.contains("feedback: on"));
        assert!(text.contains("vector sync: off"));
        assert!(text.contains("data catalog: https://catalog.local"));
        assert!(text.contains("backend keys: "));
        assert!(text.contains("dataCatalogUrl"));
        assert!(text.contains("feedbackEnabled"));
    }

    #[tokio::test]
    async fn logout_quits() {
        let (server, console) = console().await;
        Mock::given(method("POST"))
            .and(path("/logout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "message": "Logged out successfully"
            })))
            .mount(&server)
            .await;
        assert_eq!(
            console.execute(Command::Logout).await.unwrap(),
            Reply::Quit("Logged out".into())
        );
    }
}
