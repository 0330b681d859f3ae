//! The server-push question stream (`GET /question`).
//!
//! Each SSE `data:` line is one stream unit; framing is handled by
//! `eventsource-stream`, classification by `chat-stream`.

use async_trait::async_trait;
use chat_stream::{QuestionTransport, QuestionType, TransportError, UnitStream};
use eventsource_stream::Eventsource;
use futures::{StreamExt, stream};
use reqwest::header::ACCEPT;
use tracing::{debug, instrument, warn};

use crate::{
    client::BackendClient,
    error_handler::{BackendError, Result, make_snippet},
};

impl BackendClient {
    /// Opens the question stream for `question`.
    ///
    /// The returned stream yields one item per SSE event and ends when the
    /// server closes the connection. A silence longer than the configured
    /// idle timeout yields [`TransportError::Idle`] and ends the stream.
    ///
    /// # Errors
    /// Transport failures before the first byte, and non-2xx statuses.
    #[instrument(skip_all, fields(question_type = %question_type, len = question.len()))]
    pub async fn open_question_stream(
        &self,
        question: &str,
        question_type: &QuestionType,
    ) -> Result<UnitStream> {
        let req = self
            .http
            .get(self.url("/question"))
            .query(&[("query", question), ("type", question_type.as_str())])
            .header(ACCEPT, "text/event-stream");

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let url = resp.url().to_string();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "question stream refused");
            return Err(BackendError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&body, 240),
            });
        }
        debug!(%status, "question stream accepted");

        let idle = self.cfg.stream_idle();
        let events = Box::pin(resp.bytes_stream().eventsource());

        let units = stream::unfold(Some(events), move |state| async move {
            let mut events = state?;
            loop {
                match tokio::time::timeout(idle, events.next()).await {
                    // Keep-alive events carry no unit.
                    Ok(Some(Ok(event))) if event.data.is_empty() => {}
                    Ok(Some(Ok(event))) => return Some((Ok(event.data), Some(events))),
                    Ok(Some(Err(err))) => {
                        return Some((Err(TransportError::Interrupted(err.to_string())), None));
                    }
                    Ok(None) => return None,
                    Err(_) => {
                        warn!(idle_secs = idle.as_secs(), "question stream went silent");
                        return Some((Err(TransportError::Idle(idle)), None));
                    }
                }
            }
        });

        Ok(units.boxed())
    }
}

#[async_trait]
impl QuestionTransport for BackendClient {
    async fn open(
        &self,
        question: &str,
        question_type: &QuestionType,
    ) -> std::result::Result<UnitStream, TransportError> {
        self.open_question_stream(question, question_type)
            .await
            .map_err(|e| TransportError::Open(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chat_stream::{
        EntryState, FAILURE_MESSAGE, QuestionController, ResultStore, SessionOutcome,
    };
    use wiremock::{
        Mock, ResponseTemplate,
        matchers::{header, method, path, query_param},
    };

    use super::*;
    use crate::services::test_support::client;

    fn sse(units: &[&str]) -> String {
        units.iter().map(|u| format!("data: {u}\n\n")).collect()
    }

    fn event_stream(body: String) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
    }

    #[tokio::test]
    async fn yields_one_unit_per_event() {
        let (server, client) = client().await;
        Mock::given(method("GET"))
            .and(path("/question"))
            .and(query_param("query", "how many rows?"))
            .and(query_param("type", "default"))
            .and(header("accept", "text/event-stream"))
            .respond_with(event_stream(sse(&["<TOOL:data>", "There are", " 42"])))
            .mount(&server)
            .await;

        let units: Vec<_> = client
            .open_question_stream("how many rows?", &QuestionType::Default)
            .await
            .unwrap()
            .collect()
            .await;
        let units: Vec<String> = units.into_iter().map(|u| u.unwrap()).collect();
        assert_eq!(units, vec!["<TOOL:data>", "There are", " 42"]);
    }

    #[tokio::test]
    async fn refused_stream_is_an_open_error() {
        let (server, client) = client().await;
        Mock::given(method("GET"))
            .and(path("/question"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = QuestionTransport::open(&client, "q", &QuestionType::Data)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::Open(_)));
    }

    #[tokio::test]
    async fn controller_resolves_over_http() {
        let (server, client) = client().await;
        let payload = serde_json::json!({
            "uuid": "7f1c",
            "vql": "SELECT region, SUM(amount) FROM sales GROUP BY region",
            "execution_result": {
                "Row 1": [{"columnName": "region", "value": "EU"}, {"columnName": "total", "value": 10}],
                "Row 2": [{"columnName": "region", "value": "US"}, {"columnName": "total", "value": 12}]
            },
            "related_questions": ["Which region grew fastest?"],
            "tables_used": ["sales"],
            "tokens": 812,
            "ai_sdk_time": 3.2,
            "graph": ""
        });
        let payload = payload.to_string();
        Mock::given(method("GET"))
            .and(path("/question"))
            .and(query_param("query", "total sales by region"))
            .and(query_param("type", "data"))
            .respond_with(event_stream(sse(&[
                "<TOOL:data>",
                "EU has 10,",
                "<NEWLINE>US has 12.",
                "<STREAMOFF>",
                &payload,
            ])))
            .mount(&server)
            .await;

        let store = Arc::new(ResultStore::new());
        let controller = QuestionController::new(store.clone(), Arc::new(client));
        let sub = controller
            .submit("/sql total sales by region", QuestionType::Default)
            .await
            .unwrap();
        assert_eq!(sub.outcome().await, SessionOutcome::Resolved);

        let entry = store.at(0).await.unwrap();
        assert_eq!(entry.question, "total sales by region");
        assert_eq!(entry.question_type, QuestionType::Data);
        assert_eq!(entry.result, "EU has 10,\nUS has 12.");
        let details = entry.details().unwrap();
        assert_eq!(details.uuid.as_deref(), Some("7f1c"));
        assert_eq!(details.tokens, Some(812));
        assert_eq!(details.graph, None);
        let rows = details.execution_result.as_ref().and_then(|r| r.rows()).unwrap();
        assert_eq!(rows.keys().collect::<Vec<_>>(), vec!["Row 1", "Row 2"]);
    }

    #[tokio::test]
    async fn controller_fails_when_stream_ends_early() {
        let (server, client) = client().await;
        Mock::given(method("GET"))
            .and(path("/question"))
            .respond_with(event_stream(sse(&["partial answer"])))
            .mount(&server)
            .await;

        let store = Arc::new(ResultStore::new());
        let controller = QuestionController::new(store.clone(), Arc::new(client));
        let sub = controller.submit("anything", QuestionType::Default).await.unwrap();
        assert!(matches!(sub.outcome().await, SessionOutcome::Failed(_)));

        let entry = store.at(0).await.unwrap();
        assert_eq!(entry.state, EntryState::Failed);
        assert_eq!(entry.result, FAILURE_MESSAGE);
    }
}
