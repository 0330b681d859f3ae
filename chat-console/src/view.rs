//! Terminal rendering of the conversation.
//!
//! The view subscribes to store events and re-reads the affected entry on
//! each one. It prints a line when a question is appended, when the backend
//! re-routes it, and a block when it resolves or fails. Streaming text is
//! shown once, with the resolved answer.

use std::{collections::HashMap, sync::Arc};

use chat_stream::{
    AnswerDetails, EntryState, ExecutionResult, QuestionType, ResultEntry, ResultStore, StoreEvent,
};
use colored::Colorize;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Rows of an execution result printed before eliding the rest.
const MAX_ROWS: usize = 5;

/// What has already been printed for an entry.
#[derive(Debug, Clone, PartialEq)]
struct Seen {
    question_type: QuestionType,
    settled: bool,
    feedback: bool,
}

pub struct ConversationView {
    store: Arc<ResultStore>,
    catalog_url: Option<String>,
    seen: HashMap<usize, Seen>,
}

impl ConversationView {
    pub fn new(store: Arc<ResultStore>, catalog_url: Option<String>) -> Self {
        Self {
            store,
            catalog_url,
            seen: HashMap::new(),
        }
    }

    /// Prints store changes until the store is dropped.
    pub async fn run(mut self) {
        let mut events = self.store.subscribe();
        loop {
            match events.recv().await {
                Ok(StoreEvent::Cleared) => {
                    self.seen.clear();
                    println!("{}", "-- conversation cleared --".dimmed());
                }
                Ok(StoreEvent::Appended(index) | StoreEvent::Updated(index)) => {
                    self.refresh(index).await;
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "view lagged behind the store, rescanning");
                    for index in 0..self.store.len().await {
                        self.refresh(index).await;
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("conversation view stopped");
    }

    async fn refresh(&mut self, index: usize) {
        if let Some(entry) = self.store.at(index).await {
            for line in self.observe(index, &entry) {
                println!("{line}");
            }
        }
    }

    /// Lines to print for the current state of `entry`, given what was
    /// printed before.
    fn observe(&mut self, index: usize, entry: &ResultEntry) -> Vec<String> {
        let mut out = Vec::new();
        let seen = self.seen.entry(index).or_insert_with(|| {
            out.push(render_question(index, entry));
            Seen {
                question_type: entry.question_type.clone(),
                settled: false,
                feedback: false,
            }
        });

        if !seen.settled && seen.question_type != entry.question_type {
            out.push(format!(
                "{} routed as {}",
                label(index).dimmed(),
                entry.question_type.to_string().yellow()
            ));
        }
        seen.question_type = entry.question_type.clone();

        if !seen.settled {
            match &entry.state {
                EntryState::Loading => {}
                EntryState::Failed => {
                    seen.settled = true;
                    out.push(format!("{} {}", label(index).red().bold(), entry.result.red()));
                }
                EntryState::Resolved(details) => {
                    seen.settled = true;
                    out.extend(render_answer(index, entry, details, self.catalog_url.as_deref()));
                }
            }
        }

        if let Some(fb) = entry.feedback.as_ref().filter(|_| !seen.feedback) {
            seen.feedback = true;
            out.push(format!("{} feedback recorded: {}", label(index).dimmed(), fb.value));
        }
        out
    }
}

fn label(index: usize) -> String {
    format!("#{}", index + 1)
}

fn render_question(index: usize, entry: &ResultEntry) -> String {
    format!(
        "{} {} {}",
        label(index).cyan().bold(),
        format!("[{}]", entry.question_type).dimmed(),
        entry.question.bold()
    )
}

fn render_answer(
    index: usize,
    entry: &ResultEntry,
    details: &AnswerDetails,
    catalog_url: Option<&str>,
) -> Vec<String> {
    let mut out = vec![format!("{} {}", label(index).green().bold(), entry.result)];
    let field = |name: &str, value: &str| format!("  {} {value}", format!("{name}:").dimmed());

    if let Some(vql) = details.vql.as_deref().filter(|v| !v.is_empty()) {
        out.push(field("query", vql));
    }
    if let Some(expl) = details.query_explanation.as_deref().filter(|v| !v.is_empty()) {
        out.push(field("explanation", expl));
    }
    if !details.tables_used.is_empty() {
        out.push(field("tables", &details.tables_used.join(", ")));
        if let Some(url) = catalog_url {
            out.push(field("catalog", url));
        }
    }
    match &details.execution_result {
        Some(ExecutionResult::Rows(rows)) => {
            for (name, cells) in rows.iter().take(MAX_ROWS) {
                let cells: Vec<String> = cells
                    .iter()
                    .map(|c| format!("{}={}", c.column_name, cell_text(&c.value)))
                    .collect();
                out.push(field(name, &cells.join("  ")));
            }
            if rows.len() > MAX_ROWS {
                out.push(format!("  ... {} more rows", rows.len() - MAX_ROWS).dimmed().to_string());
            }
        }
        Some(ExecutionResult::Message(msg)) if !msg.is_empty() => out.push(field("result", msg)),
        _ => {}
    }
    for (k, q) in details.related_questions.iter().enumerate() {
        out.push(format!("  {} {q}", format!("related {}:", k + 1).yellow()));
    }

    let mut stats = Vec::new();
    if let Some(tokens) = details.tokens {
        stats.push(format!("tokens {tokens}"));
    }
    if let Some(secs) = details.ai_sdk_time {
        stats.push(format!("time {secs:.2}s"));
    }
    if let Some(uuid) = details.uuid.as_deref() {
        stats.push(format!("id {uuid}"));
    }
    if details.graph.is_some() {
        stats.push("graph attached".to_string());
    }
    if !stats.is_empty() {
        out.push(format!("  {}", stats.join(" | ")).dimmed().to_string());
    }
    out
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chat_stream::{Feedback, TerminalPayload};

    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    fn view() -> ConversationView {
        ConversationView::new(Arc::new(ResultStore::new()), None)
    }

    fn resolved(raw: &str) -> EntryState {
        let payload: TerminalPayload = serde_json::from_str(raw).unwrap();
        EntryState::Resolved(Box::new(AnswerDetails::from(payload)))
    }

    #[test]
    fn question_then_reroute_then_answer() {
        plain();
        let mut view = view();
        let mut entry = ResultEntry::pending("total sales by region", QuestionType::Default);

        assert_eq!(
            view.observe(0, &entry),
            vec!["#1 [default] total sales by region"]
        );

        entry.question_type = QuestionType::Data;
        entry.result.push_str("EU leads");
        assert_eq!(view.observe(0, &entry), vec!["#1 routed as data"]);

        entry.state = resolved(
            r#"{"vql":"SELECT 1","tables_used":["sales"],
                "execution_result":{"Row 1":[{"columnName":"region","value":"EU"},{"columnName":"total","value":10}]},
                "related_questions":["And in 2023?"],"tokens":12,"uuid":"u-1"}"#,
        );
        let lines = view.observe(0, &entry);
        assert_eq!(lines[0], "#1 EU leads");
        assert!(lines.contains(&"  query: SELECT 1".to_string()));
        assert!(lines.contains(&"  tables: sales".to_string()));
        assert!(lines.contains(&"  Row 1: region=EU  total=10".to_string()));
        assert!(lines.contains(&"  related 1: And in 2023?".to_string()));
        assert_eq!(lines.last().unwrap(), "  tokens 12 | id u-1");

        // Settled entries print nothing more.
        assert!(view.observe(0, &entry).is_empty());
    }

    #[test]
    fn failure_and_feedback_lines() {
        plain();
        let mut view = view();
        let mut entry = ResultEntry::pending("q", QuestionType::Kb);
        view.observe(3, &entry);

        entry.state = EntryState::Failed;
        entry.result = chat_stream::FAILURE_MESSAGE.to_string();
        assert_eq!(
            view.observe(3, &entry),
            vec![format!("#4 {}", chat_stream::FAILURE_MESSAGE)]
        );

        entry.feedback = Some(Feedback {
            value: "negative".into(),
            details: None,
        });
        assert_eq!(view.observe(3, &entry), vec!["#4 feedback recorded: negative"]);
    }

    #[test]
    fn long_results_are_elided() {
        plain();
        let rows: Vec<String> = (1..=8)
            .map(|i| format!(r#""Row {i}":[{{"columnName":"n","value":{i}}}]"#))
            .collect();
        let raw = format!(r#"{{"execution_result":{{{}}}}}"#, rows.join(","));
        let mut view = view();
        let mut entry = ResultEntry::pending("q", QuestionType::Data);
        entry.state = resolved(&raw);

        let lines = view.observe(0, &entry);
        assert!(lines.contains(&"  Row 5: n=5".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Row 6")));
        assert!(lines.contains(&"  ... 3 more rows".to_string()));
    }
}
