//! Conversation records: one [`ResultEntry`] per question/answer exchange.
//!
//! The terminal JSON payload decodes into [`TerminalPayload`] and is folded into
//! the entry as [`AnswerDetails`] exactly once.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Routing class of a question.
///
/// Tokens outside the four known kinds (e.g. `direct`) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum QuestionType {
    /// Answered by querying data (SQL/VQL).
    Data,
    /// Answered from schema/metadata.
    Metadata,
    /// Answered from the knowledge base.
    Kb,
    /// Let the backend pick.
    #[default]
    Default,
    /// Any other backend-announced token.
    Other(String),
}

impl QuestionType {
    /// Wire token of this type.
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::Data => "data",
            QuestionType::Metadata => "metadata",
            QuestionType::Kb => "kb",
            QuestionType::Default => "default",
            QuestionType::Other(s) => s,
        }
    }

    /// Only `data` and `metadata` are carried over to follow-up questions.
    pub fn carries_to_follow_up(&self) -> bool {
        matches!(self, QuestionType::Data | QuestionType::Metadata)
    }
}

impl From<&str> for QuestionType {
    fn from(token: &str) -> Self {
        match token {
            "data" => QuestionType::Data,
            "metadata" => QuestionType::Metadata,
            "kb" => QuestionType::Kb,
            "default" => QuestionType::Default,
            other => QuestionType::Other(other.to_string()),
        }
    }
}

impl FromStr for QuestionType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(QuestionType::from(s))
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for QuestionType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QuestionType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let token = String::deserialize(d)?;
        Ok(QuestionType::from(token.as_str()))
    }
}

/// One cell of a tabular execution result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(rename = "columnName")]
    pub column_name: String,
    #[serde(default)]
    pub value: Value,
}

/// Raw execution result of the generated query.
///
/// The backend sends row groups (`"Row 1" -> [cells]`) on success and a plain
/// message when no query ran or execution failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutionResult {
    Rows(IndexMap<String, Vec<Cell>>),
    Message(String),
}

impl ExecutionResult {
    /// Row groups, or `None` for a message result.
    pub fn rows(&self) -> Option<&IndexMap<String, Vec<Cell>>> {
        match self {
            ExecutionResult::Rows(rows) => Some(rows),
            ExecutionResult::Message(_) => None,
        }
    }
}

/// The single structured message that ends a question's stream.
///
/// Any JSON object is accepted: absent, `null` or oddly typed fields decode
/// to their empty value instead of rejecting the payload. `answer` may be
/// present on the wire but the accumulated streamed text stays authoritative.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TerminalPayload {
    #[serde(default, deserialize_with = "lenient::text")]
    pub vql: Option<String>,
    #[serde(default)]
    pub data_sources: Option<Value>,
    #[serde(default)]
    pub embeddings: Option<Value>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub related_questions: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub query_explanation: Option<String>,
    #[serde(default, deserialize_with = "lenient::execution_result")]
    pub execution_result: Option<ExecutionResult>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub tables_used: Vec<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient::seconds")]
    pub ai_sdk_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_only")]
    pub graph: Option<String>,
}

/// Field decoders that never fail on a well-formed JSON value.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::ExecutionResult;

    fn scalar_text(v: &Value) -> Option<String> {
        match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub(super) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(scalar_text(&Value::deserialize(d)?))
    }

    pub(super) fn string_only<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub(super) fn text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
            Value::String(s) if !s.is_empty() => vec![s],
            _ => Vec::new(),
        })
    }

    pub(super) fn count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub(super) fn seconds<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub(super) fn execution_result<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<ExecutionResult>, D::Error> {
        let value = Value::deserialize(d)?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(
            serde_json::from_value::<ExecutionResult>(value.clone())
                .unwrap_or_else(|_| ExecutionResult::Message(value.to_string())),
        ))
    }
}

/// Terminal-only fields of a resolved entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnswerDetails {
    pub vql: Option<String>,
    pub data_sources: Option<Value>,
    pub embeddings: Option<Value>,
    pub related_questions: Vec<String>,
    pub query_explanation: Option<String>,
    pub execution_result: Option<ExecutionResult>,
    pub tables_used: Vec<String>,
    pub tokens: Option<u64>,
    pub ai_sdk_time: Option<f64>,
    pub uuid: Option<String>,
    /// Data-URI image; only ever set from a non-empty payload value.
    pub graph: Option<String>,
}

impl From<TerminalPayload> for AnswerDetails {
    fn from(p: TerminalPayload) -> Self {
        Self {
            vql: p.vql,
            data_sources: p.data_sources,
            embeddings: p.embeddings,
            related_questions: p.related_questions,
            query_explanation: p.query_explanation,
            execution_result: p.execution_result,
            tables_used: p.tables_used,
            tokens: p.tokens,
            ai_sdk_time: p.ai_sdk_time,
            uuid: p.uuid,
            graph: p.graph.filter(|g| !g.trim().is_empty()),
        }
    }
}

/// User rating attached to a resolved answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub value: String,
    pub details: Option<String>,
}

/// Where an entry is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryState {
    /// Waiting for text or the terminal payload.
    Loading,
    /// Terminal payload applied; `result` is frozen.
    Resolved(Box<AnswerDetails>),
    /// Stream failed; `result` holds the failure message.
    Failed,
}

/// One question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub question: String,
    pub question_type: QuestionType,
    pub result: String,
    pub state: EntryState,
    pub feedback: Option<Feedback>,
}

impl ResultEntry {
    /// A fresh entry for a just-submitted question.
    pub fn pending(question: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            question: question.into(),
            question_type,
            result: String::new(),
            state: EntryState::Loading,
            feedback: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, EntryState::Loading)
    }

    /// Terminal fields, present once resolved.
    pub fn details(&self) -> Option<&AnswerDetails> {
        match &self.state {
            EntryState::Resolved(d) => Some(d),
            _ => None,
        }
    }

    /// Correlation id from the terminal payload.
    pub fn uuid(&self) -> Option<&str> {
        self.details().and_then(|d| d.uuid.as_deref())
    }
}
