//! Framing of the question stream.
//!
//! The backend multiplexes three kinds of information over one text event
//! channel:
//! - `<TOOL:token>` re-types the active question,
//! - `<STREAMOFF>` ends free text,
//! - anything else is a text delta (with `<NEWLINE>` as an escaped line break)
//!   before the marker, and the terminal JSON payload after it.
//!
//! Nothing outside this module matches on these literals.

use crate::{
    entry::{QuestionType, TerminalPayload},
    errors::ClassifyError,
};

/// Prefix of a control tag unit.
pub const TOOL_TAG_PREFIX: &str = "<TOOL:";
/// Literal end-of-free-text sentinel.
pub const STREAM_OFF: &str = "<STREAMOFF>";
/// Escaped line break inside text deltas.
pub const NEWLINE_TOKEN: &str = "<NEWLINE>";

/// A classified stream unit.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Mid-stream correction of the question type.
    ControlTag(QuestionType),
    /// End of free text; the next payload is authoritative.
    TerminalMarker,
    /// Answer text to append.
    TextDelta(String),
    /// Final structured payload.
    TerminalPayload(Box<TerminalPayload>),
}

/// Classifies one raw unit.
///
/// `terminal_mode` is the session's view of whether `<STREAMOFF>` was already
/// seen. Control tags and the marker are recognized in both modes; deciding
/// whether to honor them is left to the caller.
///
/// # Errors
/// Returns [`ClassifyError`] for a unit in terminal mode that is not a JSON
/// object of the terminal payload shape.
pub fn classify(unit: &str, terminal_mode: bool) -> Result<StreamMessage, ClassifyError> {
    if let Some(rest) = unit.strip_prefix(TOOL_TAG_PREFIX) {
        let token = rest.strip_suffix('>').unwrap_or(rest);
        return Ok(StreamMessage::ControlTag(QuestionType::from(token)));
    }

    if unit == STREAM_OFF {
        return Ok(StreamMessage::TerminalMarker);
    }

    if !terminal_mode {
        return Ok(StreamMessage::TextDelta(unit.replace(NEWLINE_TOKEN, "\n")));
    }

    // Structs also decode from JSON arrays; only objects are payloads.
    if !unit.trim_start().starts_with('{') {
        return Err(ClassifyError::NotAnObject {
            snippet: unit.chars().take(80).collect(),
        });
    }
    let payload: TerminalPayload = serde_json::from_str(unit)?;
    Ok(StreamMessage::TerminalPayload(Box::new(payload)))
}
