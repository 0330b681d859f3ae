//! Leading `/command` directives that force a question type.

use lazy_static::lazy_static;
use regex::Regex;

use crate::entry::QuestionType;

lazy_static! {
    // `/word` followed by optional whitespace, at the very start.
    static ref DIRECTIVE: Regex = Regex::new(r"^/(\w+)\s*").expect("valid directive regex");
}

/// A question with any recognized directive removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestion {
    /// Text to display and send.
    pub text: String,
    /// Type forced by the directive, if any.
    pub forced_type: Option<QuestionType>,
}

/// Maps a directive word to its type by prefix (`/sql…`, `/data…` → data;
/// `/metadata…`, `/schema…` → metadata). Matching ignores case.
pub fn directive_type(word: &str) -> Option<QuestionType> {
    let word = word.to_ascii_lowercase();
    if word.starts_with("sql") || word.starts_with("data") {
        Some(QuestionType::Data)
    } else if word.starts_with("metadata") || word.starts_with("schema") {
        Some(QuestionType::Metadata)
    } else {
        None
    }
}

/// Strips a recognized directive and reports the type it forces.
///
/// Unknown directives (e.g. `/help`) are left in the text untouched.
pub fn parse_question(input: &str) -> ParsedQuestion {
    let trimmed = input.trim();
    if let Some(caps) = DIRECTIVE.captures(trimmed) {
        if let Some(kind) = directive_type(&caps[1]) {
            let rest = &trimmed[caps[0].len()..];
            return ParsedQuestion {
                text: rest.trim().to_string(),
                forced_type: Some(kind),
            };
        }
    }
    ParsedQuestion {
        text: trimmed.to_string(),
        forced_type: None,
    }
}
