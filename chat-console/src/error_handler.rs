use backend_client::BackendError;
use chat_stream::ChatStreamError;
use thiserror::Error;

/// Errors raised while executing a console command.
#[derive(Debug, Error)]
pub enum ConsoleError {
    // --- Input ---
    #[error("[Console] usage: {0}")]
    Usage(&'static str),

    #[error("[Console] unknown command: {0} (try :help)")]
    UnknownCommand(String),

    #[error("[Console] no entry #{0}")]
    NoSuchEntry(usize),

    #[error("[Console] entry #{0} has no related question #{1}")]
    NoSuchRelated(usize, usize),

    #[error("[Console] entry #{0} has no answer id yet")]
    NotAnswered(usize),

    // --- Lower layers ---
    #[error(transparent)]
    Chat(#[from] ChatStreamError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ConsoleError {
    /// Stable code used in log fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::Usage(_) => "USAGE",
            ConsoleError::UnknownCommand(_) => "UNKNOWN_COMMAND",
            ConsoleError::NoSuchEntry(_) => "NO_SUCH_ENTRY",
            ConsoleError::NoSuchRelated(..) => "NO_SUCH_RELATED",
            ConsoleError::NotAnswered(_) => "NOT_ANSWERED",
            ConsoleError::Chat(_) => "CHAT_ERROR",
            ConsoleError::Backend(_) => "BACKEND_ERROR",
        }
    }

    /// Line shown to the user. Backend failures show the backend's detail
    /// when it sent one, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ConsoleError::Backend(err) => err.user_message(fallback),
            ConsoleError::Chat(ChatStreamError::EmptyQuestion) => {
                "Please enter a question.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result alias used across command handlers.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_detail_wins_over_fallback() {
        let err = ConsoleError::from(BackendError::InvalidCsv(
            "The uploaded file is not UTF-8 encoded".into(),
        ));
        assert_eq!(err.error_code(), "BACKEND_ERROR");
        assert_eq!(
            err.user_message("An error occurred while uploading the file."),
            "The uploaded file is not UTF-8 encoded"
        );

        let err = ConsoleError::from(BackendError::Decode("x".into()));
        assert_eq!(err.user_message("generic"), "generic");
    }

    #[test]
    fn input_errors_show_themselves() {
        let err = ConsoleError::NoSuchEntry(4);
        assert_eq!(err.user_message("ignored"), "[Console] no entry #4");
        let err = ConsoleError::from(ChatStreamError::EmptyQuestion);
        assert_eq!(err.user_message("ignored"), "Please enter a question.");
    }
}
