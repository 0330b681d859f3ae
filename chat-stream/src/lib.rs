//! Streaming answer reconciliation for the SDK chatbot.
//!
//! A question is appended to the [`ResultStore`] as a pending entry, then one
//! session consumes its server-push stream: every unit is classified
//! (control tag, `<STREAMOFF>`, text delta, terminal JSON) and applied to that
//! entry by index. Any number of sessions run side by side; a store-wide clear
//! turns their remaining writes into no-ops.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use chat_stream::{QuestionController, QuestionTransport, QuestionType, ResultStore};
//!
//! # async fn run<T: QuestionTransport>(transport: Arc<T>) -> chat_stream::Result<()> {
//! let store = Arc::new(ResultStore::new());
//! let controller = QuestionController::new(store.clone(), transport);
//!
//! let sub = controller.submit("/sql total sales by region", QuestionType::Default).await?;
//! let outcome = sub.outcome().await;
//! println!("{outcome:?}: {:?}", store.at(0).await);
//! # Ok(()) }
//! ```

pub mod classifier;
pub mod controller;
pub mod directive;
pub mod entry;
mod errors;
pub mod session;
pub mod store;
pub mod transport;

pub use classifier::{StreamMessage, classify};
pub use controller::{QuestionController, Submission};
pub use directive::{ParsedQuestion, parse_question};
pub use entry::{
    AnswerDetails, Cell, EntryState, ExecutionResult, Feedback, QuestionType, ResultEntry,
    TerminalPayload,
};
pub use errors::{ChatStreamError, ClassifyError, Result, TransportError};
pub use session::{FAILURE_MESSAGE, SessionOutcome, SessionPhase};
pub use store::{EntryHandle, ResultStore, StoreEvent};
pub use transport::{QuestionTransport, UnitStream};
