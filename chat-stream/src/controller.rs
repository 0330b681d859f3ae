//! Question Submission Controller.
//!
//! `submit` appends a pending entry, then spawns one [`StreamSession`] for it
//! and returns immediately. Sessions never wait on or touch each other; the
//! only shared state is the [`ResultStore`], written by index.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{info, instrument};

use crate::{
    directive::parse_question,
    entry::{Feedback, QuestionType, ResultEntry},
    errors::{ChatStreamError, Result},
    session::{SessionOutcome, StreamSession},
    store::{EntryHandle, ResultStore},
    transport::QuestionTransport,
};

/// Caller's grip on one in-flight question.
///
/// Dropping it detaches the session; it keeps streaming into the store.
#[derive(Debug)]
pub struct Submission {
    handle: EntryHandle,
    cancel: CancellationToken,
    task: JoinHandle<SessionOutcome>,
}

impl Submission {
    /// Index of the entry this question streams into.
    pub fn index(&self) -> usize {
        self.handle.index()
    }

    /// Stops the session; no further writes reach the entry.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the session to end.
    pub async fn outcome(self) -> SessionOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            // Aborted at runtime shutdown.
            Err(_) => SessionOutcome::Cancelled,
        }
    }
}

/// Orchestrates question submission against a transport.
pub struct QuestionController<T: QuestionTransport + ?Sized> {
    store: Arc<ResultStore>,
    transport: Arc<T>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl<T: QuestionTransport + ?Sized> QuestionController<T> {
    pub fn new(store: Arc<ResultStore>, transport: Arc<T>) -> Self {
        Self {
            store,
            transport,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// The store this controller writes to.
    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Submits a question.
    ///
    /// A leading `/sql`, `/data`, `/metadata` or `/schema` directive is
    /// stripped and overrides `declared_type`.
    ///
    /// # Errors
    /// [`ChatStreamError::EmptyQuestion`] if nothing is left to ask; no entry
    /// is appended in that case.
    #[instrument(skip_all, fields(declared = %declared_type))]
    pub async fn submit(&self, input: &str, declared_type: QuestionType) -> Result<Submission> {
        let parsed = parse_question(input);
        if parsed.text.is_empty() {
            return Err(ChatStreamError::EmptyQuestion);
        }
        let effective = parsed.forced_type.unwrap_or(declared_type);

        let handle = self
            .store
            .append(ResultEntry::pending(parsed.text.clone(), effective.clone()))
            .await;
        info!(index = handle.index(), question_type = %effective, "question submitted");

        let cancel = self.shutdown.child_token();
        let session = StreamSession::new(self.store.clone(), handle);
        let task = self.tracker.spawn(session.run(
            self.transport.clone(),
            parsed.text,
            effective,
            cancel.clone(),
        ));

        Ok(Submission {
            handle,
            cancel,
            task,
        })
    }

    /// Asks a follow-up suggested by the entry at `source_index`.
    ///
    /// The follow-up inherits `data`/`metadata` from its source; anything
    /// else falls back to `default`.
    ///
    /// # Errors
    /// [`ChatStreamError::UnknownEntry`] if `source_index` is not in the store.
    pub async fn ask_related(&self, source_index: usize, question: &str) -> Result<Submission> {
        let source = self
            .store
            .at(source_index)
            .await
            .ok_or(ChatStreamError::UnknownEntry(source_index))?;
        let kind = if source.question_type.carries_to_follow_up() {
            source.question_type
        } else {
            QuestionType::Default
        };
        self.submit(question, kind).await
    }

    /// Stores feedback on the entry whose answer carries `uuid`.
    ///
    /// Returns the entry index, or `None` if no entry matches (e.g. cleared).
    pub async fn record_feedback(
        &self,
        uuid: &str,
        value: impl Into<String>,
        details: Option<String>,
    ) -> Option<usize> {
        let feedback = Feedback {
            value: value.into(),
            details,
        };
        self.store
            .update_where(|e| e.uuid() == Some(uuid), move |e| e.feedback = Some(feedback))
            .await
    }

    /// Empties the local conversation; open sessions become no-ops.
    pub async fn clear(&self) {
        self.store.clear().await;
    }

    /// Number of sessions still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Cancels every session and waits until all have released their stream.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
