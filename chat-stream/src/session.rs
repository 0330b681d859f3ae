//! Live decode/apply state for one in-flight question.
//!
//! A session owns its target handle and phase, pulls units one at a time,
//! classifies them and writes the result into the store. It is the only
//! writer of its entry (apart from a store-wide clear).

use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    classifier::{StreamMessage, classify},
    entry::{AnswerDetails, EntryState, QuestionType},
    errors::TransportError,
    store::{EntryHandle, ResultStore},
    transport::QuestionTransport,
};

/// Text stored in place of the answer when a stream fails.
pub const FAILURE_MESSAGE: &str = "An error occurred while processing the question.";

/// Lifecycle position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Entry appended, stream not yet open.
    Pending,
    /// Receiving text deltas.
    StreamingText,
    /// `<STREAMOFF>` seen; waiting for the terminal payload.
    TerminalArmed,
    Resolved,
    Failed,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Terminal payload applied.
    Resolved,
    /// Transport failure or early close; entry carries [`FAILURE_MESSAGE`].
    Failed(String),
    /// Cancelled by the caller; the entry was left as it was.
    Cancelled,
    /// The entry was cleared from the store while streaming.
    Detached,
}

/// Result of applying one unit.
enum Step {
    Continue,
    Resolved,
    Detached,
}

pub(crate) struct StreamSession {
    store: Arc<ResultStore>,
    handle: EntryHandle,
    phase: SessionPhase,
}

impl StreamSession {
    pub(crate) fn new(store: Arc<ResultStore>, handle: EntryHandle) -> Self {
        Self {
            store,
            handle,
            phase: SessionPhase::Pending,
        }
    }

    /// Opens the stream and consumes it until resolution, failure,
    /// cancellation or detachment. Dropping the stream on return releases
    /// the transport.
    #[instrument(
        name = "stream_session",
        skip_all,
        fields(index = self.handle.index(), question_type = %question_type)
    )]
    pub(crate) async fn run<T>(
        mut self,
        transport: Arc<T>,
        question: String,
        question_type: QuestionType,
        cancel: CancellationToken,
    ) -> SessionOutcome
    where
        T: QuestionTransport + ?Sized,
    {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.cancelled(),
            opened = transport.open(&question, &question_type) => opened,
        };
        let mut units = match opened {
            Ok(units) => units,
            Err(err) => return self.fail(err).await,
        };
        self.phase = SessionPhase::StreamingText;
        debug!("question stream opened");

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(),
                next = units.next() => next,
            };
            let unit = match next {
                Some(Ok(unit)) => unit,
                Some(Err(err)) => return self.fail(err).await,
                None => return self.fail(TransportError::ClosedEarly).await,
            };

            // Buffered units must not land after a cancel that raced them.
            if cancel.is_cancelled() {
                return self.cancelled();
            }

            match self.apply(&unit).await {
                Step::Continue => {}
                Step::Resolved => {
                    info!("answer resolved");
                    return SessionOutcome::Resolved;
                }
                Step::Detached => {
                    info!("entry cleared while streaming, closing stream");
                    return SessionOutcome::Detached;
                }
            }
        }
    }

    async fn apply(&mut self, unit: &str) -> Step {
        let armed = self.phase == SessionPhase::TerminalArmed;
        let message = match classify(unit, armed) {
            Ok(m) => m,
            Err(err) => {
                warn!(error = %err, "dropping unusable terminal payload");
                return Step::Continue;
            }
        };

        match message {
            StreamMessage::ControlTag(kind) => {
                if armed {
                    debug!(%kind, "control tag after <STREAMOFF> ignored");
                    return Step::Continue;
                }
                debug!(%kind, "question re-typed");
                self.write(move |e| e.question_type = kind).await
            }
            StreamMessage::TerminalMarker => {
                if !armed {
                    debug!("terminal payload armed");
                    self.phase = SessionPhase::TerminalArmed;
                }
                Step::Continue
            }
            StreamMessage::TextDelta(text) => {
                self.write(move |e| e.result.push_str(&text)).await
            }
            StreamMessage::TerminalPayload(payload) => {
                let details = AnswerDetails::from(*payload);
                match self
                    .write(move |e| e.state = EntryState::Resolved(Box::new(details)))
                    .await
                {
                    Step::Continue => {
                        self.phase = SessionPhase::Resolved;
                        Step::Resolved
                    }
                    other => other,
                }
            }
        }
    }

    async fn write<F>(&self, mutation: F) -> Step
    where
        F: FnOnce(&mut crate::entry::ResultEntry),
    {
        if self.store.update_at(self.handle, mutation).await {
            Step::Continue
        } else {
            Step::Detached
        }
    }

    async fn fail(mut self, err: TransportError) -> SessionOutcome {
        error!(error = %err, phase = ?self.phase, "question stream failed");
        self.phase = SessionPhase::Failed;
        // Partial text is replaced, not kept.
        let applied = self
            .store
            .update_at(self.handle, |e| {
                e.state = EntryState::Failed;
                e.result = FAILURE_MESSAGE.to_string();
            })
            .await;
        if applied {
            SessionOutcome::Failed(err.to_string())
        } else {
            SessionOutcome::Detached
        }
    }

    fn cancelled(self) -> SessionOutcome {
        info!(phase = ?self.phase, "question stream cancelled");
        SessionOutcome::Cancelled
    }
}
