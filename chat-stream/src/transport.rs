//! The seam between the controller and whatever delivers stream units.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{entry::QuestionType, errors::TransportError};

/// Raw units of one question stream, in delivery order.
///
/// The stream ends on connection close; an `Err` item ends it too.
pub type UnitStream = BoxStream<'static, Result<String, TransportError>>;

/// Opens server-push streams for questions.
///
/// Dropping the returned stream must release the underlying connection.
#[async_trait]
pub trait QuestionTransport: Send + Sync + 'static {
    async fn open(
        &self,
        question: &str,
        question_type: &QuestionType,
    ) -> Result<UnitStream, TransportError>;
}
