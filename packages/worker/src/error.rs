//! Error types raised while dispatching a message.

use std::sync::Arc;

use queue_core::{Message, MessageId};
use thiserror::Error;

/// Failure raised by a handler or interceptor body.
///
/// The cause is opaque; only its text and source chain are kept.
#[derive(Debug, Clone)]
pub struct HandlerError {
    message: String,
    source: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HandlerError {
    /// Create an error from plain text.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an arbitrary error, keeping it as the source.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Error flowing out of the consume pipeline.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// The handler name is unknown, its service cannot be resolved, or the
    /// service lacks the declared method.
    #[error("Queue handler with name {handler_name} doesn't exist")]
    HandlerNotFound { handler_name: String },

    /// The handler (or an interceptor) failed while running.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl ProcessError {
    pub fn is_handler_not_found(&self) -> bool {
        matches!(self, ProcessError::HandlerNotFound { .. })
    }
}

/// Failure surfaced by the worker once the failure pipeline gives up.
///
/// Carries the original message so callers can inspect its payload.
#[derive(Debug, Clone, Error)]
#[error(
    "Processing of message #{} is stopped because of an exception:\n{cause}",
    .message.display_id()
)]
pub struct JobFailure {
    message: Arc<Message>,
    #[source]
    cause: ProcessError,
}

impl JobFailure {
    pub fn new(message: Arc<Message>, cause: ProcessError) -> Self {
        Self { message, cause }
    }

    /// The message whose processing failed.
    pub fn queue_message(&self) -> &Message {
        &self.message
    }

    pub fn cause(&self) -> &ProcessError {
        &self.cause
    }

    pub fn into_parts(self) -> (Arc<Message>, ProcessError) {
        (self.message, self.cause)
    }
}

/// Middleware declaration that cannot be turned into an interceptor.
#[derive(Debug, Clone, Error)]
pub enum MiddlewareError {
    #[error("Invalid middleware definition {declaration}: {reason}")]
    InvalidDefinition { declaration: String, reason: String },
}

/// Errors reported by queue transports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Message {0} not found")]
    NotFound(MessageId),

    #[error("Message rejected by queue {queue}: {reason}")]
    Rejected { queue: String, reason: String },
}
