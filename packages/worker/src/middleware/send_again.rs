//! Failure interceptor that pushes a failed message back to a queue.

use std::sync::Arc;

use serde_json::Value;

use super::failure::{FailureFuture, FailureMiddleware, FailureNext, FailureRequest};
use crate::error::{HandlerError, ProcessError};
use crate::queue::Queue;

const ATTEMPTS_META_PREFIX: &str = "failure-strategy-resend-attempts-";

/// Sends a failed message again, up to `max_attempts` times.
///
/// The attempt count lives in the message metadata under a key derived from
/// `id`, so several instances can be stacked in one pipeline. Once the limit
/// is reached the failure is passed on untouched.
pub struct SendAgainMiddleware {
    id: String,
    max_attempts: u32,
    queue: Option<Arc<dyn Queue>>,
}

impl SendAgainMiddleware {
    pub fn new(id: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            id: id.into(),
            max_attempts,
            queue: None,
        }
    }

    /// Push to `queue` instead of the queue the message came from.
    pub fn with_queue(mut self, queue: Arc<dyn Queue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn meta_key(&self) -> String {
        format!("{ATTEMPTS_META_PREFIX}{}", self.id)
    }

    /// Attempts already made for `message`.
    pub fn attempts(&self, message: &queue_core::Message) -> u32 {
        message
            .metadata
            .get(&self.meta_key())
            .and_then(Value::as_u64)
            .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
    }
}

impl FailureMiddleware for SendAgainMiddleware {
    fn process(&self, request: FailureRequest, next: FailureNext) -> FailureFuture {
        let attempts = self.attempts(&request.message);
        if attempts >= self.max_attempts {
            return next.run(request);
        }

        let mut retry = (*request.message).clone();
        retry.id = None;
        retry.status = None;
        retry.metadata.insert(self.meta_key(), Value::from(attempts + 1));

        let queue = self.queue.clone().unwrap_or_else(|| request.queue.clone());
        Box::pin(async move {
            match queue.push(retry).await {
                Ok(pushed) => {
                    tracing::debug!(
                        "Message {} sent again to {} (attempt {})",
                        pushed.display_id(),
                        queue.name(),
                        attempts + 1
                    );
                    Ok(())
                }
                Err(e) => {
                    let error = ProcessError::from(HandlerError::new(e));
                    next.run(request.with_error(error)).await
                }
            }
        })
    }
}
