//! The worker: runs one message through the consume and failure pipelines.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use queue_core::Message;

use crate::config::WorkerConfig;
use crate::error::{HandlerError, JobFailure, ProcessError};
use crate::handler::HandlerRegistry;
use crate::logger::{Level, Logger};
use crate::middleware::{
    ConsumeFuture, ConsumePipeline, ConsumeTerminal, FailurePipeline, FailureRequest,
};
use crate::queue::Queue;

/// Processes messages handed over by a queue transport.
///
/// A worker keeps no per-message state, so one instance can be shared; the
/// transport decides how many messages it feeds in at once.
pub struct Worker {
    handlers: Arc<HandlerRegistry>,
    logger: Arc<dyn Logger>,
    consume: ConsumePipeline,
    failure: FailurePipeline,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(
        handlers: HandlerRegistry,
        logger: Arc<dyn Logger>,
        consume: ConsumePipeline,
        failure: FailurePipeline,
    ) -> Self {
        Self {
            handlers: Arc::new(handlers),
            logger,
            consume,
            failure,
            config: WorkerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Process a single message.
    ///
    /// Any error from handler resolution or execution goes through the
    /// failure pipeline; a [`JobFailure`] is returned only if that pipeline
    /// does not suppress it. Acknowledging the message is left to the
    /// transport.
    pub async fn process(
        &self,
        message: Arc<Message>,
        queue: Arc<dyn Queue>,
    ) -> Result<(), JobFailure> {
        let id = message.display_id();
        self.logger.log(
            Level::INFO,
            "Processing message #{message}.",
            &[("message", id.clone())],
        );

        let result = self
            .consume
            .execute(message.clone(), queue.clone(), self.terminal())
            .await;
        let Err(error) = result else {
            return Ok(());
        };

        self.logger.log(
            Level::ERROR,
            "Processing of message #{message} is stopped because of an exception:\n{exception}",
            &[("message", id), ("exception", error.to_string())],
        );

        self.failure
            .execute(FailureRequest::new(message, queue, error))
            .await
    }

    /// Resolve the message's handler and run it, bounded by the configured
    /// timeout.
    fn terminal(&self) -> ConsumeTerminal {
        let handlers = self.handlers.clone();
        let timeout = self.config.handler_timeout();

        Arc::new(move |message: Arc<Message>| -> ConsumeFuture {
            let handlers = handlers.clone();
            Box::pin(async move {
                let handler = handlers.resolve(&message.handler_name)?;
                let run = async move {
                    let run = std::panic::catch_unwind(AssertUnwindSafe(|| handler.handle(message)))
                        .map_err(panicked)?;
                    AssertUnwindSafe(run)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|payload| Err(panicked(payload)))
                };
                let outcome = match timeout {
                    Some(limit) => tokio::time::timeout(limit, run).await.unwrap_or_else(|_| {
                        Err(HandlerError::msg(format!(
                            "Handler timed out after {}s",
                            limit.as_secs()
                        )))
                    }),
                    None => run.await,
                };
                outcome.map_err(ProcessError::from)
            })
        })
    }
}

/// Turn a panic payload from a handler into an ordinary handler error.
fn panicked(payload: Box<dyn Any + Send>) -> HandlerError {
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    HandlerError::msg(format!("Handler panicked: {reason}"))
}
