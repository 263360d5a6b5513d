//! Failure pipeline: interceptors deciding what happens to a processing error.
//!
//! The terminal step turns the error into a [`JobFailure`]. Interceptors may
//! return `Ok(())` to suppress it, replace the error before passing the
//! request on, push the message back to a queue, or simply delegate.

use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, ready};
use queue_core::Message;

use super::{MiddlewareDeclaration, MiddlewareFactory};
use crate::error::{JobFailure, MiddlewareError, ProcessError};
use crate::queue::Queue;

pub type FailureResult = Result<(), JobFailure>;

pub type FailureFuture = BoxFuture<'static, FailureResult>;

/// A processing error together with the message and queue it happened on.
#[derive(Clone)]
pub struct FailureRequest {
    pub message: Arc<Message>,
    pub queue: Arc<dyn Queue>,
    pub error: ProcessError,
}

impl FailureRequest {
    pub fn new(message: Arc<Message>, queue: Arc<dyn Queue>, error: ProcessError) -> Self {
        Self {
            message,
            queue,
            error,
        }
    }

    /// Replace the error, keeping message and queue.
    pub fn with_error(self, error: ProcessError) -> Self {
        Self { error, ..self }
    }
}

impl std::fmt::Debug for FailureRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureRequest")
            .field("message", &self.message)
            .field("queue", &self.queue.name())
            .field("error", &self.error)
            .finish()
    }
}

/// Interceptor wrapped around the rest of the failure pipeline.
pub trait FailureMiddleware: Send + Sync + 'static {
    fn process(&self, request: FailureRequest, next: FailureNext) -> FailureFuture;
}

/// The remainder of a failure pipeline. Consumed when run, so the terminal
/// step runs at most once.
pub struct FailureNext {
    chain: Arc<[Arc<dyn FailureMiddleware>]>,
    index: usize,
}

impl FailureNext {
    pub fn run(self, request: FailureRequest) -> FailureFuture {
        match self.chain.get(self.index).cloned() {
            Some(middleware) => {
                let next = FailureNext {
                    index: self.index + 1,
                    ..self
                };
                middleware.process(request, next)
            }
            None => ready(Err(JobFailure::new(request.message, request.error))).boxed(),
        }
    }
}

/// Adapter turning an async closure into a [`FailureMiddleware`].
pub struct FailureFn<F> {
    f: F,
}

pub fn failure_fn<F, Fut>(f: F) -> FailureFn<F>
where
    F: Fn(FailureRequest, FailureNext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FailureResult> + Send + 'static,
{
    FailureFn { f }
}

impl<F, Fut> FailureMiddleware for FailureFn<F>
where
    F: Fn(FailureRequest, FailureNext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FailureResult> + Send + 'static,
{
    fn process(&self, request: FailureRequest, next: FailureNext) -> FailureFuture {
        Box::pin((self.f)(request, next))
    }
}

/// Ordered failure interceptors, outermost first. May be empty, in which
/// case every error becomes a [`JobFailure`].
#[derive(Clone, Default)]
pub struct FailurePipeline {
    middlewares: Arc<[Arc<dyn FailureMiddleware>]>,
}

impl FailurePipeline {
    pub fn new(
        factory: &MiddlewareFactory<dyn FailureMiddleware>,
        declarations: &[MiddlewareDeclaration<dyn FailureMiddleware>],
    ) -> Result<Self, MiddlewareError> {
        Ok(Self {
            middlewares: factory.create_all(declarations)?.into(),
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub fn execute(&self, request: FailureRequest) -> FailureFuture {
        FailureNext {
            chain: self.middlewares.clone(),
            index: 0,
        }
        .run(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::queue::InMemoryQueue;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(error: &str) -> FailureRequest {
        FailureRequest::new(
            Arc::new(Message::new("simple", json!(["test-data"]))),
            Arc::new(InMemoryQueue::new("test")),
            HandlerError::msg(error).into(),
        )
    }

    fn pipeline(middlewares: Vec<Arc<dyn FailureMiddleware>>) -> FailurePipeline {
        let declarations: Vec<_> = middlewares
            .into_iter()
            .map(MiddlewareDeclaration::inline)
            .collect();
        FailurePipeline::new(&MiddlewareFactory::inline_only(), &declarations).unwrap()
    }

    #[tokio::test]
    async fn empty_pipeline_reraises_as_job_failure() {
        let failure = FailurePipeline::empty()
            .execute(request("Test exception."))
            .await
            .unwrap_err();

        assert_eq!(failure.cause().to_string(), "Test exception.");
        assert_eq!(failure.queue_message().data, json!(["test-data"]));
    }

    #[tokio::test]
    async fn interceptor_can_suppress() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let swallow: Arc<dyn FailureMiddleware> = Arc::new(failure_fn(move |_request, _next| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        }));

        pipeline(vec![swallow]).execute(request("boom")).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn interceptor_can_transform_error() {
        let rename: Arc<dyn FailureMiddleware> =
            Arc::new(failure_fn(|request: FailureRequest, next: FailureNext| {
                let error = HandlerError::msg(format!("wrapped: {}", request.error));
                next.run(request.with_error(error.into()))
            }));

        let failure = pipeline(vec![rename])
            .execute(request("boom"))
            .await
            .unwrap_err();
        assert_eq!(failure.cause().to_string(), "wrapped: boom");
    }

    #[tokio::test]
    async fn pass_through_reaches_terminal_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let make = |calls: Arc<AtomicUsize>| -> Arc<dyn FailureMiddleware> {
            Arc::new(failure_fn(move |request, next: FailureNext| {
                calls.fetch_add(1, Ordering::SeqCst);
                next.run(request)
            }))
        };

        let result = pipeline(vec![make(calls.clone()), make(calls.clone())])
            .execute(request("boom"))
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
