//! Consume pipeline: interceptors around handler invocation.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use queue_core::Message;

use super::{MiddlewareDeclaration, MiddlewareFactory};
use crate::error::{MiddlewareError, ProcessError};
use crate::queue::Queue;

pub type ConsumeResult = Result<(), ProcessError>;

pub type ConsumeFuture = BoxFuture<'static, ConsumeResult>;

/// Innermost step of the consume pipeline.
pub type ConsumeTerminal = Arc<dyn Fn(Arc<Message>) -> ConsumeFuture + Send + Sync>;

/// Interceptor wrapped around the rest of the consume pipeline.
///
/// Call `next.run(..)` to continue; returning without calling it skips the
/// remaining interceptors and the handler.
pub trait ConsumeMiddleware: Send + Sync + 'static {
    fn process(&self, message: Arc<Message>, queue: Arc<dyn Queue>, next: ConsumeNext)
    -> ConsumeFuture;
}

/// The remainder of a consume pipeline. Consumed when run.
pub struct ConsumeNext {
    chain: Arc<[Arc<dyn ConsumeMiddleware>]>,
    index: usize,
    terminal: ConsumeTerminal,
}

impl ConsumeNext {
    pub fn run(self, message: Arc<Message>, queue: Arc<dyn Queue>) -> ConsumeFuture {
        match self.chain.get(self.index).cloned() {
            Some(middleware) => {
                let next = ConsumeNext {
                    index: self.index + 1,
                    ..self
                };
                middleware.process(message, queue, next)
            }
            None => (self.terminal)(message),
        }
    }
}

/// Adapter turning an async closure into a [`ConsumeMiddleware`].
pub struct ConsumeFn<F> {
    f: F,
}

pub fn consume_fn<F, Fut>(f: F) -> ConsumeFn<F>
where
    F: Fn(Arc<Message>, Arc<dyn Queue>, ConsumeNext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ConsumeResult> + Send + 'static,
{
    ConsumeFn { f }
}

impl<F, Fut> ConsumeMiddleware for ConsumeFn<F>
where
    F: Fn(Arc<Message>, Arc<dyn Queue>, ConsumeNext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ConsumeResult> + Send + 'static,
{
    fn process(
        &self,
        message: Arc<Message>,
        queue: Arc<dyn Queue>,
        next: ConsumeNext,
    ) -> ConsumeFuture {
        Box::pin((self.f)(message, queue, next))
    }
}

/// Ordered interceptors, outermost first.
#[derive(Clone, Default)]
pub struct ConsumePipeline {
    middlewares: Arc<[Arc<dyn ConsumeMiddleware>]>,
}

impl ConsumePipeline {
    pub fn new(
        factory: &MiddlewareFactory<dyn ConsumeMiddleware>,
        declarations: &[MiddlewareDeclaration<dyn ConsumeMiddleware>],
    ) -> Result<Self, MiddlewareError> {
        Ok(Self {
            middlewares: factory.create_all(declarations)?.into(),
        })
    }

    /// A pipeline that goes straight to the terminal step.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub fn execute(
        &self,
        message: Arc<Message>,
        queue: Arc<dyn Queue>,
        terminal: ConsumeTerminal,
    ) -> ConsumeFuture {
        ConsumeNext {
            chain: self.middlewares.clone(),
            index: 0,
            terminal,
        }
        .run(message, queue)
    }
}
