#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use queue_core::Message;
use queue_worker::{
    Container, ConsumePipeline, FailurePipeline, HandlerDeclaration, HandlerError, HandlerFuture,
    HandlerRegistry, HandlerService, MemoryLogger, Worker, type_ref,
};

/// Handler service recording every message it is called with.
#[derive(Default)]
pub struct FakeHandler {
    processed: Mutex<Vec<Arc<Message>>>,
}

impl FakeHandler {
    pub fn processed(&self) -> Vec<Arc<Message>> {
        self.processed.lock().unwrap().clone()
    }
}

impl HandlerService for FakeHandler {
    fn responds_to(&self, method: &str) -> bool {
        matches!(
            method,
            "execute" | "static_execute" | "execute_with_exception" | "execute_slowly"
        )
    }

    fn call(&self, method: &str, message: Arc<Message>) -> HandlerFuture {
        match method {
            "execute" | "static_execute" => {
                self.processed.lock().unwrap().push(message);
                Box::pin(async { Ok(()) })
            }
            "execute_with_exception" => {
                Box::pin(async { Err(HandlerError::msg("Test exception.")) })
            }
            "execute_slowly" => Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }),
            other => {
                let err = HandlerError::msg(format!("unknown method {other}"));
                Box::pin(async move { Err(err) })
            }
        }
    }
}

/// Resolver holding a single `FakeHandler` under `reference`.
pub fn container_with(reference: &str, handler: Arc<FakeHandler>) -> Container<dyn HandlerService> {
    Container::<dyn HandlerService>::new().with(reference, handler)
}

pub fn fake_container(handler: Arc<FakeHandler>) -> Container<dyn HandlerService> {
    container_with(type_ref::<FakeHandler>(), handler)
}

/// Build a worker with empty pipelines.
pub fn create_worker(
    handlers: Vec<(&str, HandlerDeclaration)>,
    logger: Arc<MemoryLogger>,
    container: Container<dyn HandlerService>,
) -> Worker {
    create_worker_with_failure(handlers, logger, container, FailurePipeline::empty())
}

pub fn create_worker_with_failure(
    handlers: Vec<(&str, HandlerDeclaration)>,
    logger: Arc<MemoryLogger>,
    container: Container<dyn HandlerService>,
    failure: FailurePipeline,
) -> Worker {
    let registry = handlers.into_iter().fold(
        HandlerRegistry::new(Arc::new(container), logger.clone()),
        |registry, (name, declaration)| registry.with(name, declaration),
    );
    Worker::new(registry, logger, ConsumePipeline::empty(), failure)
}
