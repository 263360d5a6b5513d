//! Message dispatch for queue workers.
//!
//! Given a dequeued [`Message`](queue_core::Message), the [`Worker`] resolves
//! its handler, runs it through the consume pipeline and, when anything fails,
//! lets the failure pipeline decide whether the error is absorbed or surfaced
//! as a [`JobFailure`].
//!
//! # Architecture
//!
//! - `HandlerRegistry` - Maps handler names to inline handlers or resolvable services
//! - `ConsumePipeline` - Interceptors around handler invocation
//! - `FailurePipeline` - Interceptors deciding the fate of an error
//! - `Worker` - Ties the above together for one message at a time
//! - `WorkerActor` - Ractor host draining an in-memory queue
//!
//! # Usage
//!
//! ```ignore
//! use queue_worker::{HandlerDeclaration, HandlerRegistry, Worker};
//!
//! let handlers = HandlerRegistry::new(resolver, logger.clone())
//!     .with("send-mail", HandlerDeclaration::service::<Mailer>());
//! let worker = Worker::new(handlers, logger, ConsumePipeline::empty(), FailurePipeline::empty());
//!
//! worker.process(Arc::new(message), queue).await?;
//! ```

mod config;
mod error;
mod handler;
mod logger;
mod messages;
pub mod middleware;
mod queue;
mod resolver;
mod worker;
mod worker_actor;

pub use config::WorkerConfig;
pub use error::{HandlerError, JobFailure, MiddlewareError, ProcessError, QueueError};
pub use handler::{
    DEFAULT_METHOD, FnHandler, Handler, HandlerDeclaration, HandlerFuture, HandlerRegistry,
    HandlerResult, HandlerService,
};
pub use logger::{Level, LogEntry, Logger, MemoryLogger, TracingLogger, render};
pub use messages::{DrainReport, WorkerMessage};
pub use middleware::{
    ConsumeMiddleware, ConsumeNext, ConsumePipeline, FailureMiddleware, FailureNext,
    FailurePipeline, FailureRequest, MiddlewareDeclaration, MiddlewareFactory,
    SendAgainMiddleware,
};
pub use queue::{InMemoryQueue, Queue, QueueFuture};
pub use resolver::{Container, ResolveError, Resolver, type_ref};
pub use worker::Worker;
pub use worker_actor::{WorkerActor, WorkerArgs, spawn_worker};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort};
