//! Handler declarations and the registry that resolves them.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use queue_core::Message;

use crate::error::{HandlerError, ProcessError};
use crate::logger::{Level, Logger};
use crate::resolver::{Resolver, type_ref};

/// Method invoked when a declaration names only a type.
pub const DEFAULT_METHOD: &str = "execute";

/// Result type for job handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Future type for async job handlers.
pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

/// Something that can process a message.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, message: Arc<Message>) -> HandlerFuture;
}

/// A simple function-based job handler.
pub struct FnHandler<F> {
    handler: F,
}

impl<F> FnHandler<F> {
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Arc<Message>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, message: Arc<Message>) -> HandlerFuture {
        Box::pin((self.handler)(message))
    }
}

/// A resolvable service exposing named handler methods.
pub trait HandlerService: Send + Sync + 'static {
    /// Whether the service has a method called `method`.
    fn responds_to(&self, method: &str) -> bool;

    /// Invoke `method` with the message.
    fn call(&self, method: &str, message: Arc<Message>) -> HandlerFuture;
}

/// A service method bound into a [`Handler`].
struct BoundMethod {
    service: Arc<dyn HandlerService>,
    method: String,
}

impl Handler for BoundMethod {
    fn handle(&self, message: Arc<Message>) -> HandlerFuture {
        self.service.call(&self.method, message)
    }
}

/// How a handler was declared.
#[derive(Clone)]
pub enum HandlerDeclaration {
    /// A ready handler, returned as is.
    Inline(Arc<dyn Handler>),
    /// A service type plus the method to call on it.
    TypeMethod { type_ref: String, method: String },
    /// A service type; [`DEFAULT_METHOD`] is called on it.
    Type(String),
}

impl HandlerDeclaration {
    /// Declare a handler from an async closure.
    pub fn inline<F, Fut>(handler: F) -> Self
    where
        F: Fn(Arc<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        HandlerDeclaration::Inline(Arc::new(FnHandler::new(handler)))
    }

    pub fn type_method(type_ref: impl Into<String>, method: impl Into<String>) -> Self {
        HandlerDeclaration::TypeMethod {
            type_ref: type_ref.into(),
            method: method.into(),
        }
    }

    pub fn of_type(type_ref: impl Into<String>) -> Self {
        HandlerDeclaration::Type(type_ref.into())
    }

    /// Declare `S` by its conventional type reference.
    pub fn service<S: HandlerService>() -> Self {
        Self::of_type(type_ref::<S>())
    }

    /// Declare a method of `S` by its conventional type reference.
    pub fn service_method<S: HandlerService>(method: impl Into<String>) -> Self {
        Self::type_method(type_ref::<S>(), method)
    }
}

impl std::fmt::Debug for HandlerDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerDeclaration::Inline(_) => f.write_str("Inline(..)"),
            HandlerDeclaration::TypeMethod { type_ref, method } => {
                write!(f, "TypeMethod({type_ref}::{method})")
            }
            HandlerDeclaration::Type(type_ref) => write!(f, "Type({type_ref})"),
        }
    }
}

/// Maps handler names to declarations and resolves them on demand.
///
/// Declarations are registered at startup; afterwards the registry is only
/// read and may be shared between workers.
pub struct HandlerRegistry {
    declarations: HashMap<String, HandlerDeclaration>,
    resolver: Arc<dyn Resolver<dyn HandlerService>>,
    logger: Arc<dyn Logger>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new(resolver: Arc<dyn Resolver<dyn HandlerService>>, logger: Arc<dyn Logger>) -> Self {
        Self {
            declarations: HashMap::new(),
            resolver,
            logger,
        }
    }

    /// Register a handler under `name`. A later registration replaces an
    /// earlier one with the same name.
    pub fn register(&mut self, name: impl Into<String>, declaration: HandlerDeclaration) {
        self.declarations.insert(name.into(), declaration);
    }

    pub fn with(mut self, name: impl Into<String>, declaration: HandlerDeclaration) -> Self {
        self.register(name, declaration);
        self
    }

    /// Check if a handler is declared under `name`.
    pub fn has_handler(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// List all declared handler names.
    pub fn handler_names(&self) -> Vec<&str> {
        self.declarations.keys().map(|s| s.as_str()).collect()
    }

    /// Turn the declaration registered under `handler_name` into a handler.
    ///
    /// Every resolution failure is logged and reported as
    /// [`ProcessError::HandlerNotFound`] under the handler's name.
    pub fn resolve(&self, handler_name: &str) -> Result<Arc<dyn Handler>, ProcessError> {
        let declaration = self.declarations.get(handler_name).ok_or_else(|| {
            self.not_found(handler_name, "no handler is registered under this name")
        })?;

        let (type_ref, method) = match declaration {
            HandlerDeclaration::Inline(handler) => return Ok(handler.clone()),
            HandlerDeclaration::TypeMethod { type_ref, method } => (type_ref, method.as_str()),
            HandlerDeclaration::Type(type_ref) => (type_ref, DEFAULT_METHOD),
        };

        let service = self
            .resolver
            .get(type_ref)
            .map_err(|e| self.not_found(handler_name, &e.to_string()))?;

        if !service.responds_to(method) {
            return Err(self.not_found(
                handler_name,
                &format!("{type_ref} has no method {method}."),
            ));
        }

        Ok(Arc::new(BoundMethod {
            service,
            method: method.to_string(),
        }))
    }

    fn not_found(&self, handler_name: &str, reason: &str) -> ProcessError {
        self.logger.log(
            Level::ERROR,
            "Queue handler with name {handler} doesn't exist: {reason}",
            &[
                ("handler", handler_name.to_string()),
                ("reason", reason.to_string()),
            ],
        );
        ProcessError::HandlerNotFound {
            handler_name: handler_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use crate::resolver::Container;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl HandlerService for Recorder {
        fn responds_to(&self, method: &str) -> bool {
            matches!(method, "execute" | "archive")
        }

        fn call(&self, method: &str, _message: Arc<Message>) -> HandlerFuture {
            self.calls.lock().unwrap().push(method.to_string());
            Box::pin(async { Ok(()) })
        }
    }

    fn registry(recorder: Arc<Recorder>, logger: Arc<MemoryLogger>) -> HandlerRegistry {
        let container =
            Container::<dyn HandlerService>::new().with(type_ref::<Recorder>(), recorder);
        HandlerRegistry::new(Arc::new(container), logger)
    }

    fn message() -> Arc<Message> {
        Arc::new(Message::new("simple", json!(null)))
    }

    #[tokio::test]
    async fn bare_type_targets_default_method() {
        let recorder = Arc::new(Recorder::default());
        let registry = registry(recorder.clone(), Arc::new(MemoryLogger::new()))
            .with("plain", HandlerDeclaration::service::<Recorder>())
            .with("archive", HandlerDeclaration::service_method::<Recorder>("archive"));

        registry.resolve("plain").unwrap().handle(message()).await.unwrap();
        registry.resolve("archive").unwrap().handle(message()).await.unwrap();

        assert_eq!(*recorder.calls.lock().unwrap(), vec!["execute", "archive"]);
    }

    #[test]
    fn unknown_name_is_logged_and_reported() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = registry(Arc::new(Recorder::default()), logger.clone());

        let err = registry.resolve("missing").err().unwrap();
        assert!(err.is_handler_not_found());
        assert_eq!(err.to_string(), "Queue handler with name missing doesn't exist");

        let entries = logger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::ERROR);
        assert!(entries[0].message.contains("missing"));
    }

    #[test]
    fn handler_name_resembling_placeholder_is_logged_verbatim() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = registry(Arc::new(Recorder::default()), logger.clone());

        assert!(registry.resolve("{reason}").is_err());
        assert!(logger.messages()[0].starts_with("Queue handler with name {reason} doesn't exist"));
    }

    #[test]
    fn unresolvable_type_is_reported_under_handler_name() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = registry(Arc::new(Recorder::default()), logger.clone())
            .with("simple", HandlerDeclaration::type_method("UndefinedClass", "handle"));

        let err = registry.resolve("simple").err().unwrap();
        assert_eq!(err.to_string(), "Queue handler with name simple doesn't exist");
        assert!(logger.messages()[0].contains("UndefinedClass doesn't exist."));
    }

    #[test]
    fn missing_method_is_reported_under_handler_name() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = registry(Arc::new(Recorder::default()), logger.clone())
            .with("simple", HandlerDeclaration::service_method::<Recorder>("undefined_method"));

        let err = registry.resolve("simple").err().unwrap();
        assert!(err.is_handler_not_found());
        assert!(logger.messages()[0].contains("has no method undefined_method."));
    }
}
