//! Interceptor pipelines wrapped around message processing.
//!
//! - [`ConsumePipeline`] wraps handler invocation on the happy path
//! - [`FailurePipeline`] decides what happens to an error raised there
//!
//! Both are built from [`MiddlewareDeclaration`]s through a
//! [`MiddlewareFactory`]; declarations are resolved once, when the pipeline
//! is built.

mod consume;
mod failure;
mod send_again;

use std::sync::Arc;

use crate::error::MiddlewareError;
use crate::resolver::{Container, Resolver};

pub use consume::{
    ConsumeFn, ConsumeFuture, ConsumeMiddleware, ConsumeNext, ConsumePipeline, ConsumeResult,
    ConsumeTerminal, consume_fn,
};
pub use failure::{
    FailureFn, FailureFuture, FailureMiddleware, FailureNext, FailurePipeline, FailureRequest,
    FailureResult, failure_fn,
};
pub use send_again::SendAgainMiddleware;

/// Name of the single entry point every interceptor exposes.
pub const MIDDLEWARE_METHOD: &str = "process";

/// How an interceptor was declared.
pub enum MiddlewareDeclaration<M: ?Sized> {
    /// A ready interceptor.
    Inline(Arc<M>),
    /// An interceptor type, resolved through the factory.
    Type(String),
    /// An interceptor type plus method; the method must be
    /// [`MIDDLEWARE_METHOD`].
    TypeMethod { type_ref: String, method: String },
}

impl<M: ?Sized> MiddlewareDeclaration<M> {
    pub fn inline(middleware: Arc<M>) -> Self {
        MiddlewareDeclaration::Inline(middleware)
    }

    pub fn of_type(type_ref: impl Into<String>) -> Self {
        MiddlewareDeclaration::Type(type_ref.into())
    }

    pub fn type_method(type_ref: impl Into<String>, method: impl Into<String>) -> Self {
        MiddlewareDeclaration::TypeMethod {
            type_ref: type_ref.into(),
            method: method.into(),
        }
    }
}

impl<M: ?Sized> Clone for MiddlewareDeclaration<M> {
    fn clone(&self) -> Self {
        match self {
            MiddlewareDeclaration::Inline(m) => MiddlewareDeclaration::Inline(m.clone()),
            MiddlewareDeclaration::Type(t) => MiddlewareDeclaration::Type(t.clone()),
            MiddlewareDeclaration::TypeMethod { type_ref, method } => {
                MiddlewareDeclaration::TypeMethod {
                    type_ref: type_ref.clone(),
                    method: method.clone(),
                }
            }
        }
    }
}

impl<M: ?Sized> std::fmt::Display for MiddlewareDeclaration<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MiddlewareDeclaration::Inline(_) => f.write_str("inline middleware"),
            MiddlewareDeclaration::Type(type_ref) => f.write_str(type_ref),
            MiddlewareDeclaration::TypeMethod { type_ref, method } => {
                write!(f, "{type_ref}::{method}")
            }
        }
    }
}

impl<M: ?Sized> std::fmt::Debug for MiddlewareDeclaration<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MiddlewareDeclaration({self})")
    }
}

/// Turns declarations into interceptor instances.
pub struct MiddlewareFactory<M: ?Sized> {
    resolver: Arc<dyn Resolver<M>>,
}

impl<M: ?Sized + Send + Sync + 'static> MiddlewareFactory<M> {
    pub fn new(resolver: Arc<dyn Resolver<M>>) -> Self {
        Self { resolver }
    }

    /// A factory that only accepts inline declarations.
    pub fn inline_only() -> Self {
        Self::new(Arc::new(Container::<M>::new()))
    }

    pub fn create(&self, declaration: &MiddlewareDeclaration<M>) -> Result<Arc<M>, MiddlewareError> {
        let type_ref = match declaration {
            MiddlewareDeclaration::Inline(middleware) => return Ok(middleware.clone()),
            MiddlewareDeclaration::Type(type_ref) => type_ref,
            MiddlewareDeclaration::TypeMethod { type_ref, method } => {
                if method != MIDDLEWARE_METHOD {
                    return Err(invalid(
                        declaration,
                        format!("interceptors only expose `{MIDDLEWARE_METHOD}`, not `{method}`"),
                    ));
                }
                type_ref
            }
        };

        self.resolver
            .get(type_ref)
            .map_err(|e| invalid(declaration, e.to_string()))
    }

    /// Resolve a whole declaration list, keeping its order.
    pub fn create_all(
        &self,
        declarations: &[MiddlewareDeclaration<M>],
    ) -> Result<Vec<Arc<M>>, MiddlewareError> {
        declarations.iter().map(|d| self.create(d)).collect()
    }
}

fn invalid<M: ?Sized>(declaration: &MiddlewareDeclaration<M>, reason: String) -> MiddlewareError {
    MiddlewareError::InvalidDefinition {
        declaration: declaration.to_string(),
        reason,
    }
}
