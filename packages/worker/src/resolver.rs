//! Resolver capability for looking up services by type reference.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

/// A type reference that nothing is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{type_ref} doesn't exist.")]
    NotFound { type_ref: String },
}

/// Produces live instances for type references.
///
/// Used for handler services as well as interceptors.
pub trait Resolver<T: ?Sized>: Send + Sync + 'static {
    fn get(&self, type_ref: &str) -> Result<Arc<T>, ResolveError>;

    /// Check if an instance exists for a type reference.
    fn has(&self, type_ref: &str) -> bool {
        self.get(type_ref).is_ok()
    }
}

/// The conventional type reference for `S`: its full type name.
pub fn type_ref<S: ?Sized>() -> &'static str {
    std::any::type_name::<S>()
}

/// In-process resolver backed by a map.
///
/// Built once at startup, then only read.
pub struct Container<T: ?Sized> {
    services: HashMap<String, Arc<T>>,
}

impl<T: ?Sized> Container<T> {
    /// Create a new empty container.
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Register an instance under a type reference.
    pub fn with(mut self, type_ref: impl Into<String>, instance: Arc<T>) -> Self {
        self.insert(type_ref, instance);
        self
    }

    pub fn insert(&mut self, type_ref: impl Into<String>, instance: Arc<T>) {
        self.services.insert(type_ref.into(), instance);
    }

    pub fn contains(&self, type_ref: &str) -> bool {
        self.services.contains_key(type_ref)
    }

    /// List all registered type references.
    pub fn type_refs(&self) -> Vec<&str> {
        self.services.keys().map(|s| s.as_str()).collect()
    }
}

impl<T: ?Sized> Default for Container<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Resolver<T> for Container<T> {
    fn get(&self, type_ref: &str) -> Result<Arc<T>, ResolveError> {
        self.services
            .get(type_ref)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound {
                type_ref: type_ref.to_string(),
            })
    }
}
