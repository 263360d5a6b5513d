//! The queue message envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ulid::Ulid;

use crate::JobStatus;

/// Text used for a missing message id in logs and errors.
pub const NULL_ID: &str = "null";

/// Identifier assigned to a message by the queue transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new unique id, using ULID for chronological sorting.
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of work travelling through the queue.
///
/// Only the transport sets `id` and `status`; everything downstream treats a
/// message as read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Name of the handler that processes this message.
    pub handler_name: String,
    /// Handler payload.
    pub data: Value,
    /// Transport id, absent before the message is pushed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    /// Lifecycle status, if the transport tracks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    /// Free-form metadata owned by transports and middleware.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Message {
    pub fn new(handler_name: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            handler_name: handler_name.into(),
            data: data.into(),
            id: None,
            status: None,
            metadata: Map::new(),
        }
    }

    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The id as shown in logs, `null` when absent.
    pub fn display_id(&self) -> String {
        self.id
            .as_ref()
            .map_or_else(|| NULL_ID.to_string(), ToString::to_string)
    }
}
