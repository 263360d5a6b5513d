//! Queue capability handed through the pipelines, plus an in-memory queue.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use queue_core::{JobStatus, Message, MessageId};
use tokio::sync::Mutex;

use crate::error::QueueError;

pub type QueueFuture<T> = BoxFuture<'static, Result<T, QueueError>>;

/// The transport a message came from.
///
/// The worker never calls it; interceptors may.
pub trait Queue: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Push a message, returning it with its transport id and status set.
    fn push(&self, message: Message) -> QueueFuture<Message>;

    fn status(&self, id: &MessageId) -> QueueFuture<JobStatus>;
}

#[derive(Default)]
struct State {
    pending: VecDeque<Message>,
    statuses: HashMap<MessageId, JobStatus>,
}

/// FIFO queue kept in memory.
#[derive(Clone)]
pub struct InMemoryQueue {
    name: String,
    state: Arc<Mutex<State>>,
}

impl InMemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Take the oldest waiting message and mark it reserved.
    pub async fn reserve(&self) -> Option<Message> {
        let mut state = self.state.lock().await;
        let mut message = state.pending.pop_front()?;
        if let Some(id) = &message.id {
            state.statuses.insert(id.clone(), JobStatus::Reserved);
        }
        message.status = Some(JobStatus::Reserved);
        Some(message)
    }

    /// Mark a reserved message as done.
    pub async fn complete(&self, id: &MessageId) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let status = state
            .statuses
            .get_mut(id)
            .ok_or_else(|| QueueError::NotFound(id.clone()))?;
        *status = JobStatus::Done;
        Ok(())
    }

    /// Number of waiting messages.
    pub async fn len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Queue for InMemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn push(&self, message: Message) -> QueueFuture<Message> {
        let state = self.state.clone();
        Box::pin(async move {
            let id = MessageId::generate();
            let message = message.with_id(id.clone()).with_status(JobStatus::Waiting);

            let mut state = state.lock().await;
            state.statuses.insert(id, JobStatus::Waiting);
            state.pending.push_back(message.clone());
            Ok(message)
        })
    }

    fn status(&self, id: &MessageId) -> QueueFuture<JobStatus> {
        let state = self.state.clone();
        let id = id.clone();
        Box::pin(async move {
            state
                .lock()
                .await
                .statuses
                .get(&id)
                .copied()
                .ok_or(QueueError::NotFound(id))
        })
    }
}
