//! Actor hosting a [`Worker`] next to an in-memory queue.

use std::sync::Arc;

use queue_core::Message;
use ractor::{Actor, ActorProcessingErr, ActorRef, SpawnErr};
use ractor::concurrency::JoinHandle;

use crate::error::JobFailure;
use crate::messages::{DrainReport, WorkerMessage};
use crate::queue::{InMemoryQueue, Queue};
use crate::worker::Worker;

/// State for the worker actor.
pub struct WorkerActorState {
    worker: Arc<Worker>,
    queue: Arc<InMemoryQueue>,
    /// Totals since the actor started.
    stats: DrainReport,
}

impl WorkerActorState {
    async fn process(&mut self, message: Message) -> Result<(), JobFailure> {
        let result = self
            .worker
            .process(Arc::new(message), self.queue.clone() as Arc<dyn Queue>)
            .await;

        if let Err(failure) = &result {
            tracing::warn!("{}: {}", self.worker.config().worker_id, failure);
        }

        self.stats = self.stats.recorded(result.is_ok());
        result
    }
}

/// Worker actor arguments.
pub struct WorkerArgs {
    pub worker: Arc<Worker>,
    pub queue: Arc<InMemoryQueue>,
}

/// Worker actor. Its mailbox hands the worker one message at a time.
pub struct WorkerActor;

impl Actor for WorkerActor {
    type Msg = WorkerMessage;
    type State = WorkerActorState;
    type Arguments = WorkerArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting worker: {} on queue {}",
            args.worker.config().worker_id,
            args.queue.name()
        );

        Ok(WorkerActorState {
            worker: args.worker,
            queue: args.queue,
            stats: DrainReport::default(),
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::Process { message, reply } => {
                let result = state.process(*message).await;
                let _ = reply.send(result);
            }

            WorkerMessage::Drain { reply } => {
                let mut report = DrainReport::default();
                while let Some(message) = state.queue.reserve().await {
                    let id = message.id.clone();
                    let ok = state.process(message).await.is_ok();
                    report = report.recorded(ok);

                    if let Some(id) = id
                        && let Err(e) = state.queue.complete(&id).await
                    {
                        tracing::warn!("Failed to complete message {} on {}: {}", id, state.queue.name(), e);
                    }
                }
                let _ = reply.send(report);
            }

            WorkerMessage::GetStats { reply } => {
                let _ = reply.send(state.stats);
            }

            WorkerMessage::Shutdown => {
                tracing::info!("Shutting down worker: {}", state.worker.config().worker_id);
                myself.stop(None);
            }
        }

        Ok(())
    }
}

/// Spawn a worker actor bound to `queue`.
pub async fn spawn_worker(
    worker: Arc<Worker>,
    queue: Arc<InMemoryQueue>,
) -> Result<(ActorRef<WorkerMessage>, JoinHandle<()>), SpawnErr> {
    let name = worker.config().worker_id.clone();
    Actor::spawn(Some(name), WorkerActor, WorkerArgs { worker, queue }).await
}
