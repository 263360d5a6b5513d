//! Message types for actor communication.

use queue_core::Message;
use ractor::RpcReplyPort;

use crate::error::JobFailure;

/// Messages for the WorkerActor.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Process one message and reply with the outcome.
    Process {
        message: Box<Message>,
        reply: RpcReplyPort<Result<(), JobFailure>>,
    },

    /// Work through the attached queue until it is empty.
    Drain { reply: RpcReplyPort<DrainReport> },

    /// Get the totals processed so far.
    GetStats { reply: RpcReplyPort<DrainReport> },

    /// Shutdown the worker.
    Shutdown,
}

/// Counts of messages handled by a worker actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Messages whose processing returned normally.
    pub succeeded: u64,
    /// Messages that ended in a job failure.
    pub failed: u64,
}

impl DrainReport {
    /// Total processed messages.
    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed
    }

    pub(crate) fn recorded(mut self, ok: bool) -> Self {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self
    }
}
