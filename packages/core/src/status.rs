//! Lifecycle status of a queued message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stage of a message in the queue lifecycle.
///
/// The numeric tag is what transports store; use [`JobStatus::from_tag`] to
/// turn an untrusted tag back into a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Pushed and waiting for a worker.
    Waiting = 0,
    /// Taken by a worker and currently being processed.
    Reserved = 1,
    /// Processing finished.
    Done = 2,
}

impl JobStatus {
    /// All statuses, in tag order.
    pub const ALL: [JobStatus; 3] = [JobStatus::Waiting, JobStatus::Reserved, JobStatus::Done];

    pub const fn waiting() -> Self {
        JobStatus::Waiting
    }

    pub const fn reserved() -> Self {
        JobStatus::Reserved
    }

    pub const fn done() -> Self {
        JobStatus::Done
    }

    /// Build a status from a raw tag.
    pub fn from_tag(tag: i64) -> Result<Self, InvalidStatus> {
        match tag {
            0 => Ok(JobStatus::Waiting),
            1 => Ok(JobStatus::Reserved),
            2 => Ok(JobStatus::Done),
            status => Err(InvalidStatus { status }),
        }
    }

    /// The raw tag stored by transports.
    pub const fn tag(self) -> i64 {
        self as i64
    }

    pub const fn is_waiting(self) -> bool {
        matches!(self, JobStatus::Waiting)
    }

    pub const fn is_reserved(self) -> bool {
        matches!(self, JobStatus::Reserved)
    }

    pub const fn is_done(self) -> bool {
        matches!(self, JobStatus::Done)
    }

    /// Get a simple status string for display.
    pub const fn as_str(self) -> &'static str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Reserved => "reserved",
            JobStatus::Done => "done",
        }
    }

    /// Qualified variant name, as used in error hints.
    pub const fn qualified_name(self) -> &'static str {
        match self {
            JobStatus::Waiting => "JobStatus::Waiting",
            JobStatus::Reserved => "JobStatus::Reserved",
            JobStatus::Done => "JobStatus::Done",
        }
    }
}

impl TryFrom<i64> for JobStatus {
    type Error = InvalidStatus;

    fn try_from(tag: i64) -> Result<Self, Self::Error> {
        JobStatus::from_tag(tag)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw status tag that does not name any [`JobStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid job status provided: {status}")]
pub struct InvalidStatus {
    status: i64,
}

impl InvalidStatus {
    /// The offending raw tag.
    pub fn status(&self) -> i64 {
        self.status
    }

    pub fn name(&self) -> &'static str {
        "Invalid job status provided"
    }

    /// Lists every valid status together with its tag.
    pub fn solution(&self) -> String {
        let valid = JobStatus::ALL
            .iter()
            .map(|s| format!("{} ({})", s.qualified_name(), s.tag()))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Job status {} is not valid. Use one of the following: {}.",
            self.status, valid
        )
    }
}
