//! Core domain types for the job queue system.
//!
//! This crate contains the types shared by transports and the worker:
//! - JobStatus for the message lifecycle
//! - Message and MessageId for the queued envelope

mod message;
mod status;

pub use message::{Message, MessageId, NULL_ID};
pub use status::{InvalidStatus, JobStatus};
