//! Conversation session controller
//!
//! Owns the transcript, issues one request per submission and reconciles
//! replies back onto the placeholder turn created at submit time.

mod controller;
mod event;

#[cfg(test)]
pub mod testing;

pub use controller::{
    Reconciliation, SessionController, SubmissionHandle, SubmitError, CANCELLED_MARKER,
    FAILURE_MARKER,
};
pub use event::SessionEvent;
