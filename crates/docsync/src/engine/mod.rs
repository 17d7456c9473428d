//! Analysis lifecycle: start, poll, ingest, report.

pub mod error;
pub mod orchestrator;

pub use error::OrchestrationError;
pub use orchestrator::{parse_kind, Orchestrator, PollOutcome};
