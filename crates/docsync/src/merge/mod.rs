//! Supervision of the external merge program.
//!
//! The program runs as one bounded child process per call. Its stdout and
//! stderr are captured together, and the result is only trusted when the
//! output carries the success marker (see [`protocol`]).

pub mod error;
pub mod protocol;
pub mod runner;
pub mod supervisor;

pub use error::{MergeError, MergeFailureKind, RunError};
pub use runner::{Invocation, ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use supervisor::{MergeSupervisor, MERGE_TIMEOUT};
