//! Shared test utilities for docsync integration tests.
//!
//! This module provides:
//! - `TestHarness` wiring the engine to an in-memory store and test doubles
//! - `FakeWorker` and `FakeRunner` standing in for the external services

pub mod fakes;
pub mod harness;

pub use fakes::{FakeRunner, FakeWorker};
pub use harness::TestHarness;
