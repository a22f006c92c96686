//! Shared test utilities for printbatch integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated passes over a temporary source tree
//! - Recording fakes for the renderer, printer directory and checkpoint prompt

pub mod fakes;
pub mod harness;

pub use fakes::*;
pub use harness::{RunResult, TestHarness};
