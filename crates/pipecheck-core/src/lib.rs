//! Core library for pipecheck: the test-case model, the comparison engine
//! and the executor that drives the external pipeline program.
//!
//! The harness in `pipecheck-cli` wires these together: it loads a
//! [`TestCase`](testcase::TestCase), hands its input lines to a
//! [`PipelineExecutor`](executor::PipelineExecutor), and compares the
//! emitted events against the expectation.

pub mod event;
pub mod executor;
pub mod testcase;

pub use event::{Event, RunResult};
pub use testcase::{ComparisonError, MismatchedEvent, TestCase, TestCaseError};
