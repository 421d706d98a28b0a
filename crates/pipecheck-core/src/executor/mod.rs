//! Execution of the pipeline under test.
//!
//! The comparison engine never runs anything itself; it consumes a
//! [`RunResult`] produced by a [`PipelineExecutor`]. The process-based
//! implementation lives in [`process`].

pub mod process;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::event::RunResult;
use crate::testcase::TestCase;

pub use process::ProcessExecutor;

/// Runs the pipeline under test for one test case and captures its outcome.
#[async_trait]
pub trait PipelineExecutor: Send + Sync {
    /// Feeds the case's input lines to the pipeline and returns what it
    /// emitted. Comparison failures are not errors here; this only fails
    /// when the run itself could not be carried out or produced
    /// uninterpretable output.
    async fn run(&self, case: &TestCase) -> Result<RunResult, ExecError>;
}

/// Error from driving the pipeline process.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The pipeline program could not be started.
    #[error("failed to spawn pipeline program: {0}")]
    Spawn(#[source] std::io::Error),

    /// Reading from or writing to the pipeline process failed.
    #[error("pipeline i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// A stdout line could not be parsed as a JSON event.
    #[error("invalid event on stdout line {line}: {source}")]
    Decode {
        /// 1-based stdout line number.
        line: usize,
        source: serde_json::Error,
    },

    /// The pipeline did not finish within the configured deadline.
    #[error("pipeline timed out after {limit:?}")]
    Timeout { limit: Duration },
}
