//! Process-based pipeline executor.
//!
//! Invocation contract with the pipeline program: it is started with
//! `--config <path>` and `--codec <codec>` (plus `--type <tag>` when the
//! test case declares one), receives the input lines newline-terminated on
//! stdin, and emits one JSON event per non-empty stdout line. stderr is
//! captured verbatim as the run log; a zero exit status counts as success.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{ExecError, PipelineExecutor};
use crate::event::{Event, RunResult};
use crate::testcase::TestCase;

/// Deadline applied when the caller does not configure one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Spawns the pipeline program once per test case.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: PathBuf,
    config: PathBuf,
    timeout: Duration,
}

impl ProcessExecutor {
    /// `program` is the pipeline binary to run; `config` is the filter
    /// configuration handed to it via `--config`.
    pub fn new(program: impl Into<PathBuf>, config: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            config: config.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl PipelineExecutor for ProcessExecutor {
    async fn run(&self, case: &TestCase) -> Result<RunResult, ExecError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--config")
            .arg(&self.config)
            .arg("--codec")
            .arg(&case.codec)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(tag) = &case.event_type {
            cmd.arg("--type").arg(tag);
        }

        tracing::debug!(
            program = %self.program.display(),
            codec = %case.codec,
            lines = case.input_lines.len(),
            "spawning pipeline"
        );
        let mut child = cmd.spawn().map_err(ExecError::Spawn)?;

        let stdin = child.stdin.take();
        let mut input = String::new();
        for line in &case.input_lines {
            input.push_str(line);
            input.push('\n');
        }
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };

        let run = async {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            // A pipeline that exits before draining stdin closes the pipe;
            // its output and exit status still tell the whole story.
            if let Err(e) = fed {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(ExecError::Io(e));
                }
            }
            Ok::<_, ExecError>(output?)
        };
        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result?,
            // kill_on_drop reaps the child when the timed-out future is
            // dropped.
            Err(_) => {
                tracing::warn!(
                    program = %self.program.display(),
                    limit = ?self.timeout,
                    "pipeline timed out"
                );
                return Err(ExecError::Timeout {
                    limit: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut events: Vec<Event> = Vec::new();
        for (i, line) in stdout.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(line).map_err(|source| ExecError::Decode {
                line: i + 1,
                source,
            })?;
            events.push(event);
        }

        Ok(RunResult {
            success: output.status.success(),
            events,
            log: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("pipeline.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn case(lines: &[&str]) -> TestCase {
        TestCase {
            codec: "plain".to_string(),
            input_lines: lines.iter().map(|l| (*l).to_string()).collect(),
            ..TestCase::default()
        }
    }

    #[tokio::test]
    async fn captures_events_log_and_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(
            dir.path(),
            concat!(
                "cat >/dev/null\n",
                "echo '{\"message\": \"hello\"}'\n",
                "echo '{\"message\": \"world\"}'\n",
                "echo 'pipeline started' >&2"
            ),
        );
        let executor = ProcessExecutor::new(program, dir.path().join("filter.conf"));

        let result = executor.run(&case(&["hello"])).await.unwrap();
        assert!(result.success);
        assert_eq!(result.events.len(), 2);
        assert_eq!(
            result.events[0].get("message"),
            Some(&serde_json::Value::String("hello".to_string()))
        );
        assert!(result.log.contains("pipeline started"));
    }

    #[tokio::test]
    async fn input_lines_reach_the_child_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(
            dir.path(),
            "while read line; do printf '{\"message\": \"%s\"}\\n' \"$line\"; done",
        );
        let executor = ProcessExecutor::new(program, dir.path().join("filter.conf"));

        let result = executor.run(&case(&["first", "second"])).await.unwrap();
        let messages: Vec<_> = result
            .events
            .iter()
            .map(|e| e.get("message").and_then(|v| v.as_str()).unwrap())
            .collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_unsuccessful_run() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "cat >/dev/null\nexit 3");
        let executor = ProcessExecutor::new(program, dir.path().join("filter.conf"));

        let result = executor.run(&case(&[])).await.unwrap();
        assert!(!result.success);
        assert!(result.events.is_empty());
    }

    #[tokio::test]
    async fn unparseable_stdout_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "cat >/dev/null\necho 'not json'");
        let executor = ProcessExecutor::new(program, dir.path().join("filter.conf"));

        let err = executor.run(&case(&[])).await.unwrap_err();
        assert!(matches!(err, ExecError::Decode { line: 1, .. }));
    }

    #[tokio::test]
    async fn slow_pipeline_hits_the_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "sleep 5");
        let executor = ProcessExecutor::new(program, dir.path().join("filter.conf"))
            .with_timeout(Duration::from_millis(100));

        let err = executor.run(&case(&[])).await.unwrap_err();
        assert!(matches!(err, ExecError::Timeout { .. }));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let executor = ProcessExecutor::new("/nonexistent/pipeline", "/nonexistent/filter.conf");
        let err = executor.run(&case(&[])).await.unwrap_err();
        assert!(matches!(err, ExecError::Spawn(_)));
    }
}
