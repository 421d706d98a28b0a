//! Test-case model and comparison engine.
//!
//! A [`TestCase`] is a JSON document declaring the input lines to feed the
//! pipeline and the events it is expected to emit. Loading applies a single
//! defaulting pass (codec, baseline ignored fields); [`TestCase::compare`]
//! decides whether an actual run matched the expectation and, when it did
//! not, returns a [`ComparisonError`] enumerating exactly which indices
//! differ.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{events_equal, Event};

/// Codec assumed when the test case does not declare one.
pub const DEFAULT_CODEC: &str = "plain";

/// Fields every pipeline run adds automatically and that are therefore
/// excluded from comparison regardless of what the test case declares.
pub const DEFAULT_IGNORED_FIELDS: &[&str] = &["@version"];

/// Error from loading a test case or writing an event artifact.
#[derive(Debug, Error)]
pub enum TestCaseError {
    /// The serialized test case was malformed or structurally invalid.
    #[error("failed to decode test case: {0}")]
    Decode(#[from] serde_json::Error),
    /// A filesystem operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A single test case: the expectation document for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Absolute path the test case was loaded from. `None` when loaded from
    /// a plain reader.
    #[serde(skip)]
    pub file: Option<PathBuf>,

    /// Decoder the executor should apply to the input lines. Never empty
    /// after load; absence maps to [`DEFAULT_CODEC`].
    #[serde(default)]
    pub codec: String,

    /// Optional classification tag propagated into the pipeline invocation.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// Fields excluded from comparison. After load this always starts with
    /// [`DEFAULT_IGNORED_FIELDS`], followed by the user-declared entries in
    /// the order given.
    #[serde(rename = "ignore", default)]
    pub ignored_fields: Vec<String>,

    /// Raw input lines fed to the pipeline, in order.
    #[serde(rename = "input", default)]
    pub input_lines: Vec<String>,

    /// Events the pipeline is expected to emit, in emission order.
    #[serde(rename = "expected", default)]
    pub expected_events: Vec<Event>,
}

impl TestCase {
    /// Reads a test case from a JSON stream and applies the defaulting pass.
    ///
    /// Unknown fields are ignored; missing `input`/`expected` are treated as
    /// empty sequences.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TestCaseError> {
        let mut case: TestCase = serde_json::from_reader(reader)?;
        case.apply_defaults();
        Ok(case)
    }

    /// Reads a test case from a file, recording the absolute path in
    /// [`file`](Self::file). Relative paths are resolved against the current
    /// working directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TestCaseError> {
        let path = path.as_ref();
        let abs = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        tracing::debug!(path = %abs.display(), "loading test case");
        let file = fs::File::open(&abs)?;
        let mut case = Self::from_reader(std::io::BufReader::new(file))?;
        case.file = Some(abs);
        Ok(case)
    }

    /// The defaulting pass applied once at load time: empty codec becomes
    /// [`DEFAULT_CODEC`], and the baseline ignored fields are prepended to
    /// the user-declared ones. Duplicates are preserved as given.
    fn apply_defaults(&mut self) {
        if self.codec.is_empty() {
            self.codec = DEFAULT_CODEC.to_string();
        }
        let mut ignored = Vec::with_capacity(DEFAULT_IGNORED_FIELDS.len() + self.ignored_fields.len());
        ignored.extend(DEFAULT_IGNORED_FIELDS.iter().map(|f| (*f).to_string()));
        ignored.append(&mut self.ignored_fields);
        self.ignored_fields = ignored;
    }

    /// Compares the actually emitted events against the expectation.
    ///
    /// A count mismatch is reported on its own with an empty mismatch list;
    /// positional alignment beyond the shorter sequence is undefined, so no
    /// per-event diff is attempted. With equal counts the sequences are
    /// walked pairwise: event *N* in `actual` must match expected event *N*,
    /// never any permutation. When `apply_ignores` is set, fields named in
    /// [`ignored_fields`](Self::ignored_fields) are stripped from both sides
    /// before the equality check; the returned mismatches still carry the
    /// unfiltered events so ignored fields stay visible in the diagnostic.
    pub fn compare(&self, actual: &[Event], apply_ignores: bool) -> Result<(), ComparisonError> {
        if actual.len() != self.expected_events.len() {
            return Err(ComparisonError {
                actual_count: actual.len(),
                expected_count: self.expected_events.len(),
                mismatches: Vec::new(),
            });
        }

        let mut mismatches = Vec::new();
        for (index, (act, exp)) in actual.iter().zip(&self.expected_events).enumerate() {
            let equal = if apply_ignores {
                let act = strip_ignored(act, &self.ignored_fields);
                let exp = strip_ignored(exp, &self.ignored_fields);
                events_equal(&act, &exp)
            } else {
                events_equal(act, exp)
            };
            if !equal {
                mismatches.push(MismatchedEvent {
                    actual: act.clone(),
                    expected: exp.clone(),
                    index,
                });
            }
        }

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(ComparisonError {
                actual_count: actual.len(),
                expected_count: self.expected_events.len(),
                mismatches,
            })
        }
    }
}

fn strip_ignored(event: &Event, ignored: &[String]) -> Event {
    let mut copy = event.clone();
    for field in ignored {
        copy.remove(field);
    }
    copy
}

/// The diagnostic returned by a failed comparison. A value result rather
/// than an exceptional failure: a harness renders it, it is never retried.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("expected {expected_count} event(s), got {actual_count}")]
pub struct ComparisonError {
    pub actual_count: usize,
    pub expected_count: usize,
    /// One entry per differing index. Empty on a pure count mismatch.
    pub mismatches: Vec<MismatchedEvent>,
}

/// One position where the actual and expected events differ after ignored
/// fields are stripped. Carries the unfiltered events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchedEvent {
    pub actual: Event,
    pub expected: Event,
    pub index: usize,
}

/// Persists a single event to `path` as pretty-printed JSON terminated by a
/// trailing newline, creating intermediate directories as needed. A
/// debugging aid used by the harness to capture what a failing run actually
/// produced.
pub fn marshal_to_file(event: &Event, path: &Path) -> Result<(), TestCaseError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut buf = serde_json::to_vec_pretty(event)?;
    buf.push(b'\n');
    fs::write(path, buf)?;
    Ok(())
}
