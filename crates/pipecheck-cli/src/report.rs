//! Console rendering of run outcomes. Formatting helpers are deterministic
//! and unit-testable; printing happens in the run command.

use std::fmt::Write as _;
use std::path::Path;

use pipecheck_core::{ComparisonError, Event};
use similar::{ChangeTag, TextDiff};

pub fn case_line(path: &Path, passed: bool) -> String {
    format!("{} {}", if passed { "PASS" } else { "FAIL" }, path.display())
}

pub fn summary_line(passed: usize, total: usize) -> String {
    format!("{passed} of {total} test case(s) passed")
}

/// Renders a failed comparison: counts only for a count mismatch (there is
/// no meaningful per-event alignment to show), otherwise a unified diff of
/// the pretty-printed expected vs actual event for every mismatched index.
pub fn render_comparison(error: &ComparisonError) -> String {
    let mut out = String::new();
    if error.mismatches.is_empty() {
        let _ = writeln!(
            out,
            "  expected {} event(s), got {}",
            error.expected_count, error.actual_count
        );
        return out;
    }
    for mismatch in &error.mismatches {
        let _ = writeln!(out, "  event {} differs (expected vs actual):", mismatch.index);
        let expected = pretty(&mismatch.expected);
        let actual = pretty(&mismatch.actual);
        let diff = TextDiff::from_lines(&expected, &actual);
        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            let _ = write!(out, "  {sign}{change}");
        }
    }
    out
}

fn pretty(event: &Event) -> String {
    let mut text = serde_json::to_string_pretty(event)
        .unwrap_or_else(|_| "<unprintable event>".to_string());
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(v: serde_json::Value) -> Event {
        match v {
            serde_json::Value::Object(map) => map,
            other => panic!("expected JSON object, got {other}"),
        }
    }

    #[test]
    fn case_lines_mark_pass_and_fail() {
        assert_eq!(
            case_line(Path::new("cases/syslog.json"), true),
            "PASS cases/syslog.json"
        );
        assert!(case_line(Path::new("x.json"), false).starts_with("FAIL"));
    }

    #[test]
    fn count_mismatch_renders_counts_without_diff() {
        let rendered = render_comparison(&ComparisonError {
            actual_count: 1,
            expected_count: 2,
            mismatches: Vec::new(),
        });
        assert_eq!(rendered, "  expected 2 event(s), got 1\n");
    }

    #[test]
    fn content_mismatch_renders_a_diff_per_index() {
        let rendered = render_comparison(&ComparisonError {
            actual_count: 1,
            expected_count: 1,
            mismatches: vec![pipecheck_core::MismatchedEvent {
                actual: event(json!({"a": "B"})),
                expected: event(json!({"a": "b"})),
                index: 0,
            }],
        });
        assert!(rendered.contains("event 0 differs"));
        assert!(rendered.contains("-  \"a\": \"b\"\n"));
        assert!(rendered.contains("+  \"a\": \"B\"\n"));
    }

    #[test]
    fn summary_counts_passed_against_total() {
        assert_eq!(summary_line(3, 4), "3 of 4 test case(s) passed");
    }
}
