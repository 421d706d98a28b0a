//! The `pipecheck run` subcommand: discover test cases, run each one
//! through the pipeline, compare and report.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use pipecheck_core::executor::{PipelineExecutor, ProcessExecutor};
use pipecheck_core::testcase::marshal_to_file;
use pipecheck_core::{Event, TestCase};

use crate::cli::args::RunArgs;
use crate::exit_codes;
use crate::report;

pub async fn execute(args: RunArgs) -> anyhow::Result<i32> {
    let paths = discover(&args.testcases)?;
    if paths.is_empty() {
        anyhow::bail!("no test cases found");
    }
    tracing::debug!(count = paths.len(), "discovered test cases");

    let executor = ProcessExecutor::new(&args.program, &args.config)
        .with_timeout(Duration::from_secs(args.timeout));

    let mut passed = 0usize;
    for path in &paths {
        let case = TestCase::from_file(path)
            .with_context(|| format!("failed to load test case {}", path.display()))?;
        let result = executor
            .run(&case)
            .await
            .with_context(|| format!("failed to run pipeline for {}", path.display()))?;

        let verdict = case.compare(&result.events, !args.no_ignore);
        let ok = result.success && verdict.is_ok();
        println!("{}", report::case_line(path, ok));
        if !result.success {
            eprintln!("pipeline exited unsuccessfully for {}", path.display());
            if !result.log.is_empty() {
                eprintln!("{}", result.log.trim_end());
            }
        }
        if let Err(diff) = &verdict {
            print!("{}", report::render_comparison(diff));
            if let Some(dir) = &args.export_actual {
                export_actual(dir, path, &result.events)?;
            }
        }
        if ok {
            passed += 1;
        }
    }

    println!("{}", report::summary_line(passed, paths.len()));
    Ok(if passed == paths.len() {
        exit_codes::SUCCESS
    } else {
        exit_codes::TESTS_FAILED
    })
}

/// Expands directory arguments to their `*.json` children, sorted by name.
/// File arguments are taken as given, in argument order.
fn discover(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut cases = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut children: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("failed to read directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            children.sort();
            cases.extend(children);
        } else {
            cases.push(path.clone());
        }
    }
    Ok(cases)
}

fn export_actual(dir: &Path, case_path: &Path, events: &[Event]) -> anyhow::Result<()> {
    let stem = case_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("testcase");
    for (i, event) in events.iter().enumerate() {
        let dest = dir.join(stem).join(format!("{i}.json"));
        marshal_to_file(event, &dest)
            .with_context(|| format!("failed to export actual event to {}", dest.display()))?;
    }
    Ok(())
}
