use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pipecheck",
    version,
    about = "Verify the behavior of a log-processing filter configuration against declarative test cases"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run test cases against the pipeline program
    Run(RunArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Pipeline program executed once per test case
    #[arg(long)]
    pub program: PathBuf,

    /// Filter configuration handed to the pipeline program
    #[arg(long)]
    pub config: PathBuf,

    /// Per-case timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Compare all fields literally, including normally ignored ones
    #[arg(long)]
    pub no_ignore: bool,

    /// Write the actual events of failing cases below this directory
    #[arg(long)]
    pub export_actual: Option<PathBuf>,

    /// Test case files, or directories whose *.json children are taken
    #[arg(required = true)]
    pub testcases: Vec<PathBuf>,
}
