pub mod run;

use super::args::{Cli, Command};
use crate::exit_codes;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::execute(args).await,
        Command::Version => {
            println!("pipecheck {}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::SUCCESS)
        }
    }
}
