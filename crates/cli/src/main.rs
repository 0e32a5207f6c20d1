use std::process::ExitCode;

use clap::Parser;

use epicrm_cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    epicrm_observability::init(cli.log_format, &cli.log_level);
    epicrm_cli::commands::execute(&cli)
}
