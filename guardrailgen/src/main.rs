//! `guardrailgen`: guardrails policy validator

use clap::Parser;

use guardrailgen::cli::args::Cli;
use guardrailgen::cli::commands;
use guardrailgen::error::ExitCode;
use guardrailgen::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    match commands::dispatch(cli).await {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
