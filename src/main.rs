// Backtranslate - main entry point

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use backtranslate::cli::{execute, Cli};
use backtranslate::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    execute(cli).await
}
