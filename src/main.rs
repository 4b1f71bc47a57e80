//! SpeechCut CLI entry point

use std::process::ExitCode;

use clap::Parser;

use speechcut::cli::{init_tracing, run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli).await
}
