use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use stratus_main::{App, Cli};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let app = App::init(&cli)?;
    app.run(cli.command).await
}
