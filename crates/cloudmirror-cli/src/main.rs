mod cli;
mod commands;
mod logging;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use commands::CommandOptions;

fn main() -> anyhow::Result<()> {
    // Ctrl+C aborts in place, mid-tick included
    ctrlc::set_handler(|| {
        eprintln!("\n\nInterrupted by user (Ctrl+C)");
        std::process::exit(130);
    })
    .context("Failed to set Ctrl+C handler")?;

    let cli = Cli::parse();
    let options = CommandOptions::new(cli.verbose, cli.config.as_deref(), cli.overrides());

    match &cli.command {
        Commands::Run { once } => {
            commands::Run::execute(*once, &options).context("Failed to execute run command")?;
        }
        Commands::Status => {
            commands::Status::execute(&options).context("Failed to execute status command")?;
        }
        Commands::Config => {
            commands::Config::execute(&options).context("Failed to execute config command")?;
        }
    }

    Ok(())
}
