//! bakeplan CLI - capability-aware `docker buildx bake` invocations

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("bakeplan=debug")
    } else {
        EnvFilter::new("bakeplan=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Plan(args) => commands::plan::execute(args),
        Commands::Run(args) => commands::run::execute(args),
        Commands::Refs(args) => commands::refs::execute(args),
    }
}
