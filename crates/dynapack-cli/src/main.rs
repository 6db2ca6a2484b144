//! Dynapack CLI
//!
//! Drives the package loader from the command line: load packages against a
//! package root, print their descriptors, and show the URLs a load fetches.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use dynapack_core::PackageLoader;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "dynapack=debug,dynapack_core=debug,dynapack_meta=debug"
    } else {
        "dynapack=info,dynapack_core=info,dynapack_meta=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = cli.command.clone() else {
        println!("{} Runtime package loader", "dynapack".green().bold());
        println!();
        println!("Run {} for available commands.", "dynapack --help".cyan());
        return Ok(());
    };

    let cwd = std::env::current_dir()?;
    let config = context::resolve_config(&cli, &cwd)?;
    let loader = PackageLoader::new(config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute_command(&loader, command))
}

async fn execute_command(loader: &PackageLoader, command: Commands) -> Result<()> {
    match command {
        Commands::Load { ids, concurrent } => {
            commands::run_load(loader, &ids, concurrent).await?;
        }
        Commands::Inspect { id } => {
            commands::run_inspect(loader, &id).await?;
        }
        Commands::Urls { id } => {
            commands::run_urls(loader, &id).await?;
        }
    }
    Ok(())
}
