//! tfpolicy CLI entry point

use clap::Parser;
use std::process;
use tfpolicy::cli::common::{EXIT_ERROR, EXIT_SUCCESS};
use tfpolicy::cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `TFPOLICY_LOG=debug`
const LOG_ENV: &str = "TFPOLICY_LOG";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Command::Init { force } => match tfpolicy::cli::init::run_init(force) {
            Ok(result) => {
                for file in &result.created {
                    println!("Created {}.", file);
                }
                for file in &result.overwritten {
                    println!("Overwrote {}.", file);
                }
                for file in &result.skipped {
                    println!("Skipped {} (already exists, use --force to overwrite).", file);
                }
                EXIT_SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_ERROR
            }
        },
        Command::Check(args) => tfpolicy::cli::check::run_check(&args, cli.color),
        Command::List { format, config } => {
            tfpolicy::cli::list::run_list(format, config.as_deref())
        }
    };

    process::exit(exit_code);
}
