mod cli;
mod config;
mod docker;
mod host;
mod utils;

use clap::Parser;
use cli::Cli;
use colored::Colorize;

fn main() {
    // Initialize logging
    utils::logger::init();

    // Parse CLI arguments, execute, and propagate the container's exit code
    let cli = Cli::parse();
    match cli.execute() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            std::process::exit(1);
        }
    }
}
