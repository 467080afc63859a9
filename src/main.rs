// src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, recorded_command_line};
use tracing::error;

fn main() {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli = Cli::parse_from(&args);
    let config = cli.into_config(recorded_command_line(&args));

    let code = match commands::cmd_generate(&config) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    };
    std::process::exit(code);
}
