mod args;
mod commands;
mod console;

use services::{AppConfig, AppServices, Clock};
use tracing_subscriber::EnvFilter;

use crate::args::{Command, print_usage};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let command = Command::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if command == Command::Help {
        print_usage();
        return Ok(());
    }

    let config = AppConfig::from_env()?;
    let services = AppServices::from_config(&config, Clock::default_clock())?;
    tracing::debug!(user = config.user_id.as_str(), "services ready");

    commands::dispatch(command, &services).await
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
