mod api;
mod cli;
mod config;
mod download;
mod error;
mod input;
mod markdown;
mod model;
mod util;

use std::process;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = cli::run(&args).await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}
