//! webstash entry point.
//!
//! Boots a browser with the cache proxy attached and visits the given URLs,
//! replaying stored responses and capturing fresh ones. Logging goes to
//! stderr.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Cli::parse();
    cli::run(args).await
}
