#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Arrest tracker API server binary.

use std::path::PathBuf;

use arrest_tracker_server::{DEFAULT_BIND_ADDR, DEFAULT_PORT, ServerOptions, run_server};
use clap::Parser;

#[derive(Parser)]
#[command(name = "arrest_tracker_server", about = "NYPD arrest dashboard API server")]
struct Cli {
    /// Config file (defaults to `$ARREST_TRACKER_CONFIG`, then `arrest_tracker.toml`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind (defaults to `$BIND_ADDR`, then 127.0.0.1)
    #[arg(long)]
    bind: Option<String>,

    /// Port to bind (defaults to `$PORT`, then 8080)
    #[arg(long)]
    port: Option<u16>,
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let bind_addr = cli
        .bind
        .or_else(|| std::env::var("BIND_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let port = cli
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(DEFAULT_PORT);

    run_server(ServerOptions {
        config_path: cli.config,
        bind_addr,
        port,
    })
    .await?;

    Ok(())
}
