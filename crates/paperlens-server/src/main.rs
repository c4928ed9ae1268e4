//! PaperLens — research paper ingestion server and command-line tools.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("PAPERLENS_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_help() {
    println!("PaperLens — research paper ingestion and summarization");
    println!();
    println!("Usage: paperlens [command]");
    println!();
    println!("Commands:");
    println!("  serve                              Start the HTTP API (default)");
    println!("  collect [categories] [max] [dl]    Fetch arXiv metadata and PDFs");
    println!("  batch [pdf-dir] [max]              Process a directory of PDFs");
    println!("  prepare [pdf-dir]                  Build training datasets from PDFs");
    println!("  health                             Check external components");
    println!("  help                               Show this help message");
}

async fn serve(config: paperlens_core::PaperLensConfig) -> anyhow::Result<()> {
    let port = config.port;
    let state = Arc::new(AppState::detect(config).await);
    info!(
        "Capabilities: route={}, summarizer={}",
        state.capabilities.extraction_route(),
        state.capabilities.summarizer
    );

    let app = routes::build_router(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("PaperLens server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("serve");
    let rest = args.get(2..).unwrap_or_default();

    if matches!(command, "help" | "--help" | "-h") {
        print_help();
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());
    let config = paperlens_core::PaperLensConfig::from_env(&data_dir)?;

    match command {
        "serve" => serve(config).await,
        "collect" => cli::collect(&config, rest).await,
        "batch" => cli::batch(&config, rest).await,
        "prepare" => cli::prepare(&config, rest).await,
        "health" => {
            let alive = cli::health(&config).await?;
            std::process::exit(if alive { 0 } else { 1 });
        }
        other => {
            eprintln!("Unknown command: {}. Use 'paperlens help' for usage.", other);
            std::process::exit(1);
        }
    }
}
