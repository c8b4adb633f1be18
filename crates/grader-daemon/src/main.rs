use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use grader_daemon::{api, config::DaemonConfig};
use grader_ledger_sqlite::SqliteLedger;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "grader-daemon", version, about = "Submission collector for the grading pipeline")]
struct Cli {
    /// Where the HTTP API will listen, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Path to the sqlite ledger file.
    #[arg(long, default_value = "grader.db")]
    db_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = DaemonConfig {
        listen: cli.listen,
        db_path: cli.db_path,
    };
    info!("starting collector with config: {:?}", config);

    let ledger = Arc::new(SqliteLedger::open(&config.db_path)?);
    let state = api::AppState::new(ledger);

    let app = Router::new()
        .route("/api/submissions", post(api::submit))
        .route("/health", get(api::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = config.listen.parse()?;
    info!("listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown requested");
}
