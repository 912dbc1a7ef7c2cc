//! Forge IDE Server
//!
//! HTTP backend for the Forge browser IDE: serves the project file tree,
//! reads and writes workspace files, compiles and runs submitted C++
//! source, and relays code to an AI assistant for fixes and reviews.
//! Run with: cargo run

mod config;
mod error;
mod routes;
mod services;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::services::assist::AssistTools;
use crate::services::compiler::CompileTools;
use crate::services::workspace::WorkspaceTools;

/// Shared application state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<WorkspaceTools>,
    pub compile: Arc<CompileTools>,
    pub assist: Arc<AssistTools>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            workspace: Arc::new(WorkspaceTools::new(config.project_root.clone())),
            compile: Arc::new(CompileTools::new(
                config.compiler.clone(),
                config.scratch_dir.clone(),
            )),
            assist: Arc::new(AssistTools::new(&config.ai)),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    tracing::info!("Starting Forge IDE Server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env()?;
    tracing::info!("Project root: {}", config.project_root.display());
    if config.ai.api_key.is_none() {
        tracing::warn!("AI_API_KEY is not set. AI features will be disabled.");
        tracing::warn!(
            "To enable AI features: set the AI_API_KEY environment variable and restart the server"
        );
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(config);
    let app = routes::build_routes(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down");
}
