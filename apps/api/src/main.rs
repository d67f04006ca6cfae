mod config;
mod consultation;
mod db;
mod errors;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::consultation::memory_store::InMemoryConsultationStore;
use crate::consultation::pg_store::PgConsultationStore;
use crate::consultation::store::ConsultationStore;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CareerPath API v{}", env!("CARGO_PKG_VERSION"));

    // Session store: PostgreSQL when configured, otherwise process memory.
    let store: Arc<dyn ConsultationStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, config.database_max_connections.get()).await?;
            Arc::new(PgConsultationStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; consultations are kept in memory and lost on restart");
            Arc::new(InMemoryConsultationStore::new())
        }
    };

    info!(
        "Consultation topic for new sessions: {}",
        config.consultation_topic
    );

    let state = AppState::new(config.clone(), store);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
