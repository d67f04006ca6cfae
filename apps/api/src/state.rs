use std::sync::Arc;

use crate::config::Config;
use crate::consultation::registry::SessionRegistry;
use crate::consultation::store::ConsultationStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Per-owner consultation managers over the configured store
    /// (PostgreSQL when `DATABASE_URL` is set, in-memory otherwise).
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ConsultationStore>) -> Self {
        let sessions = Arc::new(SessionRegistry::new(
            store,
            config.consultation_topic.clone(),
        ));
        Self { config, sessions }
    }
}
