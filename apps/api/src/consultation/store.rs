//! Session store — the generic row-store contract the consultation flow consumes.
//!
//! Backends: [`PgConsultationStore`](crate::consultation::pg_store::PgConsultationStore)
//! and [`InMemoryConsultationStore`](crate::consultation::memory_store::InMemoryConsultationStore).
//! `AppState` carries one as `Arc<dyn ConsultationStore>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::consultation::{ConsultationRow, ConsultationStatus, Message};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The single-active-session constraint rejected an insert.
    #[error("An active consultation already exists for user {0}")]
    Conflict(Uuid),

    #[error("Consultation {0} not found")]
    NotFound(Uuid),

    #[error("Corrupt consultation record: {0}")]
    Corrupt(String),
}

#[derive(Debug, Clone)]
pub struct ConsultationFilter {
    pub user_id: Uuid,
    pub status: Option<ConsultationStatus>,
}

impl ConsultationFilter {
    pub fn all_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            status: None,
        }
    }

    pub fn active_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            status: Some(ConsultationStatus::Active),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: SortField,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn newest_first() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Descending,
        }
    }

    pub fn oldest_first() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Ascending,
        }
    }
}

/// Insert payload. The store assigns `id`, `created_at` and `updated_at`.
#[derive(Debug, Clone)]
pub struct NewConsultation {
    pub user_id: Uuid,
    pub topic: String,
    pub messages: Vec<Message>,
    pub status: ConsultationStatus,
}

/// Partial update. `None` fields are left untouched; `messages` replaces the
/// whole stored log.
#[derive(Debug, Clone)]
pub struct ConsultationPatch {
    pub messages: Option<Vec<Message>>,
    pub status: Option<ConsultationStatus>,
    pub updated_at: DateTime<Utc>,
}

impl ConsultationPatch {
    pub fn replace_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Some(messages),
            status: None,
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait ConsultationStore: Send + Sync {
    async fn find(
        &self,
        filter: &ConsultationFilter,
        order: OrderBy,
        limit: Option<usize>,
    ) -> Result<Vec<ConsultationRow>, StoreError>;

    async fn insert(&self, record: NewConsultation) -> Result<ConsultationRow, StoreError>;

    async fn update(&self, id: Uuid, patch: ConsultationPatch) -> Result<(), StoreError>;
}
