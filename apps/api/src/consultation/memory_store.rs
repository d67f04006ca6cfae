//! Process-local store. Used when no `DATABASE_URL` is configured and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::consultation::store::{
    ConsultationFilter, ConsultationPatch, ConsultationStore, NewConsultation, OrderBy,
    SortDirection, SortField, StoreError,
};
use crate::models::consultation::{ConsultationRow, ConsultationStatus};

#[derive(Default)]
pub struct InMemoryConsultationStore {
    rows: RwLock<HashMap<Uuid, ConsultationRow>>,
}

impl InMemoryConsultationStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    /// Inserts a fully formed row, bypassing the active-session check.
    /// Lets callers seed legacy data such as duplicate active sessions.
    pub async fn seed(&self, row: ConsultationRow) {
        self.rows.write().await.insert(row.id, row);
    }

    #[cfg(test)]
    pub async fn remove(&self, id: Uuid) -> Option<ConsultationRow> {
        self.rows.write().await.remove(&id)
    }

    #[cfg(test)]
    pub async fn get(&self, id: Uuid) -> Option<ConsultationRow> {
        self.rows.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl ConsultationStore for InMemoryConsultationStore {
    async fn find(
        &self,
        filter: &ConsultationFilter,
        order: OrderBy,
        limit: Option<usize>,
    ) -> Result<Vec<ConsultationRow>, StoreError> {
        let rows = self.rows.read().await;
        let mut matched: Vec<ConsultationRow> = rows
            .values()
            .filter(|r| r.user_id == filter.user_id)
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();

        matched.sort_by_key(|r| match order.field {
            SortField::CreatedAt => r.created_at,
        });
        if order.direction == SortDirection::Descending {
            matched.reverse();
        }
        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn insert(&self, record: NewConsultation) -> Result<ConsultationRow, StoreError> {
        let mut rows = self.rows.write().await;

        // Mirrors the partial unique index on (user_id) WHERE status = 'active'.
        if record.status == ConsultationStatus::Active
            && rows
                .values()
                .any(|r| r.user_id == record.user_id && r.status == ConsultationStatus::Active)
        {
            return Err(StoreError::Conflict(record.user_id));
        }

        let now = Utc::now();
        let row = ConsultationRow {
            id: Uuid::new_v4(),
            user_id: record.user_id,
            topic: record.topic,
            messages: record.messages,
            status: record.status,
            created_at: now,
            updated_at: now,
        };
        rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: ConsultationPatch) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(messages) = patch.messages {
            row.messages = messages;
        }
        if let Some(status) = patch.status {
            row.status = status;
        }
        row.updated_at = patch.updated_at;
        Ok(())
    }
}
