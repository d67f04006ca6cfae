//! PostgreSQL-backed consultation store (`consultations` table).
//!
//! Queries use the runtime-checked `sqlx::query*` forms so no database is
//! needed at compile time. The message log lives in a single JSONB column and
//! every update replaces it wholesale.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::consultation::store::{
    ConsultationFilter, ConsultationPatch, ConsultationStore, NewConsultation, OrderBy,
    SortDirection, StoreError,
};
use crate::models::consultation::{ConsultationRow, Message};

const COLUMNS: &str = "id, user_id, topic, messages, status, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ConsultationRecord {
    id: Uuid,
    user_id: Uuid,
    topic: String,
    messages: Json<Vec<Message>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConsultationRecord> for ConsultationRow {
    type Error = StoreError;

    fn try_from(record: ConsultationRecord) -> Result<Self, Self::Error> {
        let status = record
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("consultation {}: {e}", record.id)))?;
        Ok(ConsultationRow {
            id: record.id,
            user_id: record.user_id,
            topic: record.topic,
            messages: record.messages.0,
            status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Connection-level failures mean the store is unreachable; anything else is a
/// query or data problem.
fn store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Database(other),
    }
}

#[derive(Clone)]
pub struct PgConsultationStore {
    pool: PgPool,
}

impl PgConsultationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConsultationStore for PgConsultationStore {
    async fn find(
        &self,
        filter: &ConsultationFilter,
        order: OrderBy,
        limit: Option<usize>,
    ) -> Result<Vec<ConsultationRow>, StoreError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM consultations WHERE user_id = "));
        query.push_bind(filter.user_id);
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY ").push(order.field.column());
        query.push(match order.direction {
            SortDirection::Ascending => " ASC",
            SortDirection::Descending => " DESC",
        });
        if let Some(limit) = limit {
            query.push(" LIMIT ").push_bind(limit as i64);
        }

        let records: Vec<ConsultationRecord> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        debug!(
            "Found {} consultation(s) for user {}",
            records.len(),
            filter.user_id
        );
        records.into_iter().map(ConsultationRow::try_from).collect()
    }

    async fn insert(&self, record: NewConsultation) -> Result<ConsultationRow, StoreError> {
        let inserted: Result<ConsultationRecord, sqlx::Error> = sqlx::query_as(&format!(
            r#"
            INSERT INTO consultations (user_id, topic, messages, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(record.user_id)
        .bind(&record.topic)
        .bind(Json(&record.messages))
        .bind(record.status.as_str())
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => row.try_into(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Conflict(record.user_id))
            }
            Err(e) => Err(store_error(e)),
        }
    }

    async fn update(&self, id: Uuid, patch: ConsultationPatch) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE consultations
            SET messages = COALESCE($2, messages),
                status = COALESCE($3, status),
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.messages.as_ref().map(Json))
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
