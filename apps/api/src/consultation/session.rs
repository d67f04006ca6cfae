//! Consultation session lifecycle.
//!
//! `load_or_create` adopts the owner's most recent active session or creates one
//! seeded with the coach greeting. A turn (`compose_turn` + `persist_log`)
//! appends a user message plus the scripted reply and persists the *entire*
//! log with one replace-write. Because the whole
//! log is retransmitted on every turn, cumulative bytes written grow
//! quadratically with the number of turns; the single JSONB `messages` column
//! requires it.
//!
//! `ConsultationManager` wraps both operations in a small state machine that
//! owns the in-memory log:
//!
//! ```text
//! Uninitialized ──load──▶ Loading ──▶ Ready ──send──▶ Pending ──▶ Ready
//! ```
//!
//! Local appends are optimistic. A failed write leaves the log advanced and
//! marks it unsynced; `resync` (or the next successful turn) writes it again.
//! If the store reports the row gone, the manager drops back to
//! `Uninitialized` so the next load binds a fresh session.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::consultation::engine::{classify, generate_response, AdviceTopic};
use crate::consultation::prompts::GREETING;
use crate::consultation::store::{
    ConsultationFilter, ConsultationPatch, ConsultationStore, NewConsultation, OrderBy, StoreError,
};
use crate::models::consultation::{ConsultationRow, ConsultationStatus, Message};
use crate::models::user::OwnerContext;

#[derive(Debug, Error)]
pub enum ConsultationError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No consultation session is loaded")]
    NotLoaded,
}

/// Why a send was ignored without touching state or the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyInput,
    NotReady,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Sent {
        messages: Vec<Message>,
        topic: AdviceTopic,
    },
    Skipped(SkipReason),
}

/// The session a manager ends up bound to.
#[derive(Debug, Clone)]
pub struct ActiveConsultation {
    pub session_id: Uuid,
    pub topic: String,
    pub messages: Vec<Message>,
    /// Number of leading messages known to match the stored log.
    pub stored_len: usize,
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Ready,
    Pending,
}

pub fn greeting_log() -> Vec<Message> {
    vec![Message::assistant(GREETING)]
}

/// Finds the owner's newest active session or creates one.
///
/// Duplicate active sessions (legacy rows) resolve to the most recently
/// created one. If the insert loses a race against another creator, the
/// winner's session is adopted.
pub async fn load_or_create(
    store: &dyn ConsultationStore,
    owner: &OwnerContext,
    topic: &str,
) -> Result<ActiveConsultation, StoreError> {
    if let Some(existing) = find_active(store, owner).await? {
        return Ok(existing);
    }

    let inserted = store
        .insert(NewConsultation {
            user_id: owner.user_id,
            topic: topic.to_string(),
            messages: greeting_log(),
            status: ConsultationStatus::Active,
        })
        .await;

    match inserted {
        Ok(row) => {
            info!(
                "Created consultation {} for user {}",
                row.id, owner.user_id
            );
            let stored_len = row.messages.len();
            Ok(ActiveConsultation {
                session_id: row.id,
                topic: row.topic,
                messages: row.messages,
                stored_len,
                created: true,
            })
        }
        Err(StoreError::Conflict(user_id)) => {
            warn!("Concurrent consultation creation for user {user_id}; adopting the winner");
            find_active(store, owner)
                .await?
                .ok_or(StoreError::Conflict(user_id))
        }
        Err(e) => Err(e),
    }
}

async fn find_active(
    store: &dyn ConsultationStore,
    owner: &OwnerContext,
) -> Result<Option<ActiveConsultation>, StoreError> {
    let found = store
        .find(
            &ConsultationFilter::active_for(owner.user_id),
            OrderBy::newest_first(),
            Some(1),
        )
        .await?;

    Ok(found.into_iter().next().map(|row| {
        let stored_len = row.messages.len();
        // An empty stored log keeps the local greeting.
        let messages = if row.messages.is_empty() {
            greeting_log()
        } else {
            row.messages
        };
        ActiveConsultation {
            session_id: row.id,
            topic: row.topic,
            messages,
            stored_len,
            created: false,
        }
    }))
}

/// Appends one user turn and the coach's reply to `current_log`.
/// Returns `None` for empty or whitespace-only input.
pub fn compose_turn(current_log: &[Message], text: &str) -> Option<(Vec<Message>, AdviceTopic)> {
    if text.trim().is_empty() {
        return None;
    }
    let topic = classify(text);
    let mut messages = Vec::with_capacity(current_log.len() + 2);
    messages.extend_from_slice(current_log);
    messages.push(Message::user(text));
    messages.push(Message::assistant(generate_response(text)));
    Some((messages, topic))
}

/// Replaces the stored log of `session_id` with `messages` and stamps `updated_at`.
pub async fn persist_log(
    store: &dyn ConsultationStore,
    session_id: Uuid,
    messages: &[Message],
) -> Result<(), StoreError> {
    store
        .update(session_id, ConsultationPatch::replace_messages(messages.to_vec()))
        .await
}

/// Every consultation the owner has had, oldest first.
pub async fn history(
    store: &dyn ConsultationStore,
    owner: &OwnerContext,
) -> Result<Vec<ConsultationRow>, StoreError> {
    store
        .find(
            &ConsultationFilter::all_for(owner.user_id),
            OrderBy::oldest_first(),
            None,
        )
        .await
}

/// Snapshot of a manager for callers and the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultationView {
    pub session_id: Option<Uuid>,
    pub topic: String,
    pub phase: SessionPhase,
    pub messages: Vec<Message>,
    pub pending_sync: bool,
}

/// Owns one owner's consultation: the session handle, the local log and how
/// much of it the store has confirmed.
pub struct ConsultationManager {
    owner: OwnerContext,
    store: Arc<dyn ConsultationStore>,
    topic: String,
    phase: SessionPhase,
    session_id: Option<Uuid>,
    messages: Vec<Message>,
    synced_len: usize,
}

impl ConsultationManager {
    pub fn new(owner: OwnerContext, store: Arc<dyn ConsultationStore>, topic: String) -> Self {
        Self {
            owner,
            store,
            topic,
            phase: SessionPhase::Uninitialized,
            session_id: None,
            messages: greeting_log(),
            synced_len: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_ready(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn pending_sync(&self) -> bool {
        self.session_id.is_some() && self.synced_len < self.messages.len()
    }

    pub fn view(&self) -> ConsultationView {
        ConsultationView {
            session_id: self.session_id(),
            topic: self.topic.clone(),
            phase: self.phase(),
            messages: self.messages().to_vec(),
            pending_sync: self.pending_sync(),
        }
    }

    /// Binds the manager to the owner's active session. Once bound, further
    /// calls return the loaded session without touching the store.
    pub async fn load_or_create(&mut self) -> Result<Uuid, ConsultationError> {
        if let Some(id) = self.session_id {
            return Ok(id);
        }

        self.phase = SessionPhase::Loading;
        match load_or_create(self.store.as_ref(), &self.owner, &self.topic).await {
            Ok(active) => {
                if !active.created {
                    info!(
                        "Adopted consultation {} for user {} ({} stored messages)",
                        active.session_id, self.owner.user_id, active.stored_len
                    );
                }
                self.session_id = Some(active.session_id);
                self.topic = active.topic;
                self.messages = active.messages;
                self.synced_len = active.stored_len;
                self.phase = SessionPhase::Ready;
                Ok(active.session_id)
            }
            Err(e) => {
                self.phase = SessionPhase::Uninitialized;
                Err(e.into())
            }
        }
    }

    /// Runs one turn. The local log is advanced before the write and stays
    /// advanced if the write fails.
    pub async fn send(&mut self, text: &str) -> Result<SendOutcome, ConsultationError> {
        let Some(session_id) = self.session_id else {
            return Ok(SendOutcome::Skipped(SkipReason::NotReady));
        };
        let Some((messages, topic)) = compose_turn(&self.messages, text) else {
            return Ok(SendOutcome::Skipped(SkipReason::EmptyInput));
        };

        self.messages = messages;
        self.phase = SessionPhase::Pending;
        let written = persist_log(self.store.as_ref(), session_id, &self.messages).await;
        self.phase = SessionPhase::Ready;

        match written {
            Ok(()) => {
                self.synced_len = self.messages.len();
                info!(
                    "User {} consultation {} turn answered with {:?} advice ({} messages)",
                    self.owner.user_id,
                    session_id,
                    topic,
                    self.messages.len()
                );
                Ok(SendOutcome::Sent {
                    messages: self.messages.clone(),
                    topic,
                })
            }
            Err(e) => {
                warn!(
                    "Failed to persist consultation {session_id}; {} message(s) unsynced: {e}",
                    self.messages.len() - self.synced_len
                );
                self.forget_if_missing(&e);
                Err(e.into())
            }
        }
    }

    /// Rewrites the full local log if any of it is unconfirmed.
    /// Returns whether a write was issued.
    pub async fn resync(&mut self) -> Result<bool, ConsultationError> {
        let session_id = self.session_id.ok_or(ConsultationError::NotLoaded)?;
        if !self.pending_sync() {
            return Ok(false);
        }

        self.phase = SessionPhase::Pending;
        let written = persist_log(self.store.as_ref(), session_id, &self.messages).await;
        self.phase = SessionPhase::Ready;
        if let Err(e) = written {
            self.forget_if_missing(&e);
            return Err(e.into());
        }

        self.synced_len = self.messages.len();
        info!(
            "Resynced consultation {session_id} ({} messages)",
            self.messages.len()
        );
        Ok(true)
    }

    fn forget_if_missing(&mut self, error: &StoreError) {
        if let StoreError::NotFound(id) = error {
            warn!(
                "Consultation {id} no longer exists for user {}; unbinding",
                self.owner.user_id
            );
            self.session_id = None;
            self.messages = greeting_log();
            self.synced_len = 0;
            self.phase = SessionPhase::Uninitialized;
        }
    }
}
