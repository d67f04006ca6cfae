use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::consultation::session::ConsultationManager;
use crate::consultation::store::ConsultationStore;
use crate::models::user::OwnerContext;

/// One `ConsultationManager` per owner for the lifetime of the process.
///
/// The per-owner mutex serializes turns for that owner; different owners
/// never wait on each other. Managers are never evicted.
pub struct SessionRegistry {
    store: Arc<dyn ConsultationStore>,
    topic: String,
    managers: RwLock<HashMap<Uuid, Arc<Mutex<ConsultationManager>>>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn ConsultationStore>, topic: String) -> Self {
        Self {
            store,
            topic,
            managers: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the owner's manager, creating an unloaded one on first use.
    pub async fn manager_for(&self, owner: &OwnerContext) -> Arc<Mutex<ConsultationManager>> {
        if let Some(existing) = self.managers.read().await.get(&owner.user_id) {
            return existing.clone();
        }

        let mut managers = self.managers.write().await;
        managers
            .entry(owner.user_id)
            .or_insert_with(|| {
                debug!("Registering consultation manager for user {}", owner.user_id);
                Arc::new(Mutex::new(ConsultationManager::new(
                    *owner,
                    self.store.clone(),
                    self.topic.clone(),
                )))
            })
            .clone()
    }

    /// Returns the owner's manager only if one was already registered.
    /// Read-only routes use this so unknown ids never grow the registry.
    pub async fn existing(&self, owner: &OwnerContext) -> Option<Arc<Mutex<ConsultationManager>>> {
        self.managers.read().await.get(&owner.user_id).cloned()
    }

    pub fn store(&self) -> &dyn ConsultationStore {
        self.store.as_ref()
    }

    /// Number of owners with a manager in this process.
    pub async fn loaded_owners(&self) -> usize {
        self.managers.read().await.len()
    }
}
