//! Store wrapper for tests: counts calls, records every update and can be
//! switched into failure modes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::consultation::memory_store::InMemoryConsultationStore;
use crate::consultation::store::{
    ConsultationFilter, ConsultationPatch, ConsultationStore, NewConsultation, OrderBy, StoreError,
};
use crate::models::consultation::ConsultationRow;

#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryConsultationStore,
    finds: AtomicUsize,
    inserts: AtomicUsize,
    updates: Mutex<Vec<(Uuid, ConsultationPatch)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    hide_next_find: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryConsultationStore {
        &self.inner
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes the next `find` return no rows, simulating a row created
    /// concurrently right after our read.
    pub fn hide_next_find(&self) {
        self.hide_next_find.store(true, Ordering::SeqCst);
    }

    pub fn find_count(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    /// Successful inserts only.
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Every update attempted while writes were enabled.
    pub fn updates(&self) -> Vec<(Uuid, ConsultationPatch)> {
        self.updates.lock().unwrap().clone()
    }

    /// Serialized size of each recorded message log.
    pub fn update_bytes(&self) -> Vec<usize> {
        self.updates()
            .iter()
            .map(|(_, patch)| serde_json::to_vec(&patch.messages).unwrap().len())
            .collect()
    }
}

#[async_trait]
impl ConsultationStore for RecordingStore {
    async fn find(
        &self,
        filter: &ConsultationFilter,
        order: OrderBy,
        limit: Option<usize>,
    ) -> Result<Vec<ConsultationRow>, StoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        if self.hide_next_find.swap(false, Ordering::SeqCst) {
            return Ok(vec![]);
        }
        self.inner.find(filter, order, limit).await
    }

    async fn insert(&self, record: NewConsultation) -> Result<ConsultationRow, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        let row = self.inner.insert(record).await?;
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: ConsultationPatch) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        self.updates.lock().unwrap().push((id, patch.clone()));
        self.inner.update(id, patch).await
    }
}
