use super::PatientStore;
use crate::record::{PatientRecord, PatientUpdate};
use crate::{PatientError, PatientResult};
use async_trait::async_trait;
use pacientes_types::NationalId;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-process patient store.
///
/// Records live in a map behind an async `RwLock`; nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<NationalId, PatientRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn list_all(&self) -> PatientResult<Vec<PatientRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn get(&self, dni: &NationalId) -> PatientResult<Option<PatientRecord>> {
        Ok(self.records.read().await.get(dni).cloned())
    }

    async fn insert(&self, record: PatientRecord) -> PatientResult<PatientRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.dni) {
            return Err(PatientError::DuplicateKey(record.dni.to_string()));
        }
        records.insert(record.dni.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, dni: &NationalId, update: &PatientUpdate) -> PatientResult<bool> {
        if update.is_empty() {
            return Ok(false);
        }
        let mut records = self.records.write().await;
        match records.get_mut(dni) {
            Some(record) => record.apply(update),
            None => Ok(false),
        }
    }

    async fn delete(&self, dni: &NationalId) -> PatientResult<bool> {
        Ok(self.records.write().await.remove(dni).is_some())
    }
}
