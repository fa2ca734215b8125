//! Patient document store.
//!
//! The store holds one collection of [`PatientRecord`] documents keyed by the caller-supplied
//! national identity number. Uniqueness of the key is enforced by the store itself, so two
//! concurrent inserts of the same DNI resolve to exactly one success and one
//! [`PatientError::DuplicateKey`](crate::PatientError::DuplicateKey).
//!
//! Two implementations are provided:
//!
//! - [`FileStore`]: JSON documents on disk, sharded by the first two characters of the DNI
//! - [`MemoryStore`]: an in-process map, used as a fake in tests

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::record::{PatientRecord, PatientUpdate};
use crate::PatientResult;
use async_trait::async_trait;
use pacientes_types::NationalId;

/// Operations over the patient collection.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Returns every stored record. Order is unspecified.
    async fn list_all(&self) -> PatientResult<Vec<PatientRecord>>;

    /// Point lookup by identifier.
    async fn get(&self, dni: &NationalId) -> PatientResult<Option<PatientRecord>>;

    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::DuplicateKey` if a record with the same DNI already exists.
    async fn insert(&self, record: PatientRecord) -> PatientResult<PatientRecord>;

    /// Merges `update` into the record stored under `dni`.
    ///
    /// Returns `false` when no record matches or the update is empty; otherwise whether any
    /// field actually changed.
    async fn update(&self, dni: &NationalId, update: &PatientUpdate) -> PatientResult<bool>;

    /// Removes the record stored under `dni`. Returns `false` if there was none.
    async fn delete(&self, dni: &NationalId) -> PatientResult<bool>;
}
