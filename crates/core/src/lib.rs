//! # Pacientes Core
//!
//! Core business logic for the pacientes service.
//!
//! This crate contains the patient data operations:
//! - The patient document model and its partial-update merge rules
//! - The patient store (file-backed JSON documents, or in memory)
//! - The client that opens and deletes clinical histories in the downstream service
//! - [`PatientService`], which sequences the two for create and delete
//!
//! **No API concerns**: HTTP servers, routing and request parsing belong in `api-rest` and
//! `api-shared`.

pub mod clinical_history;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod patient;
pub mod record;
pub mod store;

pub use clinical_history::{ClinicalHistoryNotifier, HttpClinicalHistoryNotifier};
pub use clock::{Clock, SystemClock};
pub use config::CoreConfig;
pub use error::{PatientError, PatientResult};
pub use pacientes_types::{NationalId, NonEmptyText, TextError};
pub use patient::PatientService;
pub use record::{Insurance, InsuranceUpdate, PatientRecord, PatientUpdate};
pub use store::{FileStore, MemoryStore, PatientStore};
