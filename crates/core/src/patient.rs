//! Patient service.
//!
//! `PatientService` is the one place where the patient store and the clinical history service
//! are used together. Reads and updates only touch the store. Creation and deletion are two-step
//! sequences with no transaction spanning both systems:
//!
//! - **create**: insert locally, then ask the clinical history service to open a history dated
//!   today in the reference time zone. If that request fails the caller gets an error, but the
//!   inserted patient is **not** rolled back. The store then holds a patient without a clinical
//!   history; the error returned is [`PatientError::ClinicalHistoryNotCreated`], which names the
//!   orphaned DNI so an operator can reconcile it.
//! - **delete**: look the patient up, delete the downstream history, and only then delete the
//!   local record. A downstream failure leaves the local record in place.
//!
//! Nothing is retried and no compensating action is taken.

use crate::clinical_history::{ClinicalHistoryNotifier, HttpClinicalHistoryNotifier};
use crate::clock::{calendar_date_in, Clock, SystemClock};
use crate::config::CoreConfig;
use crate::record::{PatientRecord, PatientUpdate};
use crate::store::{FileStore, PatientStore};
use crate::{PatientError, PatientResult};
use chrono_tz::Tz;
use pacientes_types::NationalId;
use std::sync::Arc;

/// Patient operations over an injected store and clinical history client.
#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn PatientStore>,
    notifier: Arc<dyn ClinicalHistoryNotifier>,
    clock: Arc<dyn Clock>,
    reference_tz: Tz,
}

impl PatientService {
    /// Creates a service from explicit dependencies.
    ///
    /// # Arguments
    ///
    /// * `store` - Patient document store
    /// * `notifier` - Client for the clinical history service
    /// * `clock` - Source of "now" for clinical history creation dates
    /// * `reference_tz` - Time zone in which the creation date is computed
    pub fn new(
        store: Arc<dyn PatientStore>,
        notifier: Arc<dyn ClinicalHistoryNotifier>,
        clock: Arc<dyn Clock>,
        reference_tz: Tz,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            reference_tz,
        }
    }

    /// Creates the production service: file store, HTTP notifier and system clock.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if the collection directory cannot be created or the HTTP client
    /// cannot be built.
    pub async fn from_config(cfg: &CoreConfig) -> PatientResult<Self> {
        let store = FileStore::open(cfg).await?;
        let notifier = HttpClinicalHistoryNotifier::new(cfg)?;

        Ok(Self::new(
            Arc::new(store),
            Arc::new(notifier),
            Arc::new(SystemClock),
            cfg.reference_tz(),
        ))
    }

    /// Lists every stored patient.
    pub async fn list(&self) -> PatientResult<Vec<PatientRecord>> {
        self.store.list_all().await
    }

    /// Fetches one patient.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if no patient has this DNI.
    pub async fn get(&self, dni: &NationalId) -> PatientResult<PatientRecord> {
        self.store
            .get(dni)
            .await?
            .ok_or_else(|| PatientError::NotFound(dni.to_string()))
    }

    /// Stores a new patient and opens its clinical history.
    ///
    /// # Errors
    ///
    /// - `PatientError::DuplicateKey` if the DNI is taken; no downstream request is made.
    /// - Any store error from the insert; no downstream request is made.
    /// - `PatientError::ClinicalHistoryNotCreated` if the downstream request fails. The patient
    ///   has already been stored at that point and stays stored.
    pub async fn create(&self, record: PatientRecord) -> PatientResult<PatientRecord> {
        let stored = self.store.insert(record).await?;
        tracing::info!("patient {} stored", stored.dni);

        let fecha_creacion = calendar_date_in(self.clock.now(), self.reference_tz);

        if let Err(e) = self.notifier.notify_create(&stored.dni, fecha_creacion).await {
            // The insert is kept: the store now holds a patient with no clinical history.
            tracing::error!(
                "patient {} stored without clinical history: {}",
                stored.dni,
                e
            );
            return Err(PatientError::ClinicalHistoryNotCreated {
                dni: stored.dni.to_string(),
                source: Box::new(e),
            });
        }

        Ok(stored)
    }

    /// Applies a partial update to a patient.
    ///
    /// Returns `false` for an empty update or an unknown DNI, otherwise whether anything
    /// changed. The clinical history service is not involved.
    pub async fn update(&self, dni: &NationalId, update: &PatientUpdate) -> PatientResult<bool> {
        if update.is_empty() {
            tracing::debug!("empty update for {} ignored", dni);
            return Ok(false);
        }
        self.store.update(dni, update).await
    }

    /// Deletes a patient's clinical history and then the patient.
    ///
    /// # Errors
    ///
    /// - `PatientError::NotFound` if no patient has this DNI; no downstream request is made.
    /// - A downstream error if the clinical history could not be deleted; the patient is kept.
    pub async fn delete(&self, dni: &NationalId) -> PatientResult<()> {
        if self.store.get(dni).await?.is_none() {
            return Err(PatientError::NotFound(dni.to_string()));
        }

        self.notifier.notify_delete(dni).await?;

        if !self.store.delete(dni).await? {
            // Removed by a concurrent request after our lookup.
            return Err(PatientError::NotFound(dni.to_string()));
        }

        tracing::info!("patient {} deleted", dni);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::{date, sample_record};
    use crate::record::InsuranceUpdate;
    use crate::store::MemoryStore;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn service_with(
        store: Arc<MemoryStore>,
        server: &MockServer,
        clock: Arc<dyn Clock>,
    ) -> PatientService {
        let notifier =
            HttpClinicalHistoryNotifier::with_base_url(&server.uri(), Duration::from_secs(5))
                .unwrap();
        PatientService::new(store, Arc::new(notifier), clock, chrono_tz::America::Lima)
    }

    fn service(store: Arc<MemoryStore>, server: &MockServer) -> PatientService {
        service_with(store, server, Arc::new(SystemClock))
    }

    fn dni(s: &str) -> NationalId {
        NationalId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn create_stores_record_and_opens_history_for_today_in_lima() {
        let server = MockServer::start().await;
        let today = calendar_date_in(Utc::now(), chrono_tz::America::Lima);
        Mock::given(method("POST"))
            .and(path("/historias-clinicas"))
            .and(body_json(json!({
                "fechaCreacion": today.format("%Y-%m-%d").to_string(),
                "dniPaciente": "12345678"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), &server);

        let created = svc.create(sample_record("12345678")).await.unwrap();
        assert_eq!(created, sample_record("12345678"));
        assert_eq!(svc.get(&dni("12345678")).await.unwrap(), created);
    }

    #[tokio::test]
    async fn create_dates_history_in_reference_time_zone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "fechaCreacion": "2024-02-29",
                "dniPaciente": "12345678"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 3, 1, 3, 30, 0).unwrap(),
        ));
        let svc = service_with(Arc::new(MemoryStore::new()), &server, clock);

        svc.create(sample_record("12345678")).await.unwrap();
    }

    #[tokio::test]
    async fn create_keeps_orphaned_record_when_history_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), &server);

        let err = svc.create(sample_record("12345678")).await.unwrap_err();
        match &err {
            PatientError::ClinicalHistoryNotCreated { dni, source } => {
                assert_eq!(dni, "12345678");
                assert!(matches!(
                    **source,
                    PatientError::DownstreamStatus { status: 500, .. }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_downstream());

        // No rollback: the patient exists without a clinical history.
        assert!(store.get(&dni("12345678")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_keeps_record_when_history_service_is_unreachable() {
        // Reserve a port, then free it so nothing is listening there.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let notifier = HttpClinicalHistoryNotifier::with_base_url(
            &format!("http://127.0.0.1:{port}"),
            Duration::from_secs(2),
        )
        .unwrap();

        let store = Arc::new(MemoryStore::new());
        let svc = PatientService::new(
            store.clone(),
            Arc::new(notifier),
            Arc::new(SystemClock),
            chrono_tz::America::Lima,
        );

        let err = svc.create(sample_record("12345678")).await.unwrap_err();
        match &err {
            PatientError::ClinicalHistoryNotCreated { dni, source } => {
                assert_eq!(dni, "12345678");
                assert!(matches!(**source, PatientError::DownstreamTransport(_)));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(store.get(&dni("12345678")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_create_fails_without_downstream_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let svc = service(Arc::new(MemoryStore::new()), &server);

        svc.create(sample_record("12345678")).await.unwrap();
        let err = svc.create(sample_record("12345678")).await.unwrap_err();
        assert!(matches!(err, PatientError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn concurrent_creates_with_distinct_dnis_all_succeed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(4)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), &server);

        let handles: Vec<_> = ["10000001", "10000002", "10000003", "10000004"]
            .into_iter()
            .map(|id| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.create(sample_record(id)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn delete_of_unknown_patient_makes_no_downstream_call() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let svc = service(Arc::new(MemoryStore::new()), &server);

        let err = svc.delete(&dni("87654321")).await.unwrap_err();
        assert!(matches!(err, PatientError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_history_then_patient() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/historias-clinicas/12345678"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.insert(sample_record("12345678")).await.unwrap();
        let svc = service(store.clone(), &server);

        svc.delete(&dni("12345678")).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn delete_keeps_patient_when_history_deletion_fails() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.insert(sample_record("12345678")).await.unwrap();
        let svc = service(store.clone(), &server);

        let err = svc.delete(&dni("12345678")).await.unwrap_err();
        assert!(err.is_downstream());
        assert!(store.get(&dni("12345678")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_update_returns_false_and_leaves_record() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store.insert(sample_record("12345678")).await.unwrap();
        let svc = service(store.clone(), &server);

        assert!(!svc
            .update(&dni("12345678"), &PatientUpdate::default())
            .await
            .unwrap());
        assert_eq!(
            svc.get(&dni("12345678")).await.unwrap(),
            sample_record("12345678")
        );
    }

    #[tokio::test]
    async fn update_merges_insurance_without_downstream_calls() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.insert(sample_record("12345678")).await.unwrap();
        let svc = service(store.clone(), &server);

        let update = PatientUpdate {
            seguro: Some(InsuranceUpdate {
                vencimiento: Some(date("2026-01-01")),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(svc.update(&dni("12345678"), &update).await.unwrap());
        assert!(!svc.update(&dni("00000000"), &update).await.unwrap());

        let seguro = svc.get(&dni("12345678")).await.unwrap().seguro.unwrap();
        assert_eq!(seguro.proveedor.as_str(), "A");
        assert_eq!(seguro.vencimiento, date("2026-01-01"));
    }

    #[tokio::test]
    async fn get_unknown_patient_is_not_found() {
        let server = MockServer::start().await;
        let svc = service(Arc::new(MemoryStore::new()), &server);

        let err = svc.get(&dni("12345678")).await.unwrap_err();
        assert!(matches!(err, PatientError::NotFound(d) if d == "12345678"));
        assert!(svc.list().await.unwrap().is_empty());
    }
}
