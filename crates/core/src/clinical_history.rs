//! Clinical history service client.
//!
//! The clinical history of a patient lives in a separate service. This module only ever asks
//! that service to create or delete the history tied to a DNI; it never reads one back.
//!
//! - `POST {base}/historias-clinicas` with `{"fechaCreacion": "YYYY-MM-DD", "dniPaciente": ".."}`,
//!   successful on 200 or 201
//! - `DELETE {base}/historias-clinicas/{dni}`, successful on 200 or 204
//!
//! Any other status, and any transport error (including the client timeout), is a hard failure.
//! Nothing is retried.

use crate::config::CoreConfig;
use crate::constants::CLINICAL_HISTORY_PATH;
use crate::{PatientError, PatientResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use pacientes_types::NationalId;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

const CREATE_SUCCESS: [StatusCode; 2] = [StatusCode::OK, StatusCode::CREATED];
const DELETE_SUCCESS: [StatusCode; 2] = [StatusCode::OK, StatusCode::NO_CONTENT];

/// Notifies the clinical history service about patient creation and deletion.
#[async_trait]
pub trait ClinicalHistoryNotifier: Send + Sync {
    /// Asks the downstream service to open a clinical history for `dni`.
    async fn notify_create(&self, dni: &NationalId, fecha_creacion: NaiveDate)
        -> PatientResult<()>;

    /// Asks the downstream service to delete the clinical history of `dni`.
    async fn notify_delete(&self, dni: &NationalId) -> PatientResult<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewClinicalHistory<'a> {
    fecha_creacion: NaiveDate,
    dni_paciente: &'a str,
}

/// HTTP implementation of [`ClinicalHistoryNotifier`].
#[derive(Clone, Debug)]
pub struct HttpClinicalHistoryNotifier {
    client: Client,
    base_url: String,
}

impl HttpClinicalHistoryNotifier {
    /// Builds a notifier for the service and timeout configured in `cfg`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::HttpClient` if the HTTP client cannot be constructed.
    pub fn new(cfg: &CoreConfig) -> PatientResult<Self> {
        Self::with_base_url(
            cfg.clinical_history_base_url(),
            cfg.clinical_history_timeout(),
        )
    }

    /// Builds a notifier for an explicit base URL such as `http://localhost:8080`.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> PatientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PatientError::HttpClient)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, CLINICAL_HISTORY_PATH)
    }

    async fn check_status(
        response: reqwest::Response,
        accepted: &[StatusCode],
        action: &str,
        dni: &NationalId,
    ) -> PatientResult<()> {
        let status = response.status();
        if accepted.contains(&status) {
            tracing::info!("clinical history {} for {}: {}", action, dni, status);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            "clinical history {} for {} failed, status {}: {}",
            action,
            dni,
            status,
            body
        );
        Err(PatientError::DownstreamStatus {
            status: status.as_u16(),
            body,
        })
    }
}

fn transport_error(action: &str, dni: &NationalId, e: reqwest::Error) -> PatientError {
    tracing::error!("clinical history {} for {} failed: {}", action, dni, e);
    PatientError::DownstreamTransport(e)
}

#[async_trait]
impl ClinicalHistoryNotifier for HttpClinicalHistoryNotifier {
    async fn notify_create(
        &self,
        dni: &NationalId,
        fecha_creacion: NaiveDate,
    ) -> PatientResult<()> {
        let body = NewClinicalHistory {
            fecha_creacion,
            dni_paciente: dni.as_str(),
        };

        let response = self
            .client
            .post(self.collection_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("create", dni, e))?;

        Self::check_status(response, &CREATE_SUCCESS, "create", dni).await
    }

    async fn notify_delete(&self, dni: &NationalId) -> PatientResult<()> {
        let response = self
            .client
            .delete(format!("{}/{}", self.collection_url(), dni))
            .send()
            .await
            .map_err(|e| transport_error("delete", dni, e))?;

        Self::check_status(response, &DELETE_SUCCESS, "delete", dni).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dni() -> NationalId {
        NationalId::parse("12345678").unwrap()
    }

    fn fecha() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    fn notifier(server: &MockServer) -> HttpClinicalHistoryNotifier {
        HttpClinicalHistoryNotifier::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn create_posts_date_and_dni() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/historias-clinicas"))
            .and(body_json(json!({
                "fechaCreacion": "2024-05-17",
                "dniPaciente": "12345678"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server)
            .notify_create(&dni(), fecha())
            .await
            .expect("201 should be accepted");
    }

    #[tokio::test]
    async fn create_accepts_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(notifier(&server).notify_create(&dni(), fecha()).await.is_ok());
    }

    #[tokio::test]
    async fn create_rejects_other_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = notifier(&server)
            .notify_create(&dni(), fecha())
            .await
            .unwrap_err();
        assert!(
            matches!(&err, PatientError::DownstreamStatus { status: 500, body } if body == "boom")
        );
        assert!(err.is_downstream());
    }

    #[tokio::test]
    async fn create_does_not_accept_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = notifier(&server)
            .notify_create(&dni(), fecha())
            .await
            .unwrap_err();
        assert!(matches!(err, PatientError::DownstreamStatus { status: 204, .. }));
    }

    #[tokio::test]
    async fn delete_targets_dni_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/historias-clinicas/12345678"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server)
            .notify_delete(&dni())
            .await
            .expect("204 should be accepted");
    }

    #[tokio::test]
    async fn delete_rejects_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = notifier(&server).notify_delete(&dni()).await.unwrap_err();
        assert!(matches!(err, PatientError::DownstreamStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn slow_downstream_hits_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let notifier =
            HttpClinicalHistoryNotifier::with_base_url(&server.uri(), Duration::from_millis(100))
                .unwrap();
        let err = notifier.notify_delete(&dni()).await.unwrap_err();
        assert!(matches!(err, PatientError::DownstreamTransport(_)));
    }
}
