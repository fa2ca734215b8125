//! Mapping of core errors onto HTTP responses.

use api_shared::schema::ErrorRes;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use pacientes_core::PatientError;

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub PatientError);

impl From<PatientError> for ApiError {
    fn from(e: PatientError) -> Self {
        Self(e)
    }
}

/// Malformed or mistyped request bodies are client errors.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PatientError::InvalidInput(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PatientError::InvalidInput(_) | PatientError::Text(_) => StatusCode::BAD_REQUEST,
            PatientError::NotFound(_) => StatusCode::NOT_FOUND,
            PatientError::DuplicateKey(_) => StatusCode::CONFLICT,
            e if e.is_downstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {:?}", self.0);
            "Internal error".to_string()
        } else {
            if status.is_server_error() {
                tracing::error!("Downstream error: {}", self.0);
            }
            self.0.to_string()
        };

        (status, Json(ErrorRes { message })).into_response()
    }
}
