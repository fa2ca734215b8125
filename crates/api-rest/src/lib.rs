//! # API REST
//!
//! REST API implementation for the pacientes service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Every patient route maps onto exactly one `PatientService` operation.

#![warn(rust_2018_idioms)]

pub mod convert;
pub mod error;
pub mod extract;
mod routes;

pub use error::ApiError;
pub use routes::{router, ApiDoc};

use pacientes_core::PatientService;

/// Serves the REST API on `addr` until the server stops.
///
/// # Errors
/// Returns an error if:
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
pub async fn serve(addr: &str, patient_service: PatientService) -> anyhow::Result<()> {
    let app = router(patient_service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- Pacientes REST API listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
