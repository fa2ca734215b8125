//! # API Shared
//!
//! Shared utilities and definitions for the pacientes APIs.
//!
//! Contains:
//! - JSON request/response bodies with OpenAPI schemas (`schema` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and kept free of core business logic.

pub mod health;
pub mod schema;

pub use health::HealthService;
pub use schema::*;
