//! Request and response bodies of the pacientes API.
//!
//! These are the JSON shapes on the wire. They carry no validation beyond what serde enforces;
//! the REST layer converts them into the validated core types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Seguro {
    pub proveedor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero_poliza: Option<String>,
    /// Expiration date, `YYYY-MM-DD`.
    pub vencimiento: NaiveDate,
}

/// A patient as sent on create and returned on reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Paciente {
    /// National identity number, the patient key.
    #[schema(example = "12345678")]
    pub dni: String,
    pub nombres: String,
    pub apellidos: String,
    pub fecha_nacimiento: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sexo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seguro: Option<Seguro>,
    /// Any other top-level demographic fields, kept as sent.
    #[serde(flatten)]
    pub datos_adicionales: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<Paciente>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SeguroUpdate {
    #[serde(default)]
    pub proveedor: Option<String>,
    #[serde(default)]
    pub numero_poliza: Option<String>,
    #[serde(default)]
    pub vencimiento: Option<NaiveDate>,
}

/// Partial update; omitted fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdatePatientReq {
    #[serde(default)]
    pub nombres: Option<String>,
    #[serde(default)]
    pub apellidos: Option<String>,
    #[serde(default)]
    pub fecha_nacimiento: Option<NaiveDate>,
    #[serde(default)]
    pub sexo: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub correo: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub seguro: Option<SeguroUpdate>,
    /// Other top-level fields to set.
    #[serde(flatten)]
    pub datos_adicionales: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdatePatientRes {
    /// Whether any stored field changed.
    pub updated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeletePatientRes {
    pub deleted: bool,
}
