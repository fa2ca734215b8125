//! Patient record model.
//!
//! A [`PatientRecord`] is the document kept in the patient collection. Partial updates are
//! expressed as a [`PatientUpdate`] where every mutable field is optional; the identifier is
//! deliberately absent from the update type so it can never change after insertion.

use crate::{PatientError, PatientResult};
use chrono::NaiveDate;
use pacientes_types::{NationalId, NonEmptyText};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Insurance sub-record of a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insurance {
    pub proveedor: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero_poliza: Option<String>,
    /// Expiration date of the policy.
    pub vencimiento: NaiveDate,
}

/// A stored patient document, keyed by national identity number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub dni: NationalId,
    pub nombres: NonEmptyText,
    pub apellidos: NonEmptyText,
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
    pub seguro: Option<Insurance>,
    /// Other top-level demographic fields, stored as given.
    #[serde(flatten)]
    pub datos_adicionales: BTreeMap<String, Value>,
}

/// Partial update of the insurance sub-record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsuranceUpdate {
    #[serde(default)]
    pub proveedor: Option<NonEmptyText>,
    #[serde(default)]
    pub numero_poliza: Option<String>,
    #[serde(default)]
    pub vencimiento: Option<NaiveDate>,
}

impl InsuranceUpdate {
    pub fn is_empty(&self) -> bool {
        self.proveedor.is_none() && self.numero_poliza.is_none() && self.vencimiento.is_none()
    }
}

/// Partial update of a patient record.
///
/// Fields left as `None` are untouched. `seguro` is merged field by field into the stored
/// insurance, and `datos_adicionales` entries are merged key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientUpdate {
    #[serde(default)]
    pub nombres: Option<NonEmptyText>,
    #[serde(default)]
    pub apellidos: Option<NonEmptyText>,
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
    pub seguro: Option<InsuranceUpdate>,
    #[serde(flatten)]
    pub datos_adicionales: BTreeMap<String, Value>,
}

impl PatientUpdate {
    /// True when the update carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.nombres.is_none()
            && self.apellidos.is_none()
            && self.fecha_nacimiento.is_none()
            && self.sexo.is_none()
            && self.telefono.is_none()
            && self.correo.is_none()
            && self.direccion.is_none()
            && self.seguro.as_ref().map_or(true, InsuranceUpdate::is_empty)
            && self.datos_adicionales.is_empty()
    }
}

impl PatientRecord {
    /// Merges `update` into this record.
    ///
    /// Returns whether any field actually changed. The record is left untouched when the update
    /// is rejected.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if the record has no insurance yet and the update
    /// supplies one without both `proveedor` and `vencimiento`.
    pub fn apply(&mut self, update: &PatientUpdate) -> PatientResult<bool> {
        let mut merged = self.clone();

        if let Some(nombres) = &update.nombres {
            merged.nombres = nombres.clone();
        }
        if let Some(apellidos) = &update.apellidos {
            merged.apellidos = apellidos.clone();
        }
        if let Some(fecha_nacimiento) = update.fecha_nacimiento {
            merged.fecha_nacimiento = fecha_nacimiento;
        }
        if let Some(sexo) = &update.sexo {
            merged.sexo = Some(sexo.clone());
        }
        if let Some(telefono) = &update.telefono {
            merged.telefono = Some(telefono.clone());
        }
        if let Some(correo) = &update.correo {
            merged.correo = Some(correo.clone());
        }
        if let Some(direccion) = &update.direccion {
            merged.direccion = Some(direccion.clone());
        }
        if let Some(seguro) = update.seguro.as_ref().filter(|s| !s.is_empty()) {
            merged.seguro = Some(merge_insurance(merged.seguro.take(), seguro)?);
        }
        for (key, value) in &update.datos_adicionales {
            merged.datos_adicionales.insert(key.clone(), value.clone());
        }

        if merged == *self {
            return Ok(false);
        }
        *self = merged;
        Ok(true)
    }
}

fn merge_insurance(
    existing: Option<Insurance>,
    update: &InsuranceUpdate,
) -> PatientResult<Insurance> {
    match existing {
        Some(mut insurance) => {
            if let Some(proveedor) = &update.proveedor {
                insurance.proveedor = proveedor.clone();
            }
            if let Some(numero_poliza) = &update.numero_poliza {
                insurance.numero_poliza = Some(numero_poliza.clone());
            }
            if let Some(vencimiento) = update.vencimiento {
                insurance.vencimiento = vencimiento;
            }
            Ok(insurance)
        }
        None => match (&update.proveedor, update.vencimiento) {
            (Some(proveedor), Some(vencimiento)) => Ok(Insurance {
                proveedor: proveedor.clone(),
                numero_poliza: update.numero_poliza.clone(),
                vencimiento,
            }),
            _ => Err(PatientError::InvalidInput(
                "a new seguro requires both proveedor and vencimiento".into(),
            )),
        },
    }
}
