//! Conversions between wire bodies and validated core types.

use api_shared::schema::{Paciente, Seguro, SeguroUpdate, UpdatePatientReq};
use pacientes_core::{
    Insurance, InsuranceUpdate, NationalId, NonEmptyText, PatientRecord, PatientResult,
    PatientUpdate,
};

/// Validates a create body into a patient record.
///
/// # Errors
///
/// Returns `PatientError::Text` if the DNI or a required name is invalid.
pub fn record_from_paciente(body: Paciente) -> PatientResult<PatientRecord> {
    let seguro = body
        .seguro
        .map(|s| -> PatientResult<Insurance> {
            Ok(Insurance {
                proveedor: NonEmptyText::new(s.proveedor)?,
                numero_poliza: s.numero_poliza,
                vencimiento: s.vencimiento,
            })
        })
        .transpose()?;

    Ok(PatientRecord {
        dni: NationalId::parse(&body.dni)?,
        nombres: NonEmptyText::new(&body.nombres)?,
        apellidos: NonEmptyText::new(&body.apellidos)?,
        fecha_nacimiento: body.fecha_nacimiento,
        sexo: body.sexo,
        telefono: body.telefono,
        correo: body.correo,
        direccion: body.direccion,
        seguro,
        datos_adicionales: body.datos_adicionales,
    })
}

pub fn paciente_from_record(record: PatientRecord) -> Paciente {
    Paciente {
        dni: record.dni.to_string(),
        nombres: record.nombres.to_string(),
        apellidos: record.apellidos.to_string(),
        fecha_nacimiento: record.fecha_nacimiento,
        sexo: record.sexo,
        telefono: record.telefono,
        correo: record.correo,
        direccion: record.direccion,
        seguro: record.seguro.map(|s| Seguro {
            proveedor: s.proveedor.to_string(),
            numero_poliza: s.numero_poliza,
            vencimiento: s.vencimiento,
        }),
        datos_adicionales: record.datos_adicionales,
    }
}

/// Validates an update body.
///
/// # Errors
///
/// Returns `PatientError::Text` if a supplied name or insurance provider is blank.
pub fn update_from_req(req: UpdatePatientReq) -> PatientResult<PatientUpdate> {
    let non_empty = |v: Option<String>| v.map(NonEmptyText::new).transpose();

    let seguro = req
        .seguro
        .map(|s: SeguroUpdate| -> PatientResult<InsuranceUpdate> {
            Ok(InsuranceUpdate {
                proveedor: non_empty(s.proveedor)?,
                numero_poliza: s.numero_poliza,
                vencimiento: s.vencimiento,
            })
        })
        .transpose()?;

    Ok(PatientUpdate {
        nombres: non_empty(req.nombres)?,
        apellidos: non_empty(req.apellidos)?,
        fecha_nacimiento: req.fecha_nacimiento,
        sexo: req.sexo,
        telefono: req.telefono,
        correo: req.correo,
        direccion: req.direccion,
        seguro,
        datos_adicionales: req.datos_adicionales,
    })
}
