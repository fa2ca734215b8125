use crate::convert::{paciente_from_record, record_from_paciente, update_from_req};
use crate::error::ApiError;
use crate::extract::JsonBody;
use api_shared::schema::{
    DeletePatientRes, ErrorRes, HealthRes, ListPatientsRes, Paciente, Seguro, SeguroUpdate,
    UpdatePatientReq, UpdatePatientRes,
};
use api_shared::HealthService;
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use pacientes_core::{NationalId, PatientError, PatientService};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers
#[derive(Clone)]
struct AppState {
    patient_service: PatientService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        create_patient,
        get_patient,
        update_patient,
        delete_patient,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        Paciente,
        Seguro,
        ListPatientsRes,
        UpdatePatientReq,
        SeguroUpdate,
        UpdatePatientRes,
        DeletePatientRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router over `patient_service`.
///
/// Includes Swagger UI at `/swagger-ui` and the OpenAPI document at `/api-docs/openapi.json`.
pub fn router(patient_service: PatientService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/pacientes", get(list_patients).post(create_patient))
        .route(
            "/pacientes/:dni",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { patient_service })
}

fn parse_dni(raw: &str) -> Result<NationalId, ApiError> {
    NationalId::parse(raw).map_err(|e| ApiError(PatientError::from(e)))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/pacientes",
    responses(
        (status = 200, description = "List of patients", body = ListPatientsRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List all patients in the store
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<ListPatientsRes>, ApiError> {
    let patients = state
        .patient_service
        .list()
        .await?
        .into_iter()
        .map(paciente_from_record)
        .collect();
    Ok(Json(ListPatientsRes { patients }))
}

#[utoipa::path(
    post,
    path = "/pacientes",
    request_body = Paciente,
    responses(
        (status = 201, description = "Patient and clinical history created", body = Paciente),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 409, description = "A patient with this DNI already exists", body = ErrorRes),
        (status = 502, description = "Clinical history service failed; the patient may have been stored", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Create a patient and open its clinical history
///
/// The patient is stored first and the clinical history service is called afterwards. A `502`
/// after a successful insert leaves the patient stored without a clinical history.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<Paciente>,
) -> Result<(StatusCode, Json<Paciente>), ApiError> {
    let record = record_from_paciente(req)?;
    let created = state.patient_service.create(record).await?;
    Ok((StatusCode::CREATED, Json(paciente_from_record(created))))
}

#[utoipa::path(
    get,
    path = "/pacientes/{dni}",
    params(("dni" = String, Path, description = "National identity number")),
    responses(
        (status = 200, description = "Patient found", body = Paciente),
        (status = 400, description = "Invalid DNI", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Fetch one patient by DNI
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    AxumPath(dni): AxumPath<String>,
) -> Result<Json<Paciente>, ApiError> {
    let dni = parse_dni(&dni)?;
    let record = state.patient_service.get(&dni).await?;
    Ok(Json(paciente_from_record(record)))
}

#[utoipa::path(
    put,
    path = "/pacientes/{dni}",
    params(("dni" = String, Path, description = "National identity number")),
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Update applied; `updated` is false when nothing changed or no patient matched", body = UpdatePatientRes),
        (status = 400, description = "Empty or invalid update", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Partially update a patient
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    AxumPath(dni): AxumPath<String>,
    JsonBody(req): JsonBody<UpdatePatientReq>,
) -> Result<Json<UpdatePatientRes>, ApiError> {
    let dni = parse_dni(&dni)?;
    let update = update_from_req(req)?;
    if update.is_empty() {
        return Err(ApiError(PatientError::InvalidInput(
            "update payload cannot be empty".into(),
        )));
    }

    let updated = state.patient_service.update(&dni, &update).await?;
    Ok(Json(UpdatePatientRes { updated }))
}

#[utoipa::path(
    delete,
    path = "/pacientes/{dni}",
    params(("dni" = String, Path, description = "National identity number")),
    responses(
        (status = 200, description = "Clinical history and patient deleted", body = DeletePatientRes),
        (status = 400, description = "Invalid DNI", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes),
        (status = 502, description = "Clinical history service failed; the patient was kept", body = ErrorRes)
    )
)]
/// Delete a patient and its clinical history
#[axum::debug_handler]
async fn delete_patient(
    State(state): State<AppState>,
    AxumPath(dni): AxumPath<String>,
) -> Result<Json<DeletePatientRes>, ApiError> {
    let dni = parse_dni(&dni)?;
    state.patient_service.delete(&dni).await?;
    Ok(Json(DeletePatientRes { deleted: true }))
}
