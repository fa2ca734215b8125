use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pacientes_core::{CoreConfig, PatientService};

/// Main entry point for the pacientes service
///
/// Resolves configuration once, builds the patient service (file store, clinical history
/// client, system clock) and serves the REST API.
///
/// # Environment Variables
/// - `PACIENTES_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
/// - `PACIENTES_DATA_DIR`, `PACIENTES_DATABASE`, `PACIENTES_COLLECTION`: document store location
/// - `CLINICAL_HISTORY_HOST`: clinical history service host, port 8080
/// - `CLINICAL_HISTORY_TIMEOUT_SECS`: clinical history request timeout
/// - `REFERENCE_TIME_ZONE`: time zone for clinical history creation dates
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pacientes_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("PACIENTES_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());

    let cfg = CoreConfig::from_env()?;
    tracing::info!(
        "++ Patient collection at {}, clinical history at {} (timeout {:?}, zone {})",
        cfg.collection_dir().display(),
        cfg.clinical_history_base_url(),
        cfg.clinical_history_timeout(),
        cfg.reference_tz()
    );

    let patient_service = PatientService::from_config(&cfg).await?;

    tracing::info!("++ Starting pacientes REST on {}", rest_addr);
    api_rest::serve(&rest_addr, patient_service).await
}
