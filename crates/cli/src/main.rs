use anyhow::Context;
use clap::{Parser, Subcommand};
use pacientes_core::{CoreConfig, NationalId, PatientRecord, PatientService, PatientUpdate};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pacientes")]
#[command(about = "Pacientes patient record service CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    List,
    /// Show one patient
    Get {
        /// National identity number
        dni: String,
    },
    /// Create a patient and its clinical history
    Create {
        /// JSON file holding the patient document
        file: PathBuf,
    },
    /// Apply a partial update to a patient
    Update {
        /// National identity number
        dni: String,
        /// JSON file holding the fields to change
        file: PathBuf,
    },
    /// Delete a patient and its clinical history
    Delete {
        /// National identity number
        dni: String,
    },
}

async fn read_json<T: serde::de::DeserializeOwned>(file: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", file.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = CoreConfig::from_env()?;
    let service = PatientService::from_config(&cfg).await?;

    match cli.command {
        Commands::List => {
            let patients = service.list().await?;
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in patients {
                    println!(
                        "DNI: {}, Name: {} {}, Born: {}",
                        patient.dni, patient.nombres, patient.apellidos, patient.fecha_nacimiento
                    );
                }
            }
        }
        Commands::Get { dni } => {
            let patient = service.get(&NationalId::parse(&dni)?).await?;
            println!("{}", serde_json::to_string_pretty(&patient)?);
        }
        Commands::Create { file } => {
            let record: PatientRecord = read_json(&file).await?;
            let created = service.create(record).await?;
            println!("Created patient {}", created.dni);
        }
        Commands::Update { dni, file } => {
            let update: PatientUpdate = read_json(&file).await?;
            let dni = NationalId::parse(&dni)?;
            if service.update(&dni, &update).await? {
                println!("Updated patient {dni}");
            } else {
                println!("No changes applied to {dni}");
            }
        }
        Commands::Delete { dni } => {
            let dni = NationalId::parse(&dni)?;
            service.delete(&dni).await?;
            println!("Deleted patient {dni}");
        }
    }

    Ok(())
}
