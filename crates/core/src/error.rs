use pacientes_types::TextError;

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid text: {0}")]
    Text(#[from] TextError),

    #[error("patient not found: {0}")]
    NotFound(String),
    #[error("a patient with DNI {0} already exists")]
    DuplicateKey(String),

    #[error("failed to create store directory: {0}")]
    StoreDirCreation(std::io::Error),
    #[error("failed to read patient document: {0}")]
    StoreRead(std::io::Error),
    #[error("failed to write patient document: {0}")]
    StoreWrite(std::io::Error),
    #[error("failed to delete patient document: {0}")]
    StoreDelete(std::io::Error),
    #[error("failed to serialize patient: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize patient: {0}")]
    Deserialization(serde_json::Error),

    #[error("failed to build clinical history client: {0}")]
    HttpClient(reqwest::Error),
    #[error("clinical history request failed: {0}")]
    DownstreamTransport(reqwest::Error),
    #[error("clinical history service responded {status}: {body}")]
    DownstreamStatus { status: u16, body: String },
    #[error(
        "patient {dni} was stored but its clinical history could not be created: {source}"
    )]
    ClinicalHistoryNotCreated {
        dni: String,
        #[source]
        source: Box<PatientError>,
    },
}

impl PatientError {
    /// True for failures originating in the clinical history service.
    pub fn is_downstream(&self) -> bool {
        matches!(
            self,
            PatientError::DownstreamTransport(_)
                | PatientError::DownstreamStatus { .. }
                | PatientError::ClinicalHistoryNotCreated { .. }
        )
    }
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
