//! Constants used throughout the pacientes core crate.

/// Default root directory for the document store.
pub const DEFAULT_DATA_DIR: &str = "pacientes_data";

/// Default database name (a directory under the data root).
pub const DEFAULT_DATABASE: &str = "hospital";

/// Default collection holding patient documents.
pub const DEFAULT_COLLECTION: &str = "Pacientes";

/// File extension of stored patient documents.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Default host of the clinical history service.
pub const DEFAULT_CLINICAL_HISTORY_HOST: &str = "localhost";

/// Port the clinical history service listens on.
pub const CLINICAL_HISTORY_PORT: u16 = 8080;

/// Path of the clinical history collection on the downstream service.
pub const CLINICAL_HISTORY_PATH: &str = "historias-clinicas";

/// Timeout applied to every clinical history request unless overridden.
pub const DEFAULT_CLINICAL_HISTORY_TIMEOUT_SECS: u64 = 10;

/// Time zone in which clinical history creation dates are computed.
pub const DEFAULT_REFERENCE_TIME_ZONE: chrono_tz::Tz = chrono_tz::America::Lima;
