//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    CLINICAL_HISTORY_PORT, DEFAULT_CLINICAL_HISTORY_HOST, DEFAULT_CLINICAL_HISTORY_TIMEOUT_SECS,
    DEFAULT_COLLECTION, DEFAULT_DATABASE, DEFAULT_DATA_DIR, DEFAULT_REFERENCE_TIME_ZONE,
};
use crate::{PatientError, PatientResult};
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    database: String,
    collection: String,
    clinical_history_base_url: String,
    clinical_history_timeout: Duration,
    reference_tz: Tz,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `clinical_history_base_url` is the scheme, host and port of the downstream service, without
    /// a trailing path (for example `http://localhost:8080`).
    pub fn new(
        data_dir: PathBuf,
        database: String,
        collection: String,
        clinical_history_base_url: String,
        clinical_history_timeout: Duration,
        reference_tz: Tz,
    ) -> PatientResult<Self> {
        validate_store_name("database", &database)?;
        validate_store_name("collection", &collection)?;

        let clinical_history_base_url = clinical_history_base_url.trim_end_matches('/').to_string();
        if !(clinical_history_base_url.starts_with("http://")
            || clinical_history_base_url.starts_with("https://"))
        {
            return Err(PatientError::InvalidInput(format!(
                "clinical history URL must start with http:// or https://: {clinical_history_base_url}"
            )));
        }

        if clinical_history_timeout.is_zero() {
            return Err(PatientError::InvalidInput(
                "clinical history timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            data_dir,
            database,
            collection,
            clinical_history_base_url,
            clinical_history_timeout,
            reference_tz,
        })
    }

    /// Resolve configuration from the process environment.
    ///
    /// Call this once at startup (after loading any `.env` file) and pass the result down.
    ///
    /// # Environment Variables
    /// - `PACIENTES_DATA_DIR`: document store root (default: "pacientes_data")
    /// - `PACIENTES_DATABASE`: database name (default: "hospital")
    /// - `PACIENTES_COLLECTION`: collection name (default: "Pacientes")
    /// - `CLINICAL_HISTORY_HOST`: downstream host, always on port 8080 (default: "localhost")
    /// - `CLINICAL_HISTORY_TIMEOUT_SECS`: downstream request timeout (default: 10)
    /// - `REFERENCE_TIME_ZONE`: IANA zone for creation dates (default: "America/Lima")
    pub fn from_env() -> PatientResult<Self> {
        let data_dir =
            std::env::var("PACIENTES_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
        let database =
            std::env::var("PACIENTES_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.into());
        let collection =
            std::env::var("PACIENTES_COLLECTION").unwrap_or_else(|_| DEFAULT_COLLECTION.into());
        let host = std::env::var("CLINICAL_HISTORY_HOST")
            .unwrap_or_else(|_| DEFAULT_CLINICAL_HISTORY_HOST.into());
        let timeout =
            timeout_from_env_value(std::env::var("CLINICAL_HISTORY_TIMEOUT_SECS").ok())?;
        let reference_tz = time_zone_from_env_value(std::env::var("REFERENCE_TIME_ZONE").ok())?;

        Self::new(
            PathBuf::from(data_dir),
            database,
            collection,
            clinical_history_url_for_host(&host)?,
            timeout,
            reference_tz,
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Directory holding the documents of the configured collection.
    pub fn collection_dir(&self) -> PathBuf {
        self.data_dir.join(&self.database).join(&self.collection)
    }

    pub fn clinical_history_base_url(&self) -> &str {
        &self.clinical_history_base_url
    }

    pub fn clinical_history_timeout(&self) -> Duration {
        self.clinical_history_timeout
    }

    pub fn reference_tz(&self) -> Tz {
        self.reference_tz
    }
}

/// Build the downstream base URL for `host` on the fixed clinical history port.
pub fn clinical_history_url_for_host(host: &str) -> PatientResult<String> {
    let host = host.trim();
    if host.is_empty() || host.contains('/') || host.contains(':') {
        return Err(PatientError::InvalidInput(format!(
            "clinical history host must be a bare host name: {host:?}"
        )));
    }
    Ok(format!("http://{host}:{CLINICAL_HISTORY_PORT}"))
}

/// Parse the downstream timeout in seconds from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn timeout_from_env_value(value: Option<String>) -> PatientResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let secs = match value {
        Some(v) => v.parse::<u64>().map_err(|_| {
            PatientError::InvalidInput(format!("invalid CLINICAL_HISTORY_TIMEOUT_SECS: {v}"))
        })?,
        None => DEFAULT_CLINICAL_HISTORY_TIMEOUT_SECS,
    };

    Ok(Duration::from_secs(secs))
}

/// Parse the reference time zone from an optional IANA name.
///
/// If `value` is `None` or empty/whitespace, returns `America/Lima`.
pub fn time_zone_from_env_value(value: Option<String>) -> PatientResult<Tz> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        Some(v) => v
            .parse::<Tz>()
            .map_err(|_| PatientError::InvalidInput(format!("unknown time zone: {v}"))),
        None => Ok(DEFAULT_REFERENCE_TIME_ZONE),
    }
}

// Database and collection names become directory names.
fn validate_store_name(kind: &str, name: &str) -> PatientResult<()> {
    const MAX_NAME_LEN: usize = 64;

    if name.trim().is_empty() {
        return Err(PatientError::InvalidInput(format!("{kind} cannot be empty")));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(PatientError::InvalidInput(format!(
            "{kind} exceeds maximum length of {MAX_NAME_LEN} characters"
        )));
    }

    let ok = name
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_'));
    if !ok || name.starts_with('-') {
        return Err(PatientError::InvalidInput(format!(
            "{kind} contains invalid characters (only alphanumeric, '-', '_' allowed)"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg_with(database: &str, collection: &str, url: &str) -> PatientResult<CoreConfig> {
        CoreConfig::new(
            PathBuf::from("/tmp/pacientes"),
            database.into(),
            collection.into(),
            url.into(),
            Duration::from_secs(5),
            DEFAULT_REFERENCE_TIME_ZONE,
        )
    }

    #[test]
    fn collection_dir_joins_database_and_collection() {
        let cfg = cfg_with("hospital", "Pacientes", "http://localhost:8080/").unwrap();
        assert_eq!(
            cfg.collection_dir(),
            PathBuf::from("/tmp/pacientes/hospital/Pacientes")
        );
        assert_eq!(cfg.clinical_history_base_url(), "http://localhost:8080");
    }

    #[test]
    fn rejects_collection_names_that_escape_the_data_dir() {
        let err = cfg_with("hospital", "../etc", "http://localhost:8080").unwrap_err();
        assert!(matches!(err, PatientError::InvalidInput(_)));

        let err = cfg_with("", "Pacientes", "http://localhost:8080").unwrap_err();
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = cfg_with("hospital", "Pacientes", "localhost:8080").unwrap_err();
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = CoreConfig::new(
            PathBuf::from("/tmp"),
            "hospital".into(),
            "Pacientes".into(),
            "http://localhost:8080".into(),
            Duration::ZERO,
            DEFAULT_REFERENCE_TIME_ZONE,
        )
        .unwrap_err();
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn host_maps_to_fixed_port() {
        assert_eq!(
            clinical_history_url_for_host("historias").unwrap(),
            "http://historias:8080"
        );
        assert!(clinical_history_url_for_host("historias:9000").is_err());
        assert!(clinical_history_url_for_host("  ").is_err());
    }

    #[test]
    fn timeout_defaults_when_unset_or_blank() {
        assert_eq!(
            timeout_from_env_value(None).unwrap(),
            Duration::from_secs(DEFAULT_CLINICAL_HISTORY_TIMEOUT_SECS)
        );
        assert_eq!(
            timeout_from_env_value(Some("  ".into())).unwrap(),
            Duration::from_secs(DEFAULT_CLINICAL_HISTORY_TIMEOUT_SECS)
        );
        assert_eq!(
            timeout_from_env_value(Some("3".into())).unwrap(),
            Duration::from_secs(3)
        );
        assert!(timeout_from_env_value(Some("soon".into())).is_err());
    }

    #[test]
    fn time_zone_parses_iana_names() {
        assert_eq!(time_zone_from_env_value(None).unwrap(), chrono_tz::America::Lima);
        assert_eq!(
            time_zone_from_env_value(Some("Europe/Madrid".into())).unwrap(),
            chrono_tz::Europe::Madrid
        );
        assert!(time_zone_from_env_value(Some("Mars/Olympus".into())).is_err());
    }
}
