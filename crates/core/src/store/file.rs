//! File-backed patient document store.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   <database>/
//!     <collection>/
//!       <s1>/
//!         <dni>.json
//! ```
//!
//! where `s1` is the lowercased first two characters of the DNI.
//!
//! Documents are written to a temporary file first. Inserts publish the temporary file with a
//! hard link, which fails if the target already exists, so key uniqueness holds across processes
//! sharing the same directory. Updates publish with a rename. Mutations are serialised inside a
//! single store instance so a read-modify-write cycle never loses a concurrent update.

use super::PatientStore;
use crate::config::CoreConfig;
use crate::constants::DOCUMENT_EXTENSION;
use crate::record::{PatientRecord, PatientUpdate};
use crate::{PatientError, PatientResult};
use async_trait::async_trait;
use pacientes_types::NationalId;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Patient store persisting one JSON document per patient.
#[derive(Debug)]
pub struct FileStore {
    collection_dir: PathBuf,
    write_lock: Mutex<()>,
    temp_counter: AtomicU64,
}

impl FileStore {
    /// Opens the collection configured in `cfg`, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::StoreDirCreation` if the collection directory cannot be created.
    pub async fn open(cfg: &CoreConfig) -> PatientResult<Self> {
        Self::open_dir(cfg.collection_dir()).await
    }

    /// Opens a collection rooted at an explicit directory.
    pub async fn open_dir(collection_dir: PathBuf) -> PatientResult<Self> {
        fs::create_dir_all(&collection_dir)
            .await
            .map_err(PatientError::StoreDirCreation)?;

        tracing::debug!("opened patient collection at {}", collection_dir.display());

        Ok(Self {
            collection_dir,
            write_lock: Mutex::new(()),
            temp_counter: AtomicU64::new(0),
        })
    }

    pub fn collection_dir(&self) -> &Path {
        &self.collection_dir
    }

    fn document_path(&self, dni: &NationalId) -> PathBuf {
        self.collection_dir
            .join(dni.shard())
            .join(format!("{dni}.{DOCUMENT_EXTENSION}"))
    }

    fn temp_path(&self, target: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".tmp-{}-{n}", std::process::id()));
        target.with_file_name(name)
    }

    async fn read_document(path: &Path) -> PatientResult<Option<PatientRecord>> {
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PatientError::StoreRead(e)),
        };
        let record = serde_json::from_str(&contents).map_err(PatientError::Deserialization)?;
        Ok(Some(record))
    }

    /// Writes `record` to a fresh temporary file next to `target` and returns its path.
    async fn write_temp(&self, target: &Path, record: &PatientRecord) -> PatientResult<PathBuf> {
        let raw = serde_json::to_vec_pretty(record).map_err(PatientError::Serialization)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(PatientError::StoreDirCreation)?;
        }

        let temp = self.temp_path(target);
        let result: std::io::Result<()> = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(&raw).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&temp).await;
            return Err(PatientError::StoreWrite(e));
        }
        Ok(temp)
    }
}

#[async_trait]
impl PatientStore for FileStore {
    async fn list_all(&self) -> PatientResult<Vec<PatientRecord>> {
        let mut records = Vec::new();

        let mut shards = match fs::read_dir(&self.collection_dir).await {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(records),
            Err(e) => return Err(PatientError::StoreRead(e)),
        };

        while let Some(shard) = shards.next_entry().await.map_err(PatientError::StoreRead)? {
            let is_dir = shard.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            let shard_path = shard.path();

            let mut documents = match fs::read_dir(&shard_path).await {
                Ok(it) => it,
                Err(_) => continue,
            };

            while let Some(doc) = documents
                .next_entry()
                .await
                .map_err(PatientError::StoreRead)?
            {
                let doc_path = doc.path();
                if doc_path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
                    continue;
                }

                match Self::read_document(&doc_path).await {
                    Ok(Some(record)) => records.push(record),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(
                            "failed to read patient document: {} - {}",
                            doc_path.display(),
                            e
                        );
                    }
                }
            }
        }

        records.sort_by(|a, b| a.dni.cmp(&b.dni));
        Ok(records)
    }

    async fn get(&self, dni: &NationalId) -> PatientResult<Option<PatientRecord>> {
        Self::read_document(&self.document_path(dni)).await
    }

    async fn insert(&self, record: PatientRecord) -> PatientResult<PatientRecord> {
        let target = self.document_path(&record.dni);
        let temp = self.write_temp(&target, &record).await?;

        let linked = fs::hard_link(&temp, &target).await;
        let _ = fs::remove_file(&temp).await;

        match linked {
            Ok(()) => Ok(record),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(PatientError::DuplicateKey(record.dni.to_string()))
            }
            Err(e) => Err(PatientError::StoreWrite(e)),
        }
    }

    async fn update(&self, dni: &NationalId, update: &PatientUpdate) -> PatientResult<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let _guard = self.write_lock.lock().await;

        let target = self.document_path(dni);
        let Some(mut record) = Self::read_document(&target).await? else {
            return Ok(false);
        };

        if !record.apply(update)? {
            return Ok(false);
        }

        let temp = self.write_temp(&target, &record).await?;
        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(PatientError::StoreWrite(e));
        }

        Ok(true)
    }

    async fn delete(&self, dni: &NationalId) -> PatientResult<bool> {
        let _guard = self.write_lock.lock().await;

        match fs::remove_file(self.document_path(dni)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PatientError::StoreDelete(e)),
        }
    }
}
