use crate::validation::{AccuracyStats, ValidationRecord};
use async_trait::async_trait;
use gaialab_core::error::{ErrorCode, GaialabError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GaialabError for StoreError {
    fn error_code(&self) -> ErrorCode {
        match self {
            StoreError::Io(_) => ErrorCode::Unavailable,
            StoreError::Serialization(_) => ErrorCode::Internal,
        }
    }
}

/// Durable home of the validation log and its derived stats document.
#[async_trait]
pub trait ValidationStore: Send + Sync {
    /// Insert a record, or overwrite the record with the same id.
    async fn append(&self, record: ValidationRecord) -> Result<(), StoreError>;
    async fn read_all(&self) -> Result<Vec<ValidationRecord>, StoreError>;
    /// Persist stats unless the stored document already has a newer version.
    async fn write_stats(&self, stats: &AccuracyStats) -> Result<(), StoreError>;
    async fn read_stats(&self) -> Result<Option<AccuracyStats>, StoreError>;
}

fn upsert(records: &mut Vec<ValidationRecord>, record: ValidationRecord) {
    match records.iter_mut().find(|existing| existing.id == record.id) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

fn is_stale(current: Option<&AccuracyStats>, incoming: &AccuracyStats) -> bool {
    current.is_some_and(|stored| stored.version > incoming.version)
}

#[derive(Default)]
pub struct InMemoryValidationStore {
    records: Mutex<Vec<ValidationRecord>>,
    stats: Mutex<Option<AccuracyStats>>,
}

impl InMemoryValidationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ValidationStore for InMemoryValidationStore {
    async fn append(&self, record: ValidationRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        upsert(&mut records, record);
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ValidationRecord>, StoreError> {
        Ok(self.records.lock().await.clone())
    }

    async fn write_stats(&self, stats: &AccuracyStats) -> Result<(), StoreError> {
        let mut current = self.stats.lock().await;
        if !is_stale(current.as_ref(), stats) {
            *current = Some(stats.clone());
        }
        Ok(())
    }

    async fn read_stats(&self) -> Result<Option<AccuracyStats>, StoreError> {
        Ok(self.stats.lock().await.clone())
    }
}

/// JSON documents on disk. Both files are rewritten in full on every
/// mutation (temp file + rename), never patched.
pub struct JsonFileValidationStore {
    log_path: PathBuf,
    stats_path: PathBuf,
    records: Mutex<Vec<ValidationRecord>>,
    stats: Mutex<Option<AccuracyStats>>,
}

impl JsonFileValidationStore {
    /// Open both documents. Missing files start empty; unparsable files are
    /// logged and treated as empty so the service keeps running.
    pub async fn open(
        log_path: impl AsRef<Path>,
        stats_path: impl AsRef<Path>,
    ) -> Result<Self, StoreError> {
        let log_path = log_path.as_ref().to_path_buf();
        let stats_path = stats_path.as_ref().to_path_buf();

        let records: Vec<ValidationRecord> = read_json_or_default(&log_path).await?.unwrap_or_default();
        let stats: Option<AccuracyStats> = read_json_or_default(&stats_path).await?;
        debug!(
            "Opened validation store at {} ({} records)",
            log_path.display(),
            records.len()
        );

        Ok(Self {
            log_path,
            stats_path,
            records: Mutex::new(records),
            stats: Mutex::new(stats),
        })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }
}

#[async_trait]
impl ValidationStore for JsonFileValidationStore {
    async fn append(&self, record: ValidationRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        upsert(&mut next, record);
        // Durability first; memory only changes once the file is replaced.
        write_json_atomic(&self.log_path, &next).await?;
        *records = next;
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ValidationRecord>, StoreError> {
        Ok(self.records.lock().await.clone())
    }

    async fn write_stats(&self, stats: &AccuracyStats) -> Result<(), StoreError> {
        let mut current = self.stats.lock().await;
        if is_stale(current.as_ref(), stats) {
            debug!(
                "Skipping stats write: version {} is older than stored",
                stats.version
            );
            return Ok(());
        }
        write_json_atomic(&self.stats_path, stats).await?;
        *current = Some(stats.clone());
        Ok(())
    }

    async fn read_stats(&self) -> Result<Option<AccuracyStats>, StoreError> {
        Ok(self.stats.lock().await.clone())
    }
}

async fn read_json_or_default<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, StoreError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::Io(e)),
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(
                "Could not parse {}; starting from empty state: {}",
                path.display(),
                e
            );
            Ok(None)
        }
    }
}

async fn write_json_atomic<T: serde::Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, bytes).await?;
    fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{
        record_id, Engagement, ValidationContext, ValidationDetails, ValidationOutcome,
    };
    use gaialab_core::model::{Hypothesis, HypothesisSubject, HypothesisType};
    use tempfile::tempdir;

    fn sample_record(statement: &str) -> ValidationRecord {
        let hypothesis = Hypothesis::candidate(
            HypothesisType::PathwayInvolvement,
            statement,
            HypothesisSubject::default(),
            "mechanism",
            0.7,
            0.75,
            Vec::new(),
        );
        ValidationRecord {
            id: record_id(hypothesis.hypothesis_type, statement, "2026-02-02T00:00:00Z"),
            hypothesis,
            context: ValidationContext::default(),
            created_at: "2026-02-02T00:00:00Z".to_string(),
            validation: ValidationDetails::default(),
            engagement: Engagement::default(),
        }
    }

    #[tokio::test]
    async fn test_json_store_round_trip_across_reopen() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("nested/validation_log.json");
        let stats = dir.path().join("nested/accuracy_stats.json");

        {
            let store = JsonFileValidationStore::open(&log, &stats).await.unwrap();
            store.append(sample_record("first")).await.unwrap();
            let mut updated = sample_record("first");
            updated.validation.outcome = ValidationOutcome::Confirmed;
            store.append(updated).await.unwrap();
            store.append(sample_record("second")).await.unwrap();
        }

        let reopened = JsonFileValidationStore::open(&log, &stats).await.unwrap();
        let records = reopened.read_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].validation.outcome, ValidationOutcome::Confirmed);
    }

    #[tokio::test]
    async fn test_corrupt_log_falls_back_to_empty() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("validation_log.json");
        let stats = dir.path().join("accuracy_stats.json");
        tokio::fs::write(&log, b"{not json").await.unwrap();
        tokio::fs::write(&stats, b"[]").await.unwrap();

        let store = JsonFileValidationStore::open(&log, &stats).await.unwrap();
        assert!(store.read_all().await.unwrap().is_empty());
        assert!(store.read_stats().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_older_stats_version_is_not_written() {
        let store = InMemoryValidationStore::new();
        let newer = AccuracyStats {
            version: 5,
            ..AccuracyStats::default()
        };
        let older = AccuracyStats {
            version: 4,
            total_generated: 99,
            ..AccuracyStats::default()
        };
        store.write_stats(&newer).await.unwrap();
        store.write_stats(&older).await.unwrap();
        assert_eq!(store.read_stats().await.unwrap().unwrap().version, 5);
    }
}
