//! Persistence of generated models

use crate::error::RepositoryError;
use crate::state::RunStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use semgen_model::SemanticModel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One persisted run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Run identifier
    pub run_id: Uuid,
    /// Outcome
    pub status: RunStatus,
    /// Error annotation or failure reason
    pub error: Option<String>,
    /// Stored model
    pub model: Option<SemanticModel>,
    /// Write time
    pub saved_at: DateTime<Utc>,
}

impl ModelRecord {
    /// Record for a stored model
    #[must_use]
    pub fn saved(run_id: Uuid, model: &SemanticModel, error: Option<&str>) -> Self {
        Self {
            run_id,
            status: if error.is_some() {
                RunStatus::CompletedWithErrors
            } else {
                RunStatus::Completed
            },
            error: error.map(str::to_string),
            model: Some(model.clone()),
            saved_at: Utc::now(),
        }
    }

    /// Record for a failed run
    #[must_use]
    pub fn failed(run_id: Uuid, error: &str) -> Self {
        Self {
            run_id,
            status: RunStatus::Failed,
            error: Some(error.to_string()),
            model: None,
            saved_at: Utc::now(),
        }
    }
}

/// Stores generated models
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// Store a model, optionally annotated with an error
    async fn save_model(
        &self,
        run_id: Uuid,
        model: &SemanticModel,
        error: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// Record that a run produced no model
    async fn mark_failed(&self, run_id: Uuid, error: &str) -> Result<(), RepositoryError>;
}

/// Repository writing one JSON file per run
#[derive(Debug, Clone)]
pub struct FsModelRepository {
    dir: PathBuf,
}

impl FsModelRepository {
    /// Create repository rooted at `dir` (created on first write)
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of a run's record
    #[must_use]
    pub fn record_path(&self, run_id: Uuid) -> PathBuf {
        self.dir.join(format!("{run_id}.json"))
    }

    /// Read a stored record
    ///
    /// # Errors
    /// - `RepositoryError::Io` if the file cannot be read
    /// - `RepositoryError::Encode` if it is not a valid record
    pub async fn load(&self, run_id: Uuid) -> Result<ModelRecord, RepositoryError> {
        let path = self.record_path(run_id);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| io_error(&path, source))?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn write(&self, record: &ModelRecord) -> Result<(), RepositoryError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| io_error(&self.dir, source))?;

        let path = self.record_path(record.run_id);
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| io_error(&path, source))?;

        tracing::info!(run_id = %record.run_id, path = %path.display(), status = ?record.status, "saved model record");
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> RepositoryError {
    RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl ModelRepository for FsModelRepository {
    async fn save_model(
        &self,
        run_id: Uuid,
        model: &SemanticModel,
        error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.write(&ModelRecord::saved(run_id, model, error)).await
    }

    async fn mark_failed(&self, run_id: Uuid, error: &str) -> Result<(), RepositoryError> {
        self.write(&ModelRecord::failed(run_id, error)).await
    }
}

/// Repository keeping records in memory
#[derive(Debug, Default)]
pub struct InMemoryModelRepository {
    records: RwLock<HashMap<Uuid, ModelRecord>>,
}

impl InMemoryModelRepository {
    /// Create empty repository
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored record for a run
    #[must_use]
    pub fn get(&self, run_id: Uuid) -> Option<ModelRecord> {
        self.records.read().get(&run_id).cloned()
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl ModelRepository for InMemoryModelRepository {
    async fn save_model(
        &self,
        run_id: Uuid,
        model: &SemanticModel,
        error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.records
            .write()
            .insert(run_id, ModelRecord::saved(run_id, model, error));
        Ok(())
    }

    async fn mark_failed(&self, run_id: Uuid, error: &str) -> Result<(), RepositoryError> {
        self.records
            .write()
            .insert(run_id, ModelRecord::failed(run_id, error));
        Ok(())
    }
}
