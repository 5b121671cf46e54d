//! Filesystem-backed recording lifecycle
//!
//! A recording's state is never held in memory: every query re-reads the save
//! directory, and every transition is a single rename between suffixed paths.

use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error};

use crate::config::defaults::DEFAULT_MAX_IN_PROGRESS_AGE_SECS;
use crate::config::StorageConfig;
use crate::errors::{StorageError, StorageResult};
use crate::models::Programme;
use crate::recording::naming::{FileType, RecordingPaths};
use crate::utils::clock::Clock;
use crate::utils::time::to_chrono_duration;

#[derive(Clone)]
pub struct RecordingStore {
    paths: RecordingPaths,
    clock: Arc<dyn Clock>,
    max_in_progress_age: Duration,
}

impl RecordingStore {
    pub fn new(save_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            paths: RecordingPaths::new(save_dir),
            clock,
            max_in_progress_age: Duration::seconds(DEFAULT_MAX_IN_PROGRESS_AGE_SECS as i64),
        }
    }

    pub fn from_config(config: &StorageConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.save_dir.clone(), clock)
            .with_max_in_progress_age(to_chrono_duration(config.max_in_progress_age))
    }

    pub fn with_max_in_progress_age(mut self, max_age: Duration) -> Self {
        self.max_in_progress_age = max_age;
        self
    }

    pub fn paths(&self) -> &RecordingPaths {
        &self.paths
    }

    pub fn full_path(&self, programme: &Programme, file_type: FileType) -> PathBuf {
        self.paths.full_path(programme, file_type)
    }

    pub fn in_progress_path(&self, programme: &Programme) -> PathBuf {
        self.full_path(programme, FileType::InProgress)
    }

    pub fn post_processed_path(&self, programme: &Programme) -> PathBuf {
        self.full_path(programme, FileType::PostProcessed)
    }

    /// Create the save directory (recursively) if it does not exist yet
    pub async fn ensure_save_dir(&self) -> StorageResult<PathBuf> {
        let save_dir = self.paths.save_dir();
        if fs::metadata(save_dir).await.is_err() {
            debug!("{} does not exist, attempting to create it", save_dir.display());
            fs::create_dir_all(save_dir)
                .await
                .map_err(|e| StorageError::write(save_dir, e))?;
        }
        Ok(save_dir.to_path_buf())
    }

    /// True for a live in-progress file or any successful file.
    ///
    /// In-progress files whose mtime is older than the configured maximum age are
    /// abandoned and do not count.
    pub async fn recording_exists(&self, programme: &Programme) -> bool {
        let in_progress = self.in_progress_path(programme);
        let successful = self.full_path(programme, FileType::Successful);

        let (in_progress_live, successful_exists) = tokio::join!(
            self.is_live(&in_progress),
            fs::metadata(&successful)
        );

        in_progress_live || successful_exists.is_ok()
    }

    async fn is_live(&self, path: &Path) -> bool {
        let modified = match fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(_) => return false,
        };
        let age = self.clock.now() - modified;
        if age >= self.max_in_progress_age {
            debug!(
                "Ignoring orphaned in-progress file {} ({} minutes old)",
                path.display(),
                age.num_minutes()
            );
            return false;
        }
        true
    }

    /// Rename the `from`-suffixed file to the `to` suffix.
    ///
    /// Returns `None` on failure after logging it; see [`Self::try_transition`]
    /// for the underlying error.
    pub async fn transition(
        &self,
        programme: &Programme,
        from: FileType,
        to: FileType,
    ) -> Option<PathBuf> {
        match self.try_transition(programme, from, to).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    pub async fn try_transition(
        &self,
        programme: &Programme,
        from: FileType,
        to: FileType,
    ) -> StorageResult<PathBuf> {
        if from.is_terminal() || from == to {
            return Err(StorageError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let from_path = self.full_path(programme, from);
        let to_path = self.full_path(programme, to);

        debug!("Moving '{}' to '{}'", from_path.display(), to_path.display());
        fs::rename(&from_path, &to_path)
            .await
            .map_err(|source| StorageError::Rename {
                from: from_path,
                to: to_path.clone(),
                source,
            })?;

        Ok(to_path)
    }

    pub async fn mark_successful(&self, programme: &Programme) -> Option<PathBuf> {
        self.transition(programme, FileType::InProgress, FileType::Successful)
            .await
    }

    pub async fn mark_failed(&self, programme: &Programme) -> Option<PathBuf> {
        self.transition(programme, FileType::InProgress, FileType::Failed)
            .await
    }

    pub async fn write_thumbnail(&self, programme: &Programme, data: &[u8]) -> StorageResult<PathBuf> {
        let path = self.full_path(programme, FileType::Thumbnail);
        fs::write(&path, data)
            .await
            .map_err(|e| StorageError::write(&path, e))?;
        Ok(path)
    }

    pub async fn remove(&self, path: &Path) -> StorageResult<()> {
        fs::remove_file(path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }
}
