//! Integrity metadata written next to finished recordings

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::errors::{StorageError, StorageResult};
use crate::models::{Programme, RecordingInfo, RecordingMetadata};
use crate::recording::naming::FileType;
use crate::recording::store::RecordingStore;

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Lowercase hex SHA-256 of a file, read in fixed-size chunks
pub async fn hash_file(path: &Path) -> StorageResult<String> {
    let mut file = File::open(path)
        .await
        .map_err(|e| StorageError::io(path, e))?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let read = file
            .read(&mut buffer)
            .await
            .map_err(|e| StorageError::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Load a metadata record previously written by [`RecordingStore::write_metadata`]
pub async fn read_metadata(path: &Path) -> StorageResult<RecordingMetadata> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

impl RecordingStore {
    /// Hash the `file_type` file of `programme` and write `<that path>.metadata`.
    ///
    /// Hashing or writing failures are returned; finalization should not proceed
    /// without integrity metadata.
    pub async fn write_metadata(
        &self,
        programme: &Programme,
        file_type: FileType,
        recording: &RecordingInfo,
    ) -> StorageResult<PathBuf> {
        let path = self.full_path(programme, file_type);
        let metadata_path = self.paths().metadata_path(programme, file_type);

        debug!("Hashing '{}'", path.display());
        let started = Instant::now();
        let sha256 = hash_file(&path).await?;
        info!(
            "'{}' sha256 hash is: {}, calculated in {} ms",
            path.display(),
            sha256,
            started.elapsed().as_millis()
        );

        let metadata = RecordingMetadata::new(programme, recording, sha256);
        let contents = serde_json::to_string_pretty(&metadata)?;

        debug!("Writing metadata to '{}'", metadata_path.display());
        fs::write(&metadata_path, contents)
            .await
            .map_err(|e| StorageError::write(&metadata_path, e))?;

        Ok(metadata_path)
    }
}
