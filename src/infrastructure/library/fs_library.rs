//! Recordings directory listing

use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{LibraryError, RecordingLibrary};
use crate::domain::recording::{sort_newest_first, Recording, RecordingName};

/// Lists `rec_<ms>.*` files in a directory
#[derive(Debug, Clone)]
pub struct FsRecordingLibrary {
    dir: PathBuf,
}

impl FsRecordingLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl RecordingLibrary for FsRecordingLibrary {
    async fn list(&self) -> Result<Vec<Recording>, LibraryError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LibraryError::ReadFailed(e.to_string())),
        };

        let mut recordings = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LibraryError::ReadFailed(e.to_string()))?
        {
            let path = entry.path();
            let Ok(name) = RecordingName::from_path(&path) else {
                continue;
            };
            // Entries can vanish between read_dir and metadata
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            // Unfinished recordings are empty placeholders
            if !metadata.is_file() || metadata.len() == 0 {
                continue;
            }

            let modified_ms = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);

            recordings.push(Recording {
                path,
                timestamp_ms: name.timestamp_ms(),
                modified_ms,
                size_bytes: metadata.len(),
            });
        }

        sort_newest_first(&mut recordings);
        Ok(recordings)
    }
}
