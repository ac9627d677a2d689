//! Recording entity and file naming

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::error::RecordingNameError;

/// File name prefix for recordings
pub const RECORDING_PREFIX: &str = "rec_";

/// File extension for recordings
pub const RECORDING_EXTENSION: &str = "flac";

/// Name of a recording file: `rec_<timestamp-ms>.flac`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordingName {
    timestamp_ms: u64,
}

impl RecordingName {
    pub const fn new(timestamp_ms: u64) -> Self {
        Self { timestamp_ms }
    }

    pub const fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Full path of this recording inside `dir`
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.to_string())
    }

    /// Parse the name from a path's file name
    pub fn from_path(path: &Path) -> Result<Self, RecordingNameError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RecordingNameError {
                input: path.display().to_string(),
            })?;
        name.parse()
    }
}

impl fmt::Display for RecordingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}.{}",
            RECORDING_PREFIX, self.timestamp_ms, RECORDING_EXTENSION
        )
    }
}

impl FromStr for RecordingName {
    type Err = RecordingNameError;

    /// Accepts `rec_<digits>.<ext>` with any non-empty extension
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || RecordingNameError {
            input: s.to_string(),
        };

        let rest = s.strip_prefix(RECORDING_PREFIX).ok_or_else(err)?;
        let (stamp, ext) = rest.split_once('.').ok_or_else(err)?;
        if ext.is_empty() || stamp.is_empty() || !stamp.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }

        let timestamp_ms = stamp.parse().map_err(|_| err())?;
        Ok(Self { timestamp_ms })
    }
}

/// Hands out strictly increasing recording timestamps.
///
/// Two recordings started within the same millisecond (or after the wall
/// clock stepped back) still get distinct, ordered names.
#[derive(Debug, Default)]
pub struct RecordingClock {
    last: AtomicU64,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next name given the current wall clock in milliseconds
    pub fn next_name(&self, now_ms: u64) -> RecordingName {
        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now_ms.max(last + 1);
            match self
                .last
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return RecordingName::new(candidate),
                Err(actual) => last = actual,
            }
        }
    }

    /// Next name using the system clock
    pub fn next_name_now(&self) -> RecordingName {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.next_name(now)
    }
}

/// A saved recording file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub path: PathBuf,
    /// Timestamp from the file name
    pub timestamp_ms: u64,
    /// File modification time, milliseconds since the epoch
    pub modified_ms: u64,
    pub size_bytes: u64,
}

impl Recording {
    /// File name for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Human readable size string
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes as f64;
        if bytes < 1024.0 {
            format!("{} B", self.size_bytes)
        } else if bytes < 1024.0 * 1024.0 {
            format!("{:.1} KB", bytes / 1024.0)
        } else {
            format!("{:.1} MB", bytes / (1024.0 * 1024.0))
        }
    }
}

/// Sort newest first: modification time, then name timestamp
pub fn sort_newest_first(recordings: &mut [Recording]) {
    recordings.sort_by(|a, b| {
        b.modified_ms
            .cmp(&a.modified_ms)
            .then(b.timestamp_ms.cmp(&a.timestamp_ms))
    });
}
