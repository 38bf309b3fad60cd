//! Local image persistence and the report filename/date formats.
//!
//! Persistence is best-effort from the workflow's perspective: the End
//! transition logs a failure and carries on — a missing archive copy never
//! blocks the inspection sequence.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Local, Utc};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

const FILE_NAME_BASE: &str = "img";
const FILE_NAME_EXTENSION: &str = "png";

/// Timestamp embedded in persisted filenames (UTC).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Report date stamp (local time).
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Image persistence errors. Logged by the caller, never propagated as a
/// workflow failure.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create save directory '{path}': {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Filename / Timestamp Builders
// ============================================================================

#[allow(clippy::unwrap_used)] // literal pattern, cannot fail
fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Za-z]+").unwrap())
}

/// Normalize a raw defect label for use in a filename: extract the
/// alphabetic words and join them with dashes.
///
/// `" Chip (edge) "` becomes `"Chip-edge"`.
pub fn defect_file_label(raw_defect_type: &str) -> String {
    word_pattern()
        .find_iter(raw_defect_type)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("-")
}

/// Filename timestamp for a capture instant: `2025-05-13-17-45-20`.
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Build the persisted image filename:
/// `img_<defect-label>_<YYYY-MM-DD-HH-MM-SS>.png`.
pub fn image_file_name(defect_label: &str, at: DateTime<Utc>) -> String {
    format!(
        "{FILE_NAME_BASE}_{defect_label}_{}.{FILE_NAME_EXTENSION}",
        file_timestamp(at)
    )
}

/// Current report date in local time: `2025-05-19`.
pub fn current_date() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

// ============================================================================
// Local Output
// ============================================================================

/// Writes captured frames under a configured save directory.
#[derive(Debug, Clone)]
pub struct LocalOutput {
    save_dir: PathBuf,
}

impl LocalOutput {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Persist encoded image bytes under a generated filename for the given
    /// raw defect label. Returns the full path written.
    pub fn save_image(&self, bytes: &[u8], raw_defect_type: &str) -> Result<PathBuf, OutputError> {
        fs::create_dir_all(&self.save_dir).map_err(|source| OutputError::CreateDir {
            path: self.save_dir.display().to_string(),
            source,
        })?;

        let file_name = image_file_name(&defect_file_label(raw_defect_type), Utc::now());
        let path = self.save_dir.join(file_name);

        fs::write(&path, bytes).map_err(|source| OutputError::Write {
            path: path.display().to_string(),
            source,
        })?;

        debug!(path = %path.display(), bytes = bytes.len(), "image persisted");
        Ok(path)
    }
}
