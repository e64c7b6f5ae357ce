//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Limits and knobs for an extraction run.
///
/// Read-only for the lifetime of a run; several runs may share one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ceiling on total uncompressed content per run, in bytes
    pub max_total_bytes: u64,

    /// Ceiling on a single decompressed archive member, in bytes
    pub max_entry_bytes: u64,

    /// How many archives deep expansion may go
    pub max_archive_depth: usize,

    /// Per-file read timeout in seconds
    pub file_timeout_secs: u64,

    /// Whole-run timeout in seconds
    pub run_timeout_secs: Option<u64>,

    /// Number of files read in parallel
    pub workers: usize,

    /// Look for a platform converter for legacy .doc files
    pub legacy_doc: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_total_bytes: 500 * 1024 * 1024,
            max_entry_bytes: 100_000_000,
            max_archive_depth: 10,
            file_timeout_secs: 30,
            run_timeout_secs: None,
            workers: 4,
            legacy_doc: true,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(std::io::Error::from)
    }

    #[must_use]
    pub const fn with_max_total_bytes(mut self, bytes: u64) -> Self {
        self.max_total_bytes = bytes;
        self
    }

    #[must_use]
    pub const fn with_max_entry_bytes(mut self, bytes: u64) -> Self {
        self.max_entry_bytes = bytes;
        self
    }

    #[must_use]
    pub const fn with_max_archive_depth(mut self, depth: usize) -> Self {
        self.max_archive_depth = depth;
        self
    }

    #[must_use]
    pub const fn with_file_timeout(mut self, secs: u64) -> Self {
        self.file_timeout_secs = secs;
        self
    }

    #[must_use]
    pub const fn with_run_timeout(mut self, secs: Option<u64>) -> Self {
        self.run_timeout_secs = secs;
        self
    }

    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub const fn with_legacy_doc(mut self, enabled: bool) -> Self {
        self.legacy_doc = enabled;
        self
    }

    #[must_use]
    pub const fn file_timeout(&self) -> Duration {
        Duration::from_secs(self.file_timeout_secs)
    }

    /// Worker count, never below one
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"workers": 2}"#).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.max_archive_depth, 10);
        assert!(config.run_timeout_secs.is_none());
    }

    #[test]
    fn zero_workers_clamped() {
        assert_eq!(PipelineConfig::default().with_workers(0).worker_count(), 1);
    }
}
