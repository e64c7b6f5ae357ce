//! Error types for extraction runs

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while turning a single file into text.
///
/// These never abort a run: the pipeline records them on the file's
/// [`FileStat`](crate::FileStat) and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Extension or content is not one of the supported document kinds
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Byte stream could not be parsed as the declared format
    #[error("Corrupt file: {0}")]
    CorruptFile(String),

    /// Encryption prevents access to the text
    #[error("Password protected: {0}")]
    PasswordProtected(String),

    /// A single archive member could not be unpacked
    #[error("Archive extraction failed: {0}")]
    ArchiveExtraction(String),

    /// Reading the file took longer than the configured limit
    #[error("Extraction timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
}

impl ExtractError {
    /// Reason code recorded in statistics
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedFormat(_) => FailureKind::UnsupportedFormat,
            Self::CorruptFile(_) => FailureKind::CorruptFile,
            Self::PasswordProtected(_) => FailureKind::PasswordProtected,
            Self::ArchiveExtraction(_) => FailureKind::ArchiveExtraction,
            Self::Timeout { .. } => FailureKind::Timeout,
        }
    }
}

/// Serializable reason code for a failed file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnsupportedFormat,
    CorruptFile,
    PasswordProtected,
    ArchiveExtraction,
    Timeout,
}

impl From<lopdf::Error> for ExtractError {
    fn from(err: lopdf::Error) -> Self {
        Self::CorruptFile(format!("PDF: {err}"))
    }
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::CorruptFile(format!("container: {err}"))
    }
}

impl From<quick_xml::Error> for ExtractError {
    fn from(err: quick_xml::Error) -> Self {
        Self::CorruptFile(format!("XML: {err}"))
    }
}

/// Conditions that abort a whole run. No report is produced.
#[derive(Error, Debug)]
pub enum RunError {
    /// Nothing was submitted
    #[error("No input files supplied")]
    NoInput,

    /// Total uncompressed content went over the configured ceiling
    #[error("Total content size {attempted} bytes exceeds ceiling of {limit} bytes")]
    SizeCeilingExceeded { limit: u64, attempted: u64 },

    /// The whole run went over its time limit
    #[error("Run timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// A blocking worker died without producing a result
    #[error("Extraction worker failed: {0}")]
    Worker(String),
}

/// Result type for single-file extraction steps
pub type Result<T> = std::result::Result<T, ExtractError>;
