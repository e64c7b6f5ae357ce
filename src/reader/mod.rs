//! Per-format text extraction
//!
//! Dispatch is closed over the supported document kinds. Anything else
//! lands on the unsupported variant without its bytes being looked at.

mod docx;
mod legacy;
mod pdf;

pub use legacy::{LegacyDocConverter, OfficeCommandConverter};

use crate::error::{ExtractError, Result};
use crate::types::{ExtractedText, FormatTag, InputFile};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default limit on a single external conversion
const DEFAULT_CONVERT_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns document blobs into plain text
#[derive(Clone)]
pub struct FormatReader {
    legacy_doc: Option<Arc<dyn LegacyDocConverter>>,
    convert_timeout: Duration,
}

impl Default for FormatReader {
    fn default() -> Self {
        Self {
            legacy_doc: None,
            convert_timeout: DEFAULT_CONVERT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for FormatReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatReader")
            .field("legacy_doc", &self.legacy_doc.as_ref().map(|c| c.name()))
            .field("convert_timeout", &self.convert_timeout)
            .finish()
    }
}

/// Extraction strategy chosen for one file
enum Extractor<'a> {
    Pdf,
    Docx,
    LegacyDoc(&'a dyn LegacyDocConverter, Duration),
    Unsupported(String),
}

impl Extractor<'_> {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::Pdf => pdf::extract_text(bytes),
            Self::Docx => docx::extract_text(bytes),
            Self::LegacyDoc(converter, timeout) => converter.convert_to_text(bytes, *timeout),
            Self::Unsupported(reason) => Err(ExtractError::UnsupportedFormat(reason.clone())),
        }
    }
}

impl FormatReader {
    /// Reader without legacy DOC support
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader that uses the platform converter if one is installed
    #[must_use]
    pub fn detect_platform() -> Self {
        let converter = OfficeCommandConverter::detect();
        debug!(
            "Legacy DOC converter: {}",
            converter.as_ref().map_or("none", |c| c.name())
        );
        Self {
            legacy_doc: converter.map(|c| Arc::new(c) as Arc<dyn LegacyDocConverter>),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_legacy_doc(mut self, converter: Arc<dyn LegacyDocConverter>) -> Self {
        self.legacy_doc = Some(converter);
        self
    }

    /// Bound external conversions to `timeout`; the converter is killed past it
    #[must_use]
    pub fn with_convert_timeout(mut self, timeout: Duration) -> Self {
        self.convert_timeout = timeout;
        self
    }

    /// Whether legacy DOC files can currently be read
    #[must_use]
    pub fn supports_legacy_doc(&self) -> bool {
        self.legacy_doc.as_ref().is_some_and(|c| c.is_available())
    }

    fn extractor_for(&self, format: FormatTag) -> Extractor<'_> {
        match format {
            FormatTag::Pdf => Extractor::Pdf,
            FormatTag::Docx => Extractor::Docx,
            FormatTag::LegacyDoc => match &self.legacy_doc {
                Some(converter) if converter.is_available() => {
                    Extractor::LegacyDoc(converter.as_ref(), self.convert_timeout)
                }
                _ => Extractor::Unsupported(
                    "legacy DOC needs a word-processor converter, none available".into(),
                ),
            },
            FormatTag::Zip => {
                Extractor::Unsupported("archives are expanded, not read as documents".into())
            }
            FormatTag::Unknown => Extractor::Unsupported("unrecognized file type".into()),
        }
    }

    /// Extract the text of one file
    #[must_use]
    pub fn extract(&self, input: &InputFile) -> ExtractedText {
        let content = self.extractor_for(input.format).extract(&input.bytes);
        match &content {
            Ok(text) => debug!(
                "{} ({}): {} chars, {} @ symbols",
                input.identifier,
                input.format,
                text.len(),
                text.matches('@').count()
            ),
            Err(err) => debug!("{} ({}): {}", input.identifier, input.format, err),
        }
        ExtractedText {
            source: input.identifier.clone(),
            content,
        }
    }
}
