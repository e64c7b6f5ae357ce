//! Core types flowing through an extraction run

use crate::error::{ExtractError, FailureKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Main part every word-processing OOXML package carries
pub(crate) const DOCX_BODY_PART: &str = "word/document.xml";

/// Document kind of an input file
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum FormatTag {
    Pdf,
    Docx,
    LegacyDoc,
    Zip,
    Unknown,
}

impl FormatTag {
    /// Document formats that get per-format success rates
    pub const DOCUMENTS: [Self; 3] = [Self::Pdf, Self::Docx, Self::LegacyDoc];

    /// Map a file extension (without the dot) to a format
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "doc" => Self::LegacyDoc,
            "zip" => Self::Zip,
            _ => Self::Unknown,
        }
    }

    /// Map a file name or archive path to a format by its extension
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
        file_name
            .rsplit_once('.')
            .map_or(Self::Unknown, |(_, ext)| Self::from_extension(ext))
    }

    /// Resolve the format of a blob from its name, an optional declared
    /// hint, and its leading bytes.
    ///
    /// Names and hints outside the supported set resolve to `Unknown`
    /// without looking at the bytes. Within the supported set, a
    /// recognizable signature wins over the name.
    #[must_use]
    pub fn resolve(identifier: &str, bytes: &[u8], hint: Option<&str>) -> Self {
        let by_name = match Self::from_name(identifier) {
            Self::Unknown => hint.map_or(Self::Unknown, Self::from_extension),
            known => known,
        };
        if by_name == Self::Unknown {
            return Self::Unknown;
        }

        if bytes.starts_with(PDF_MAGIC) {
            Self::Pdf
        } else if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(ZIP_EMPTY_MAGIC) {
            if by_name == Self::Docx || has_docx_body(bytes) {
                Self::Docx
            } else {
                Self::Zip
            }
        } else if bytes.starts_with(CFB_MAGIC) {
            // Encrypted OOXML packages are wrapped in a compound file too
            if by_name == Self::Docx {
                Self::Docx
            } else {
                Self::LegacyDoc
            }
        } else {
            by_name
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::LegacyDoc => "DOC",
            Self::Zip => "ZIP",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn is_cfb(bytes: &[u8]) -> bool {
    bytes.starts_with(CFB_MAGIC)
}

fn has_docx_body(bytes: &[u8]) -> bool {
    zip::ZipArchive::new(Cursor::new(bytes))
        .map(|archive| archive.index_for_name(DOCX_BODY_PART).is_some())
        .unwrap_or(false)
}

/// A file as handed over by the caller
#[derive(Debug, Clone)]
pub struct SubmittedFile {
    /// Original file name
    pub identifier: String,

    /// Raw content
    pub bytes: Vec<u8>,

    /// Declared format (extension or MIME-ish hint), not trusted blindly
    pub format_hint: Option<String>,
}

impl SubmittedFile {
    pub fn new(identifier: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            identifier: identifier.into(),
            bytes: bytes.into(),
            format_hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.format_hint = Some(hint.into());
        self
    }

    /// Classify into an immutable [`InputFile`]
    #[must_use]
    pub fn into_input(self) -> InputFile {
        let format = FormatTag::resolve(&self.identifier, &self.bytes, self.format_hint.as_deref());
        InputFile {
            identifier: self.identifier,
            format,
            bytes: self.bytes,
        }
    }
}

/// A classified file: a top-level upload or an archive member
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Original file name or archive-relative path
    pub identifier: String,

    /// Resolved document kind
    pub format: FormatTag,

    /// Raw content
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(identifier: impl Into<String>, format: FormatTag, bytes: Vec<u8>) -> Self {
        Self {
            identifier: identifier.into(),
            format,
            bytes,
        }
    }
}

/// Text of one input file, or the reason there is none
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Identifier of the file the text came from
    pub source: String,

    /// Plain text, or the failure that prevented extraction
    pub content: std::result::Result<String, ExtractError>,
}

impl ExtractedText {
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().ok()
    }
}

/// Recognition pattern that produced a candidate, in priority order
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// `local@domain.tld`
    Standard,
    /// `local @ domain . tld`, possibly broken across lines
    Spaced,
    /// Full-width `＠` / `．` separators
    FullWidth,
}

/// An unvalidated email-like span found in text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCandidate {
    /// Span as it appears in the text
    pub raw: String,

    /// Span with obfuscation collapsed to standard form
    pub collapsed: String,

    /// Pattern that matched
    pub pattern: PatternKind,

    /// Byte offset of the span in the scanned text
    pub position: usize,

    /// Identifier of the file the text came from
    pub source: String,
}

/// A validated, canonical email address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcceptedEmail {
    /// Canonical form: local part as written, domain lower-cased
    pub address: String,

    /// Local part (before @), original casing
    pub local_part: String,

    /// Domain, lower-cased
    pub domain: String,

    /// First file that produced this address
    pub source: String,
}

impl AcceptedEmail {
    /// Key used for uniqueness: local part compared case-insensitively
    #[must_use]
    pub fn dedup_key(&self) -> String {
        format!("{}@{}", self.local_part.to_lowercase(), self.domain)
    }
}

impl fmt::Display for AcceptedEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// How processing of a single file ended
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Success,
    Failure { kind: FailureKind, reason: String },
}

impl FileOutcome {
    #[must_use]
    pub fn failure(err: &ExtractError) -> Self {
        Self::Failure {
            kind: err.kind(),
            reason: err.to_string(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Per-file flags and counters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileStat {
    /// File name or archive-relative path
    pub identifier: String,

    /// Resolved document kind
    pub format: FormatTag,

    /// Non-blank text came out of the reader
    pub text_extracted: bool,

    /// At least one '@'-bearing candidate was found
    pub contains_at: bool,

    /// At least one candidate survived normalization
    pub contains_valid_email: bool,

    /// Number of '@' characters in the extracted text
    pub at_symbols: usize,

    /// Candidates the matcher emitted
    pub candidates_found: usize,

    /// Candidates the normalizer accepted
    pub candidates_accepted: usize,

    /// Candidates the normalizer rejected
    pub candidates_rejected: usize,

    pub outcome: FileOutcome,
}

impl FileStat {
    /// Stat for a file that never produced text
    #[must_use]
    pub fn failed(identifier: impl Into<String>, format: FormatTag, err: &ExtractError) -> Self {
        Self {
            identifier: identifier.into(),
            format,
            text_extracted: false,
            contains_at: false,
            contains_valid_email: false,
            at_symbols: 0,
            candidates_found: 0,
            candidates_accepted: 0,
            candidates_rejected: 0,
            outcome: FileOutcome::failure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_with_path_and_uppercase_extension() {
        assert_eq!(FormatTag::from_name("folder/sub/Resume.PDF"), FormatTag::Pdf);
        assert_eq!(FormatTag::from_name("a.b\\cv.docx"), FormatTag::Docx);
        assert_eq!(FormatTag::from_name("README"), FormatTag::Unknown);
    }

    #[test]
    fn unknown_name_ignores_bytes() {
        assert_eq!(
            FormatTag::resolve("notes.txt", b"%PDF-1.4", None),
            FormatTag::Unknown
        );
    }

    #[test]
    fn hint_used_when_name_has_no_extension() {
        assert_eq!(
            FormatTag::resolve("upload", b"%PDF-1.4", Some("pdf")),
            FormatTag::Pdf
        );
    }

    #[test]
    fn signature_overrides_name() {
        assert_eq!(
            FormatTag::resolve("misnamed.doc", b"%PDF-1.7 ...", None),
            FormatTag::Pdf
        );
        assert_eq!(
            FormatTag::resolve("misnamed.pdf", CFB_MAGIC, None),
            FormatTag::LegacyDoc
        );
    }

    #[test]
    fn garbage_keeps_name_format() {
        assert_eq!(
            FormatTag::resolve("broken.docx", b"garbage", None),
            FormatTag::Docx
        );
    }

    #[test]
    fn dedup_key_folds_local_part() {
        let email = AcceptedEmail {
            address: "John@company.com".into(),
            local_part: "John".into(),
            domain: "company.com".into(),
            source: "a.pdf".into(),
        };
        assert_eq!(email.dedup_key(), "john@company.com");
    }
}
