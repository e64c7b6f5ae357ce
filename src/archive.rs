//! Recursive ZIP expansion

use crate::config::PipelineConfig;
use crate::error::{ExtractError, RunError};
use crate::types::{FormatTag, InputFile};
use std::io::{Cursor, Read};
use tracing::{debug, warn};
use zip::ZipArchive;

/// One member produced by expanding an archive
#[derive(Debug, Clone)]
pub enum ArchiveEntry {
    /// A document to be read
    Document(InputFile),

    /// A member (or a whole nested archive) that could not be unpacked
    Failed {
        identifier: String,
        format: FormatTag,
        error: ExtractError,
    },
}

/// Running total of uncompressed bytes a run has taken in.
///
/// Every archive member that gets inflated is charged, nested archives and
/// rejected members included, so a decompression bomb trips the ceiling
/// however it is layered.
#[derive(Debug, Clone, Copy)]
pub struct SizeBudget {
    limit: u64,
    used: u64,
}

impl SizeBudget {
    #[must_use]
    pub const fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// Account for `bytes` more content, failing the run past the ceiling
    pub fn charge(&mut self, bytes: u64) -> Result<(), RunError> {
        let attempted = self.used.saturating_add(bytes);
        if attempted > self.limit {
            return Err(RunError::SizeCeilingExceeded {
                limit: self.limit,
                attempted,
            });
        }
        self.used = attempted;
        Ok(())
    }

    #[must_use]
    pub const fn used(&self) -> u64 {
        self.used
    }
}

/// Flattens (nested) ZIP archives into documents with path identifiers
#[derive(Debug, Clone, Copy)]
pub struct ArchiveExpander {
    max_depth: usize,
    max_entry_bytes: u64,
}

impl ArchiveExpander {
    #[must_use]
    pub const fn new(config: &PipelineConfig) -> Self {
        Self {
            max_depth: config.max_archive_depth,
            max_entry_bytes: config.max_entry_bytes,
        }
    }

    /// Expand an archive into its document members, in archive order.
    ///
    /// Members of the top-level archive are identified by their path inside
    /// it (`folder/sub/resume.pdf`); members of nested archives are prefixed
    /// with the nested archive's own identifier. Entries that are neither
    /// documents nor archives are skipped. A corrupt member becomes a
    /// [`ArchiveEntry::Failed`] without affecting its siblings; only the run
    /// size ceiling aborts expansion.
    pub fn expand(
        &self,
        identifier: &str,
        bytes: &[u8],
        budget: &mut SizeBudget,
    ) -> Result<Vec<ArchiveEntry>, RunError> {
        let mut entries = Vec::new();
        self.expand_into(identifier, None, bytes, 0, budget, &mut entries)?;
        Ok(entries)
    }

    fn expand_into(
        &self,
        identifier: &str,
        prefix: Option<&str>,
        bytes: &[u8],
        depth: usize,
        budget: &mut SizeBudget,
        out: &mut Vec<ArchiveEntry>,
    ) -> Result<(), RunError> {
        let mut archive = match ZipArchive::new(Cursor::new(bytes)) {
            Ok(archive) => archive,
            Err(err) => {
                warn!("Cannot open archive {identifier}: {err}");
                out.push(ArchiveEntry::Failed {
                    identifier: identifier.to_string(),
                    format: FormatTag::Zip,
                    error: ExtractError::ArchiveExtraction(err.to_string()),
                });
                return Ok(());
            }
        };

        debug!("Expanding {identifier}: {} entries, depth {depth}", archive.len());

        for index in 0..archive.len() {
            let fallback_name = archive
                .name_for_index(index)
                .map_or_else(|| format!("entry-{index}"), str::to_string);
            let member_id = |name: &str| match prefix {
                Some(prefix) => format!("{prefix}/{name}"),
                None => name.to_string(),
            };

            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(err) => {
                    out.push(ArchiveEntry::Failed {
                        format: FormatTag::from_name(&fallback_name),
                        identifier: member_id(&fallback_name),
                        error: ExtractError::ArchiveExtraction(err.to_string()),
                    });
                    continue;
                }
            };

            if entry.is_dir() {
                continue;
            }
            if entry.enclosed_name().is_none() {
                warn!("Skipping unsafe archive path {:?} in {identifier}", entry.name());
                continue;
            }

            let name = entry.name().replace('\\', "/");
            let member = member_id(&name);
            let by_name = FormatTag::from_name(&name);
            if by_name == FormatTag::Unknown {
                debug!("Skipping non-document entry {member}");
                continue;
            }

            let failure = |error: ExtractError| ArchiveEntry::Failed {
                identifier: member.clone(),
                format: by_name,
                error,
            };

            if entry.size() > self.max_entry_bytes {
                out.push(failure(ExtractError::ArchiveExtraction(format!(
                    "entry declares {} bytes, limit is {}",
                    entry.size(),
                    self.max_entry_bytes
                ))));
                continue;
            }

            let mut content = Vec::new();
            let read = (&mut entry)
                .take(self.max_entry_bytes + 1)
                .read_to_end(&mut content);
            budget.charge(content.len() as u64)?;
            if let Err(err) = read {
                out.push(failure(ExtractError::ArchiveExtraction(err.to_string())));
                continue;
            }
            if content.len() as u64 > self.max_entry_bytes {
                out.push(failure(ExtractError::ArchiveExtraction(format!(
                    "entry inflates past {} bytes",
                    self.max_entry_bytes
                ))));
                continue;
            }
            drop(entry);

            match FormatTag::resolve(&member, &content, None) {
                FormatTag::Zip if depth + 1 > self.max_depth => {
                    out.push(failure(ExtractError::ArchiveExtraction(format!(
                        "archive nesting deeper than {}",
                        self.max_depth
                    ))));
                }
                FormatTag::Zip => {
                    self.expand_into(&member, Some(&member), &content, depth + 1, budget, out)?;
                }
                format => {
                    out.push(ArchiveEntry::Document(InputFile::new(member, format, content)));
                }
            }
        }

        Ok(())
    }
}
