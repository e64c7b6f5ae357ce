// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(clippy::significant_drop_tightening)]

//! Email Harvest
//!
//! Extracts, validates and deduplicates email addresses embedded in
//! document files: PDF, DOCX, legacy Word `.doc`, and ZIP archives holding
//! any mix of these, nested to any (bounded) depth.
//!
//! # Features
//!
//! - Per-format text extraction with explicit failure reasons
//! - Standard, spaced (`john @ company . com`) and full-width recognition
//! - Canonicalization with domain lower-casing and structural validation
//! - First-seen deduplication with source-file provenance
//! - Per-file flags and per-format success rates
//! - Simple and detailed text reports
//!
//! # Example
//!
//! ```rust,no_run
//! use email_harvest::{ExtractionPipeline, PipelineConfig, SubmittedFile};
//!
//! # async fn demo() -> Result<(), email_harvest::RunError> {
//! let pipeline = ExtractionPipeline::new(PipelineConfig::default());
//! let files = vec![SubmittedFile::new("resume.pdf", std::fs::read("resume.pdf").unwrap())];
//! let report = pipeline.run(files).await?;
//!
//! print!("{}", report.render_simple());
//! # Ok(())
//! # }
//! ```

mod archive;
mod config;
mod dedup;
mod error;
mod matcher;
mod normalizer;
mod pipeline;
mod reader;
mod report;
mod stats;
mod types;

pub use archive::{ArchiveEntry, ArchiveExpander, SizeBudget};
pub use config::PipelineConfig;
pub use dedup::Deduplicator;
pub use error::{ExtractError, FailureKind, Result, RunError};
pub use matcher::EmailPatternMatcher;
pub use normalizer::{EmailNormalizer, Rejection};
pub use pipeline::{ExtractionPipeline, FileResult, analyze_file};
pub use reader::{FormatReader, LegacyDocConverter, OfficeCommandConverter};
pub use report::{AggregateReport, parse_detailed_sources};
pub use stats::{AggregateCounters, FormatCounters, StatisticsCollector};
pub use types::*;
