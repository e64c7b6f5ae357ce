//! Extraction run orchestration
//!
//! A run expands archives, reads every document on a bounded number of
//! worker threads, then merges the per-file results in submission order
//! so first-seen provenance does not depend on scheduling.
//!
//! Workers are plain detached threads rather than the runtime's blocking
//! pool. A file that overruns its timeout is abandoned, and an abandoned
//! thread never holds up the caller or runtime shutdown.

use crate::archive::{ArchiveEntry, ArchiveExpander, SizeBudget};
use crate::config::PipelineConfig;
use crate::dedup::Deduplicator;
use crate::error::{ExtractError, RunError};
use crate::matcher::EmailPatternMatcher;
use crate::normalizer::EmailNormalizer;
use crate::reader::FormatReader;
use crate::report::AggregateReport;
use crate::stats::StatisticsCollector;
use crate::types::{AcceptedEmail, FileOutcome, FileStat, FormatTag, InputFile, SubmittedFile};
use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// What one document contributed to the run
#[derive(Debug, Clone)]
pub struct FileResult {
    pub stat: FileStat,
    pub emails: Vec<AcceptedEmail>,
}

impl FileResult {
    fn failed(identifier: &str, format: FormatTag, error: &ExtractError) -> Self {
        warn!("{identifier}: {error}");
        Self {
            stat: FileStat::failed(identifier, format, error),
            emails: Vec::new(),
        }
    }
}

/// Unit of work after archive expansion
enum WorkItem {
    Read(InputFile),
    Failed(FileStat),
}

/// Single-run accumulator for emails and statistics
#[derive(Debug, Default)]
struct RunAccumulator {
    dedup: Deduplicator,
    stats: StatisticsCollector,
}

impl RunAccumulator {
    fn merge(&mut self, result: FileResult) {
        for email in result.emails {
            self.dedup.add(email);
        }
        self.stats.record(result.stat);
    }

    fn finish(self) -> AggregateReport {
        let (counters, files) = self.stats.finalize();
        AggregateReport {
            generated_at: Utc::now(),
            emails: self.dedup.into_emails(),
            files,
            counters,
        }
    }
}

/// Read, match and normalize one document. Pure in the document's bytes.
#[must_use]
pub fn analyze_file(
    reader: &FormatReader,
    matcher: &EmailPatternMatcher,
    normalizer: &EmailNormalizer,
    input: &InputFile,
) -> FileResult {
    let extracted = reader.extract(input);
    let text = match extracted.content {
        Ok(text) => text,
        Err(err) => return FileResult::failed(&input.identifier, input.format, &err),
    };

    let candidates = matcher.find(&text, &input.identifier);
    let mut emails = Vec::with_capacity(candidates.len());
    let mut rejected = 0usize;
    for candidate in &candidates {
        match normalizer.normalize(candidate) {
            Ok(email) => emails.push(email),
            Err(reason) => {
                debug!("{}: rejected {:?}: {reason}", input.identifier, candidate.raw);
                rejected += 1;
            }
        }
    }

    debug!(
        "{}: {} candidates, {} accepted",
        input.identifier,
        candidates.len(),
        emails.len()
    );

    FileResult {
        stat: FileStat {
            identifier: input.identifier.clone(),
            format: input.format,
            text_extracted: !text.trim().is_empty(),
            contains_at: !candidates.is_empty(),
            contains_valid_email: !emails.is_empty(),
            at_symbols: text.matches(['@', '＠']).count(),
            candidates_found: candidates.len(),
            candidates_accepted: emails.len(),
            candidates_rejected: rejected,
            outcome: FileOutcome::Success,
        },
        emails,
    }
}

/// Orchestrates extraction runs
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    config: PipelineConfig,
    reader: Arc<FormatReader>,
    matcher: EmailPatternMatcher,
    normalizer: EmailNormalizer,
}

impl ExtractionPipeline {
    /// Pipeline with the platform's legacy DOC converter when enabled
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let reader = if config.legacy_doc {
            FormatReader::detect_platform()
        } else {
            FormatReader::new()
        };
        let reader = reader.with_convert_timeout(config.file_timeout());
        Self {
            config,
            reader: Arc::new(reader),
            matcher: EmailPatternMatcher::new(),
            normalizer: EmailNormalizer::new(),
        }
    }

    #[must_use]
    pub fn with_reader(mut self, reader: FormatReader) -> Self {
        self.reader = Arc::new(reader);
        self
    }

    /// Process `inputs` and build the report.
    ///
    /// Individual file failures only show up in the report. The run fails as
    /// a whole when nothing was submitted, the size ceiling is exceeded, or
    /// the run timeout elapses. Dropping the returned future cancels the run;
    /// no partial report is ever produced.
    pub async fn run(&self, inputs: Vec<SubmittedFile>) -> Result<AggregateReport, RunError> {
        match self.config.run_timeout_secs {
            Some(seconds) => {
                tokio::time::timeout(Duration::from_secs(seconds), self.run_inner(inputs))
                    .await
                    .map_err(|_| RunError::Timeout { seconds })?
            }
            None => self.run_inner(inputs).await,
        }
    }

    async fn run_inner(&self, inputs: Vec<SubmittedFile>) -> Result<AggregateReport, RunError> {
        if inputs.is_empty() {
            return Err(RunError::NoInput);
        }
        info!("Extraction run started: {} submitted files", inputs.len());

        let expander = ArchiveExpander::new(&self.config);
        let limit = self.config.max_total_bytes;
        let job = move || plan(expander, limit, inputs);
        let work = run_detached("email-harvest-plan".into(), job)
            .await?
            .ok_or_else(|| RunError::Worker("archive expansion crashed".into()))??;

        let results: Vec<Result<FileResult, RunError>> = stream::iter(work)
            .map(|item| self.process(item))
            .buffered(self.config.worker_count())
            .collect()
            .await;

        let mut accumulator = RunAccumulator::default();
        for result in results {
            accumulator.merge(result?);
        }
        let report = accumulator.finish();

        info!(
            "Extraction run finished: {} files, {} with emails, {} unique emails",
            report.counters.files_processed,
            report.counters.files_with_valid_email,
            report.unique_count()
        );
        Ok(report)
    }

    async fn process(&self, item: WorkItem) -> Result<FileResult, RunError> {
        let input = match item {
            WorkItem::Read(input) => input,
            WorkItem::Failed(stat) => {
                return Ok(FileResult {
                    stat,
                    emails: Vec::new(),
                });
            }
        };

        let identifier = input.identifier.clone();
        let format = input.format;
        let reader = Arc::clone(&self.reader);
        let matcher = self.matcher;
        let normalizer = self.normalizer;
        let task = run_detached(format!("email-harvest-{format}"), move || {
            analyze_file(&reader, &matcher, &normalizer, &input)
        });

        match tokio::time::timeout(self.config.file_timeout(), task).await {
            Ok(Ok(Some(result))) => Ok(result),
            Ok(Ok(None)) => Ok(FileResult::failed(
                &identifier,
                format,
                &ExtractError::CorruptFile("reader crashed on malformed content".into()),
            )),
            Ok(Err(err)) => Err(err),
            Err(_) => Ok(FileResult::failed(
                &identifier,
                format,
                &ExtractError::Timeout {
                    seconds: self.config.file_timeout_secs,
                },
            )),
        }
    }
}

/// Classify submissions and expand archives into work items, in order
fn plan(
    expander: ArchiveExpander,
    limit: u64,
    inputs: Vec<SubmittedFile>,
) -> Result<Vec<WorkItem>, RunError> {
    let mut budget = SizeBudget::new(limit);
    let mut work = Vec::with_capacity(inputs.len());

    for submitted in inputs {
        let input = submitted.into_input();
        if input.format == FormatTag::Zip {
            for entry in expander.expand(&input.identifier, &input.bytes, &mut budget)? {
                work.push(match entry {
                    ArchiveEntry::Document(file) => WorkItem::Read(file),
                    ArchiveEntry::Failed {
                        identifier,
                        format,
                        error,
                    } => WorkItem::Failed(FileResult::failed(&identifier, format, &error).stat),
                });
            }
        } else {
            budget.charge(input.bytes.len() as u64)?;
            work.push(WorkItem::Read(input));
        }
    }

    debug!("Planned {} files, {} bytes", work.len(), budget.used());
    Ok(work)
}

/// Run `job` on its own detached thread.
///
/// Resolves to `None` if the job panicked. Dropping the future abandons the
/// job; its thread finishes on its own without anyone waiting for it.
async fn run_detached<T, F>(name: String, job: F) -> Result<Option<T>, RunError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name(name)
        .spawn(move || {
            // Receiver is gone when the caller gave up
            let _ = tx.send(job());
        })
        .map_err(|e| RunError::Worker(e.to_string()))?;
    Ok(rx.await.ok())
}
