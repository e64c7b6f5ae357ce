//! Per-file and aggregate extraction statistics

use crate::types::{FileStat, FormatTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts for one document format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatCounters {
    /// Files of this format that were processed
    pub processed: usize,

    /// Of those, files with at least one valid email
    pub with_valid_email: usize,
}

impl FormatCounters {
    /// Share of processed files that yielded an email; zero when none were processed
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.with_valid_email as f64 / self.processed as f64
        }
    }
}

/// Sums over all recorded [`FileStat`]s
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregateCounters {
    pub files_processed: usize,
    pub files_with_text: usize,
    pub files_with_at: usize,
    pub files_with_valid_email: usize,
    pub files_failed: usize,
    pub candidates_found: usize,
    pub candidates_rejected: usize,
    pub per_format: BTreeMap<FormatTag, FormatCounters>,
}

impl AggregateCounters {
    /// Counters for `format`, zeroed if no file of that format was seen
    #[must_use]
    pub fn format(&self, format: FormatTag) -> FormatCounters {
        self.per_format.get(&format).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn success_rate(&self, format: FormatTag) -> f64 {
        self.format(format).success_rate()
    }
}

/// Accumulates file statistics for one run
#[derive(Debug, Clone, Default)]
pub struct StatisticsCollector {
    files: Vec<FileStat>,
}

impl StatisticsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stat: FileStat) {
        self.files.push(stat);
    }

    /// Compute the aggregate counters and hand back the recorded stats
    #[must_use]
    pub fn finalize(self) -> (AggregateCounters, Vec<FileStat>) {
        let mut counters = AggregateCounters::default();

        for stat in &self.files {
            counters.files_processed += 1;
            counters.files_with_text += usize::from(stat.text_extracted);
            counters.files_with_at += usize::from(stat.contains_at);
            counters.files_with_valid_email += usize::from(stat.contains_valid_email);
            counters.files_failed += usize::from(!stat.outcome.is_success());
            counters.candidates_found += stat.candidates_found;
            counters.candidates_rejected += stat.candidates_rejected;

            let per_format = counters.per_format.entry(stat.format).or_default();
            per_format.processed += 1;
            per_format.with_valid_email += usize::from(stat.contains_valid_email);
        }

        (counters, self.files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::types::FileOutcome;

    fn ok_stat(id: &str, format: FormatTag, emails: usize) -> FileStat {
        FileStat {
            identifier: id.into(),
            format,
            text_extracted: true,
            contains_at: emails > 0,
            contains_valid_email: emails > 0,
            at_symbols: emails,
            candidates_found: emails + 1,
            candidates_accepted: emails,
            candidates_rejected: 1,
            outcome: FileOutcome::Success,
        }
    }

    #[test]
    fn sums_and_rates() {
        let mut collector = StatisticsCollector::new();
        collector.record(ok_stat("a.pdf", FormatTag::Pdf, 2));
        collector.record(ok_stat("b.pdf", FormatTag::Pdf, 0));
        collector.record(FileStat::failed(
            "c.docx",
            FormatTag::Docx,
            &ExtractError::CorruptFile("bad".into()),
        ));
        let (counters, files) = collector.finalize();

        assert_eq!(files.len(), 3);
        assert_eq!(counters.files_processed, 3);
        assert_eq!(counters.files_with_text, 2);
        assert_eq!(counters.files_with_valid_email, 1);
        assert_eq!(counters.files_failed, 1);
        assert_eq!(counters.candidates_found, 4);
        assert_eq!(counters.candidates_rejected, 2);
        assert!((counters.success_rate(FormatTag::Pdf) - 0.5).abs() < f64::EPSILON);
        assert!(counters.success_rate(FormatTag::Docx).abs() < f64::EPSILON);
    }

    #[test]
    fn unseen_format_rate_is_zero() {
        let (counters, _) = StatisticsCollector::new().finalize();
        assert_eq!(counters.format(FormatTag::LegacyDoc), FormatCounters::default());
        assert!(counters.success_rate(FormatTag::LegacyDoc).abs() < f64::EPSILON);
    }
}
