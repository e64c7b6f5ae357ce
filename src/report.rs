//! Final run report and its text renderings

use crate::stats::AggregateCounters;
use crate::types::{AcceptedEmail, FileOutcome, FileStat, FormatTag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

const RULE: &str = "==================================================";
const SOURCES_HEADING: &str = "EMAIL SOURCES:";
const STATS_HEADING: &str = "STATISTICS:";
const SOURCE_SEPARATOR: &str = " -> ";

/// Everything a run produced. Read-only once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    /// When the run finished
    pub generated_at: DateTime<Utc>,

    /// Unique emails in first-seen order, each with its source file
    pub emails: Vec<AcceptedEmail>,

    /// One entry per document processed, in submission order
    pub files: Vec<FileStat>,

    /// Sums and ratios over `files`
    pub counters: AggregateCounters,
}

impl AggregateReport {
    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.emails.len()
    }

    /// Canonical addresses in first-seen order
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(|e| e.address.as_str())
    }

    /// Email to source file mapping
    #[must_use]
    pub fn sources(&self) -> BTreeMap<&str, &str> {
        self.emails
            .iter()
            .map(|e| (e.address.as_str(), e.source.as_str()))
            .collect()
    }

    #[must_use]
    pub fn source_of(&self, address: &str) -> Option<&str> {
        self.emails
            .iter()
            .find(|e| e.address == address)
            .map(|e| e.source.as_str())
    }

    /// One address per line, first-seen order, no header
    #[must_use]
    pub fn render_simple(&self) -> String {
        self.emails.iter().fold(String::new(), |mut out, email| {
            let _ = writeln!(out, "{}", email.address);
            out
        })
    }

    /// Header block, one `email -> source` line per address, then statistics
    #[must_use]
    pub fn render_detailed(&self) -> String {
        let c = &self.counters;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "# Email Extraction Results - {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out, "# Total files processed: {}", c.files_processed);
        let _ = writeln!(out, "# Files with emails: {}", c.files_with_valid_email);
        let _ = writeln!(out, "# Unique emails: {}", self.unique_count());
        out.push('\n');

        let _ = writeln!(out, "{SOURCES_HEADING}\n{RULE}");
        for email in &self.emails {
            let _ = writeln!(out, "{}{SOURCE_SEPARATOR}{}", email.address, email.source);
        }
        out.push('\n');

        let _ = writeln!(out, "{STATS_HEADING}\n{RULE}");
        let _ = writeln!(out, "Files processed: {}", c.files_processed);
        let _ = writeln!(out, "Files with text: {}", c.files_with_text);
        let _ = writeln!(out, "Files with '@': {}", c.files_with_at);
        let _ = writeln!(out, "Files with valid emails: {}", c.files_with_valid_email);
        let _ = writeln!(out, "Files failed: {}", c.files_failed);
        let _ = writeln!(out, "Candidates found: {}", c.candidates_found);
        let _ = writeln!(out, "Candidates rejected: {}", c.candidates_rejected);
        for format in FormatTag::DOCUMENTS {
            let counts = c.format(format);
            let _ = writeln!(
                out,
                "Success rate ({format}): {:.1}% ({}/{})",
                counts.success_rate() * 100.0,
                counts.with_valid_email,
                counts.processed
            );
        }

        for stat in &self.files {
            if let FileOutcome::Failure { reason, .. } = &stat.outcome {
                let _ = writeln!(out, "Failed: {} ({reason})", stat.identifier);
            }
        }

        out
    }
}

/// Read the `email -> source` lines back out of a detailed report
#[must_use]
pub fn parse_detailed_sources(report: &str) -> Vec<(String, String)> {
    report
        .lines()
        .skip_while(|line| *line != SOURCES_HEADING)
        .skip(2)
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(SOURCE_SEPARATOR))
        .map(|(email, source)| (email.to_string(), source.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatisticsCollector;

    fn report() -> AggregateReport {
        let (counters, files) = StatisticsCollector::new().finalize();
        AggregateReport {
            generated_at: Utc::now(),
            emails: vec![
                AcceptedEmail {
                    address: "john@company.com".into(),
                    local_part: "john".into(),
                    domain: "company.com".into(),
                    source: "folder/sub/resume.pdf".into(),
                },
                AcceptedEmail {
                    address: "Ann@firm.io".into(),
                    local_part: "Ann".into(),
                    domain: "firm.io".into(),
                    source: "cv -> final.docx".into(),
                },
            ],
            files,
            counters,
        }
    }

    #[test]
    fn simple_list() {
        assert_eq!(report().render_simple(), "john@company.com\nAnn@firm.io\n");
    }

    #[test]
    fn detailed_round_trip() {
        let report = report();
        let parsed = parse_detailed_sources(&report.render_detailed());
        let expected: Vec<(String, String)> = report
            .emails
            .iter()
            .map(|e| (e.address.clone(), e.source.clone()))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn detailed_header_and_zero_rates() {
        let text = report().render_detailed();
        assert!(text.starts_with("# Email Extraction Results - "));
        assert!(text.contains("# Unique emails: 2"));
        assert!(text.contains("Success rate (DOC): 0.0% (0/0)"));
    }
}
