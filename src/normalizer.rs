//! Candidate cleanup, validation and canonicalization

use crate::types::{AcceptedEmail, EmailCandidate};
use serde::{Deserialize, Serialize};
use std::fmt;

const MIN_TLD_LEN: usize = 2;
const MAX_TLD_LEN: usize = 24;

/// Formatting debris that may cling to either end of a candidate
const WRAPPING_ARTIFACTS: &[char] = &[
    '*', '[', ']', '(', ')', '<', '>', '{', '}', '"', '\'', '`', '|',
];

/// Punctuation that trails an address in running text
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Why a candidate was not accepted.
///
/// Rejections are expected noise and only feed statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Nothing left after cleanup
    Empty,
    /// Not exactly one '@'
    AtCount(usize),
    /// Local part empty or outside `[A-Za-z0-9._-]`
    InvalidLocalPart,
    /// Domain without a '.'
    MissingDot,
    /// Empty label or characters outside `[a-z0-9-]`
    InvalidDomain,
    /// Final label not 2-24 letters
    InvalidTld,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty candidate"),
            Self::AtCount(n) => write!(f, "expected one '@', found {n}"),
            Self::InvalidLocalPart => write!(f, "invalid local part"),
            Self::MissingDot => write!(f, "domain has no '.'"),
            Self::InvalidDomain => write!(f, "invalid domain"),
            Self::InvalidTld => write!(f, "invalid top-level domain"),
        }
    }
}

/// Turns candidates into canonical addresses
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailNormalizer;

impl EmailNormalizer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validate and canonicalize a matched candidate
    pub fn normalize(&self, candidate: &EmailCandidate) -> Result<AcceptedEmail, Rejection> {
        self.normalize_str(&candidate.collapsed, &candidate.source)
    }

    /// Validate and canonicalize a raw string attributed to `source`
    pub fn normalize_str(&self, raw: &str, source: &str) -> Result<AcceptedEmail, Rejection> {
        let cleaned = strip_artifacts(raw);
        if cleaned.is_empty() {
            return Err(Rejection::Empty);
        }

        let at_count = cleaned.matches('@').count();
        if at_count != 1 {
            return Err(Rejection::AtCount(at_count));
        }
        let Some((local, domain)) = cleaned.split_once('@') else {
            return Err(Rejection::AtCount(0));
        };

        if local.is_empty()
            || !local
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(Rejection::InvalidLocalPart);
        }

        let domain = domain.to_ascii_lowercase();
        validate_domain(&domain)?;

        Ok(AcceptedEmail {
            address: format!("{local}@{domain}"),
            local_part: local.to_string(),
            domain,
            source: source.to_string(),
        })
    }
}

fn strip_artifacts(raw: &str) -> String {
    let mut s: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    loop {
        let trimmed = s
            .trim_matches(WRAPPING_ARTIFACTS)
            .trim_end_matches(TRAILING_PUNCTUATION)
            .trim_start_matches('.');
        let trimmed = strip_mailto(trimmed);
        if trimmed.len() == s.len() {
            return s;
        }
        s = trimmed.to_string();
    }
}

fn strip_mailto(s: &str) -> &str {
    match s.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("mailto:") => &s[7..],
        _ => s,
    }
}

fn validate_domain(domain: &str) -> Result<(), Rejection> {
    let Some((_, tld)) = domain.rsplit_once('.') else {
        return Err(Rejection::MissingDot);
    };

    let labels_ok = domain.split('.').all(|label| {
        !label.is_empty()
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    });
    if !labels_ok {
        return Err(Rejection::InvalidDomain);
    }

    if !(MIN_TLD_LEN..=MAX_TLD_LEN).contains(&tld.len())
        || !tld.chars().all(|c| c.is_ascii_alphabetic())
    {
        return Err(Rejection::InvalidTld);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> Result<String, Rejection> {
        EmailNormalizer::new()
            .normalize_str(raw, "f.pdf")
            .map(|e| e.address)
    }

    #[test]
    fn lowercases_domain_only() {
        assert_eq!(normalize("John.Smith@Company.COM").unwrap(), "John.Smith@company.com");
    }

    #[test]
    fn strips_wrappers_and_trailing_punctuation() {
        assert_eq!(normalize("**<john@company.com>**,").unwrap(), "john@company.com");
        assert_eq!(normalize("(mailto:ann@firm.io).").unwrap(), "ann@firm.io");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("john @ company . com").unwrap(), "john@company.com");
    }

    #[test]
    fn double_at_rejected() {
        assert_eq!(normalize("notanemail@@domain"), Err(Rejection::AtCount(2)));
    }

    #[test]
    fn structural_rejections() {
        assert_eq!(normalize("@company.com"), Err(Rejection::InvalidLocalPart));
        assert_eq!(normalize("jo+hn@company.com"), Err(Rejection::InvalidLocalPart));
        assert_eq!(normalize("john@localhost"), Err(Rejection::MissingDot));
        assert_eq!(normalize("john@company..com"), Err(Rejection::InvalidDomain));
        assert_eq!(normalize("john@company.c"), Err(Rejection::InvalidTld));
        assert_eq!(normalize("john@company.c0m"), Err(Rejection::InvalidTld));
        assert_eq!(
            normalize("john@company.abcdefghijklmnopqrstuvwxy"),
            Err(Rejection::InvalidTld)
        );
        assert_eq!(normalize("***"), Err(Rejection::Empty));
    }

    #[test]
    fn accepted_parts() {
        let email = EmailNormalizer::new()
            .normalize_str("Ann_Lee@Sub.Example.Org", "cv.docx")
            .unwrap();
        assert_eq!(email.local_part, "Ann_Lee");
        assert_eq!(email.domain, "sub.example.org");
        assert_eq!(email.source, "cv.docx");
    }
}
