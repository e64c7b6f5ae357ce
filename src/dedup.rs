//! First-seen deduplication of accepted emails

use crate::types::AcceptedEmail;
use std::collections::HashMap;

/// Ordered, duplicate-free set of accepted emails with their first source.
///
/// Two addresses that differ only in local-part casing are the same entry;
/// the first one added keeps its casing and source.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    emails: Vec<AcceptedEmail>,
    index: HashMap<String, usize>,
}

impl Deduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an email; returns `false` if an equivalent one is already present
    pub fn add(&mut self, email: AcceptedEmail) -> bool {
        let key = email.dedup_key();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.emails.len());
        self.emails.push(email);
        true
    }

    /// Look up the stored entry for any casing of `address`
    #[must_use]
    pub fn get(&self, address: &str) -> Option<&AcceptedEmail> {
        let (local, domain) = address.split_once('@')?;
        let key = format!("{}@{}", local.to_lowercase(), domain.to_ascii_lowercase());
        self.index.get(&key).map(|&i| &self.emails[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Emails in first-seen order
    #[must_use]
    pub fn into_emails(self) -> Vec<AcceptedEmail> {
        self.emails
    }
}
