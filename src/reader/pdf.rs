//! PDF text extraction

use crate::error::{ExtractError, Result};
use lopdf::Document;
use tracing::warn;

/// Extract the text of every page, pages separated by a blank line.
///
/// Encrypted documents are opened with the empty user password, which is
/// how permission-only protection works. Anything needing a real password
/// is reported as protected.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let mut doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(err) if declares_encryption(bytes) => {
            return Err(ExtractError::PasswordProtected(err.to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    if doc.trailer.has(b"Encrypt") {
        doc.decrypt("").map_err(|err| ExtractError::PasswordProtected(err.to_string()))?;
    }

    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(ExtractError::CorruptFile("PDF has no pages".into()));
    }

    let mut text_parts = Vec::with_capacity(pages.len());
    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => text_parts.push(page_text),
            Err(err) => warn!("PDF page {page_num} unreadable: {err}"),
        }
    }

    if text_parts.is_empty() {
        return Err(ExtractError::CorruptFile("no page text could be decoded".into()));
    }
    Ok(text_parts.join("\n\n"))
}

fn declares_encryption(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_corrupt() {
        let err = extract_text(b"%PDF-1.4 this is not really a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::CorruptFile(_)));
    }

    #[test]
    fn garbage_with_encrypt_marker_is_password_protected() {
        let err = extract_text(b"%PDF-1.4 trailer << /Encrypt 5 0 R >>").unwrap_err();
        assert!(matches!(err, ExtractError::PasswordProtected(_)));
    }
}
