//! DOCX (OOXML word-processing) text extraction

use crate::error::{ExtractError, Result};
use crate::types::{DOCX_BODY_PART, is_cfb};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use zip::ZipArchive;
use zip::result::ZipError;

/// Largest XML part that will be inflated
const MAX_PART_BYTES: u64 = 64 * 1024 * 1024;

/// Extract paragraph and table-cell text in document order, followed by
/// headers and footers
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    if is_cfb(bytes) {
        return Err(ExtractError::PasswordProtected(
            "encrypted OOXML package".into(),
        ));
    }

    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let body = read_part(&mut archive, DOCX_BODY_PART)?
        .ok_or_else(|| ExtractError::CorruptFile(format!("missing {DOCX_BODY_PART}")))?;
    let mut text = xml_text(&body)?;

    let mut extra_parts: Vec<String> = archive
        .file_names()
        .filter(|name| is_header_or_footer(name))
        .map(String::from)
        .collect();
    extra_parts.sort();

    for name in extra_parts {
        if let Some(xml) = read_part(&mut archive, &name)? {
            text.push('\n');
            text.push_str(&xml_text(&xml)?);
        }
    }

    Ok(text)
}

fn is_header_or_footer(name: &str) -> bool {
    name.strip_prefix("word/").is_some_and(|rest| {
        (rest.starts_with("header") || rest.starts_with("footer"))
            && rest.ends_with(".xml")
            && !rest.contains('/')
    })
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Option<String>> {
    read_part_limited(archive, name, MAX_PART_BYTES)
}

fn read_part_limited(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Option<String>> {
    let part = match archive.by_name(name) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let too_large = || ExtractError::CorruptFile(format!("{name} exceeds {max_bytes} bytes"));
    if part.size() > max_bytes {
        return Err(too_large());
    }

    let mut xml = String::new();
    part.take(max_bytes + 1)
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::CorruptFile(format!("{name}: {e}")))?;
    if xml.len() as u64 > max_bytes {
        return Err(too_large());
    }
    Ok(Some(xml))
}

/// Flatten WordprocessingML into plain text.
///
/// Paragraphs and table rows end lines, cells are tab separated.
fn xml_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::with_capacity(xml.len() / 4);
    let mut in_text_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" | b"tr" => out.push('\n'),
                b"tc" => out.push('\t'),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_text_run => out.push_str(&e.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_and_cells_in_order() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
            <w:p><w:r><w:t>Intro</w:t></w:r></w:p>
            <w:tbl><w:tr>
              <w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc>
              <w:tc><w:p><w:r><w:t>ann@firm.io</w:t></w:r></w:p></w:tc>
            </w:tr></w:tbl>
            <w:p><w:r><w:t xml:space="preserve">Tom &amp; Co</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = xml_text(xml).unwrap();
        let intro = text.find("Intro").unwrap();
        let email = text.find("ann@firm.io").unwrap();
        let tail = text.find("Tom & Co").unwrap();
        assert!(intro < email && email < tail);
        assert!(text.contains("Name\n\tann@firm.io"));
    }

    #[test]
    fn markup_outside_text_runs_ignored() {
        let xml = concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>"#,
            "<w:r><w:t>Hi</w:t></w:r></w:p>"
        );
        assert_eq!(xml_text(xml).unwrap(), "Hi\n");
    }

    #[test]
    fn header_footer_names() {
        assert!(is_header_or_footer("word/header1.xml"));
        assert!(is_header_or_footer("word/footer2.xml"));
        assert!(!is_header_or_footer("word/_rels/header1.xml.rels"));
        assert!(!is_header_or_footer("word/document.xml"));
    }

    #[test]
    fn oversized_part_is_an_error_not_truncated() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCX_BODY_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut writer, &[b' '; 200]).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert!(matches!(
            read_part_limited(&mut archive, DOCX_BODY_PART, 64),
            Err(ExtractError::CorruptFile(_))
        ));
        let whole = read_part_limited(&mut archive, DOCX_BODY_PART, 200).unwrap();
        assert_eq!(whole.map(|xml| xml.len()), Some(200));
    }

    #[test]
    fn cfb_container_is_password_protected() {
        let bytes = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0];
        assert!(matches!(
            extract_text(&bytes),
            Err(ExtractError::PasswordProtected(_))
        ));
    }

    #[test]
    fn not_a_zip_is_corrupt() {
        assert!(matches!(
            extract_text(b"definitely not a docx"),
            Err(ExtractError::CorruptFile(_))
        ));
    }
}
