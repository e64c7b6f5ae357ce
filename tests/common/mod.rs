#![allow(dead_code)]

use lopdf::dictionary;
use lopdf::{Document, Object, Stream, StringFormat};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

/// Single-page PDF with one text line per entry
pub fn pdf_with_lines(lines: &[&str]) -> Vec<u8> {
    save(&mut pdf_document(lines))
}

/// PDF under the standard security handler with a user password set
pub fn encrypted_pdf_with_lines(lines: &[&str]) -> Vec<u8> {
    let mut doc = pdf_document(lines);
    let hex = |byte: u8| Object::String(vec![byte; 32], StringFormat::Hexadecimal);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "O" => hex(0x4F),
        "U" => hex(0x55),
        "P" => Object::Integer(-4),
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![
            Object::String(vec![0x01; 16], StringFormat::Hexadecimal),
            Object::String(vec![0x02; 16], StringFormat::Hexadecimal),
        ],
    );
    save(&mut doc)
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn pdf_document(lines: &[&str]) -> Document {
    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut content = String::new();
    for (i, line) in lines.iter().enumerate() {
        let y = 700 - i * 20;
        content.push_str(&format!("BT /F1 12 Tf 72 {y} Td ({line}) Tj ET\n"));
    }
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });

    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Minimal DOCX: body paragraphs, then a one-row table
pub fn docx_with(paragraphs: &[&str], cells: &[&str]) -> Vec<u8> {
    let mut body = String::new();
    for p in paragraphs {
        body.push_str(&format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"));
    }
    if !cells.is_empty() {
        body.push_str("<w:tbl><w:tr>");
        for c in cells {
            body.push_str(&format!("<w:tc><w:p><w:r><w:t>{c}</w:t></w:r></w:p></w:tc>"));
        }
        body.push_str("</w:tr></w:tbl>");
    }
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );
    zip_of(&[
        ("[Content_Types].xml", b"<Types/>"),
        ("word/document.xml", document.as_bytes()),
    ])
}

pub fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
