use folio_ingest::{
    load_document, load_documents_from_folder, unsupported_files, DocumentKind, IngestError,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn folder() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b_notes.txt"), "Revenue was $100M.\u{000C}Margin was 42%.").unwrap();
    fs::write(dir.path().join("a_kpis.csv"), "KPI,Value\nRevenue,$100M\n").unwrap();
    fs::write(dir.path().join("c_report.pdf"), [0x25, 0x50, 0x44, 0x46]).unwrap();
    fs::write(dir.path().join("e_logo.png"), [0x89, 0x50, 0x4E, 0x47]).unwrap();
    fs::write(dir.path().join(".hidden.txt"), "secret").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("d_extra.md"), "# Outlook\nStable.").unwrap();
    dir
}

#[test]
fn loads_supported_files_in_name_order() {
    let dir = folder();
    let docs = load_documents_from_folder(dir.path()).unwrap();

    let names: Vec<&str> = docs.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(names, vec!["a_kpis.csv", "b_notes.txt", "d_extra.md"]);
}

#[test]
fn csv_documents_cite_rows() {
    let dir = folder();
    let docs = load_documents_from_folder(dir.path()).unwrap();
    let csv = &docs[0];

    assert_eq!(csv.content, "Row 1: KPI=Revenue, Value=$100M");
    assert_eq!(csv.kind(), Some("csv"));
    assert_eq!(csv.metadata["rows"], "1");
    assert_eq!(csv.metadata["columns"], "2");
    assert_eq!(csv.metadata["path"], "a_kpis.csv");
}

#[test]
fn text_documents_cite_pages() {
    let dir = folder();
    let docs = load_documents_from_folder(dir.path()).unwrap();
    let text = &docs[1];

    assert_eq!(text.content, "[Page 1]\nRevenue was $100M.\n\n[Page 2]\nMargin was 42%.");
    assert_eq!(text.kind(), Some("text"));
    assert_eq!(text.metadata["pages"], "2");
    assert_eq!(docs[2].metadata["path"], "sub/d_extra.md");
}

#[test]
fn byte_counts_are_recorded() {
    let dir = folder();
    let docs = load_documents_from_folder(dir.path()).unwrap();
    assert_eq!(docs[0].metadata["bytes"], "24");
}

#[test]
fn empty_folder_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_documents_from_folder(dir.path()).unwrap().is_empty());
}

#[test]
fn missing_folder_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_documents_from_folder(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, IngestError::NotADirectory(_)));
}

#[test]
fn unsupported_files_are_reported() {
    let dir = folder();
    let skipped = unsupported_files(dir.path()).unwrap();
    assert_eq!(skipped, vec![dir.path().join("e_logo.png")]);
}

/// Single-font PDF with one text line per page
fn pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).unwrap();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn docx(body: &str) -> Vec<u8> {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

#[test]
fn pdf_documents_cite_pages() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("annual.pdf"), pdf(&["Revenue was 100M", "Margin was 42"])).unwrap();

    let docs = load_documents_from_folder(dir.path()).unwrap();
    assert_eq!(docs.len(), 1);
    let doc = &docs[0];

    assert_eq!(doc.kind(), Some("pdf"));
    assert_eq!(doc.metadata["pages"], "2");
    assert!(doc.content.starts_with("[Page 1]\nRevenue was 100M"));
    assert!(doc.content.contains("[Page 2]\nMargin was 42"));
}

#[test]
fn word_documents_cite_pages() {
    let dir = tempfile::tempdir().unwrap();
    let body = r#"<w:p><w:r><w:t>Revenue was $100M.</w:t></w:r></w:p><w:p><w:r><w:br w:type="page"/><w:t>Margin was 42%.</w:t></w:r></w:p>"#;
    fs::write(dir.path().join("memo.docx"), docx(body)).unwrap();

    let docs = load_documents_from_folder(dir.path()).unwrap();
    let doc = &docs[0];

    assert_eq!(doc.kind(), Some("word"));
    assert_eq!(doc.metadata["pages"], "2");
    assert_eq!(doc.content, "[Page 1]\nRevenue was $100M.\n\n[Page 2]\nMargin was 42%.");
}

#[test]
fn unreadable_pdf_is_skipped_not_fatal() {
    let dir = folder();
    let docs = load_documents_from_folder(dir.path()).unwrap();
    assert!(docs.iter().all(|d| d.filename != "c_report.pdf"));
}

#[test]
fn broken_word_file_is_an_error_when_loaded_directly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.docx");
    fs::write(&path, b"not a zip").unwrap();

    let err = load_document(&path, Path::new("broken.docx"), DocumentKind::Word).unwrap_err();
    assert!(matches!(err, IngestError::Word { .. }));
    assert!(err.is_unreadable_document());
}
