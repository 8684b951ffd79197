//! Page text out of PDF and Word files

use crate::error::WordError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};

const DOCX_BODY: &str = "word/document.xml";

/// Text of every page, numbered from 1
///
/// A page whose text cannot be decoded comes back empty rather than failing
/// the whole file.
pub(crate) fn pdf_pages(bytes: &[u8]) -> Result<Vec<(usize, String)>, lopdf::Error> {
    let document = lopdf::Document::load_mem(bytes)?;
    let pages = document
        .get_pages()
        .into_keys()
        .map(|number| {
            let text = document.extract_text(&[number]).unwrap_or_else(|err| {
                tracing::warn!(page = number, error = %err, "PDF page text not extractable");
                String::new()
            });
            (number as usize, text)
        })
        .collect();
    Ok(pages)
}

/// Text of a `.docx` split on explicit page breaks, numbered from 1
///
/// Paragraphs end with a newline; tabs and line breaks are kept.
pub(crate) fn docx_pages(bytes: &[u8]) -> Result<Vec<(usize, String)>, WordError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCX_BODY)?.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut pages = vec![String::new()];
    let mut in_text = false;

    loop {
        let current = pages.len() - 1;
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => pages[current].push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"br" if is_page_break(&e) => pages.push(String::new()),
                b"br" | b"cr" => pages[current].push('\n'),
                b"tab" => pages[current].push('\t'),
                _ => {}
            },
            Event::Text(text) if in_text => pages[current].push_str(&text.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages.into_iter().enumerate().map(|(idx, text)| (idx + 1, text)).collect())
}

fn is_page_break(element: &BytesStart<'_>) -> bool {
    element
        .attributes()
        .flatten()
        .any(|attr| attr.key.local_name().as_ref() == b"type" && attr.value.as_ref() == b"page")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCX_BODY, SimpleFileOptions::default()).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn word_paragraphs_and_page_breaks() {
        let bytes = docx(
            r#"<w:p><w:r><w:t>Revenue was </w:t></w:r><w:r><w:t>$100M &amp; rising.</w:t></w:r></w:p><w:p><w:r><w:br w:type="page"/><w:t>Margin was 42%.</w:t></w:r></w:p>"#,
        );
        let pages = docx_pages(&bytes).unwrap();

        assert_eq!(
            pages,
            vec![
                (1, "Revenue was $100M & rising.\n".to_string()),
                (2, "Margin was 42%.\n".to_string()),
            ]
        );
    }

    #[test]
    fn word_without_body_is_an_archive_error() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", SimpleFileOptions::default()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(docx_pages(&bytes), Err(WordError::Archive(_))));
    }

    #[test]
    fn garbage_is_not_a_pdf() {
        assert!(pdf_pages(b"%PDF").is_err());
    }
}
