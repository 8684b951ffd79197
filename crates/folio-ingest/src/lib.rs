//! Folio Ingest - folder to documents
//!
//! Walks a folder recursively in file-name order and turns every supported
//! file into a [`Document`]. Text, PDF and Word files become `[Page N]`
//! blocks and CSV records become `Row N: header=value, ...` lines, so the
//! extraction stage can cite a page or a row.
//!
//! Unsupported files are skipped with a warning, as are PDF and Word files
//! whose contents cannot be extracted.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
mod paged;

pub use error::{IngestError, Result, WordError};

use folio_core::Document;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Form feed, the page separator of extracted text
const PAGE_BREAK: char = '\u{000C}';

/// How a file is turned into a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Plain text, form feeds separate pages
    Text,
    /// Delimited records with the given separator byte
    Delimited(u8),
    /// PDF, one block per page
    Pdf,
    /// Word `.docx`, split on explicit page breaks
    Word,
}

impl DocumentKind {
    /// Kind for a file extension, `None` when unsupported
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" | "markdown" | "json" | "log" => Some(Self::Text),
            "csv" => Some(Self::Delimited(b',')),
            "tsv" => Some(Self::Delimited(b'\t')),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Word),
            _ => None,
        }
    }
}

/// Load every supported file under `folder`
///
/// An empty folder yields an empty vec.
///
/// # Errors
/// - `IngestError::NotADirectory` when `folder` is not a directory
/// - `IngestError::Io` / `IngestError::Csv` when a supported file cannot be read
pub fn load_documents_from_folder(folder: impl AsRef<Path>) -> Result<Vec<Document>> {
    let folder = folder.as_ref();
    if !folder.is_dir() {
        return Err(IngestError::NotADirectory(folder.to_path_buf()));
    }

    let mut documents = Vec::new();
    let walker = WalkDir::new(folder)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(kind) = DocumentKind::from_path(path) else {
            tracing::warn!(path = %path.display(), "unsupported file type, skipping");
            continue;
        };

        let relative = path.strip_prefix(folder).unwrap_or(path);
        match load_document(path, relative, kind) {
            Ok(document) => documents.push(document),
            Err(err) if err.is_unreadable_document() => {
                tracing::warn!(path = %path.display(), error = %err, "document not extractable, skipping");
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(folder = %folder.display(), documents = documents.len(), "documents loaded");
    Ok(documents)
}

/// Load a single file as a document of the given kind
///
/// # Errors
/// `IngestError::Io`, `Csv`, `Pdf` or `Word` on read or parse failure.
pub fn load_document(path: &Path, relative: &Path, kind: DocumentKind) -> Result<Document> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path
        .file_name()
        .map_or_else(|| relative.display().to_string(), |n| n.to_string_lossy().into_owned());

    let document = match kind {
        DocumentKind::Text => {
            let text = String::from_utf8_lossy(&bytes);
            let (content, pages) = paginate(&text);
            Document::new(filename, content)
                .with_metadata("type", "text")
                .with_metadata("pages", pages.to_string())
        }
        DocumentKind::Delimited(delimiter) => {
            let table = render_rows(&bytes, delimiter).map_err(|source| IngestError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            Document::new(filename, table.content)
                .with_metadata("type", "csv")
                .with_metadata("rows", table.rows.to_string())
                .with_metadata("columns", table.columns.to_string())
        }
        DocumentKind::Pdf => {
            let pages = paged::pdf_pages(&bytes).map_err(|source| IngestError::Pdf {
                path: path.to_path_buf(),
                source,
            })?;
            let (content, count) = render_pages(pages.iter().map(|(n, text)| (*n, text.as_str())));
            Document::new(filename, content)
                .with_metadata("type", "pdf")
                .with_metadata("pages", count.to_string())
        }
        DocumentKind::Word => {
            let pages = paged::docx_pages(&bytes).map_err(|source| IngestError::Word {
                path: path.to_path_buf(),
                source,
            })?;
            let (content, count) = render_pages(pages.iter().map(|(n, text)| (*n, text.as_str())));
            Document::new(filename, content)
                .with_metadata("type", "word")
                .with_metadata("pages", count.to_string())
        }
    };

    tracing::debug!(path = %path.display(), bytes = bytes.len(), kind = ?kind, "document loaded");
    Ok(document
        .with_metadata("path", slash_path(relative))
        .with_metadata("bytes", bytes.len().to_string()))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// `[Page N]` blocks, one per non-blank form-feed separated page
fn paginate(text: &str) -> (String, usize) {
    render_pages(text.split(PAGE_BREAK).enumerate().map(|(idx, page)| (idx + 1, page)))
}

/// `[Page N]` blocks for numbered pages, blank pages left out
fn render_pages<'a>(pages: impl IntoIterator<Item = (usize, &'a str)>) -> (String, usize) {
    let mut out = String::new();
    let mut count = 0;
    for (number, page) in pages {
        let page = page.trim();
        if page.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        count += 1;
        let _ = write!(out, "[Page {number}]\n{page}");
    }
    (out, count)
}

struct RenderedRows {
    content: String,
    rows: usize,
    columns: usize,
}

/// One `Row N: header=value, ...` line per record
fn render_rows(bytes: &[u8], delimiter: u8) -> std::result::Result<RenderedRows, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut lines = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let cells: Vec<String> = record
            .iter()
            .enumerate()
            .map(|(col, value)| {
                let header = headers
                    .get(col)
                    .filter(|h| !h.is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("column_{}", col + 1));
                format!("{header}={}", value.trim())
            })
            .collect();
        lines.push(format!("Row {}: {}", idx + 1, cells.join(", ")));
    }

    Ok(RenderedRows {
        rows: lines.len(),
        columns: headers.len(),
        content: lines.join("\n"),
    })
}

/// Paths of files `load_documents_from_folder` would skip
///
/// # Errors
/// Same as [`load_documents_from_folder`].
pub fn unsupported_files(folder: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let folder = folder.as_ref();
    if !folder.is_dir() {
        return Err(IngestError::NotADirectory(folder.to_path_buf()));
    }
    let mut skipped = Vec::new();
    for entry in WalkDir::new(folder)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry?;
        if entry.file_type().is_file() && DocumentKind::from_path(entry.path()).is_none() {
            skipped.push(entry.path().to_path_buf());
        }
    }
    Ok(skipped)
}
