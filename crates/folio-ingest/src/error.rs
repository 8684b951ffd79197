//! Ingestion errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse PDF {path}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("failed to parse Word document {path}: {source}")]
    Word {
        path: PathBuf,
        #[source]
        source: WordError,
    },

    #[error("failed to walk folder: {0}")]
    Walk(#[from] walkdir::Error),
}

impl IngestError {
    /// The file was read but its contents could not be extracted
    #[must_use]
    pub fn is_unreadable_document(&self) -> bool {
        matches!(self, Self::Pdf { .. } | Self::Word { .. })
    }
}

/// Failure inside a `.docx` package
#[derive(Debug, Error)]
pub enum WordError {
    #[error("archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("document.xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("document.xml: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
