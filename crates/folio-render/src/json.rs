//! Incremental JSON report writer
//!
//! Writes a JSON array one section at a time so a finished section is on
//! disk before the next one starts. The output is valid JSON once
//! [`JsonReportWriter::finish`] has run, however many sections were written.

use crate::error::{RenderError, Result};
use folio_core::FinalizedSection;
use std::io::Write;
use std::path::Path;

pub struct JsonReportWriter<W: Write> {
    writer: W,
    started: bool,
    written: usize,
}

impl<W: Write> JsonReportWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            started: false,
            written: 0,
        }
    }

    /// Open the array
    ///
    /// # Errors
    /// Propagates write failures.
    pub fn begin(&mut self) -> Result<()> {
        if !self.started {
            self.writer.write_all(b"[")?;
            self.started = true;
        }
        Ok(())
    }

    /// Append one section and flush
    ///
    /// # Errors
    /// Propagates serialization and write failures.
    pub fn write_section(&mut self, section: &FinalizedSection) -> Result<()> {
        self.begin()?;
        let body = serde_json::to_string_pretty(section)?;
        let separator: &[u8] = if self.written == 0 { b"\n" } else { b",\n" };
        self.writer.write_all(separator)?;
        self.writer.write_all(body.as_bytes())?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Sections written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Close the array and hand back the writer
    ///
    /// # Errors
    /// Propagates write failures.
    pub fn finish(mut self) -> Result<W> {
        self.begin()?;
        self.writer.write_all(b"\n]\n")?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Read a report written by [`JsonReportWriter`]
///
/// # Errors
/// `RenderError::Read` when the file cannot be read, `RenderError::Json`
/// when it is not a section array.
pub fn read_report(path: &Path) -> Result<Vec<FinalizedSection>> {
    let text = std::fs::read_to_string(path).map_err(|source| RenderError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{DocumentSet, SectionSpec, SectionState};
    use pretty_assertions::assert_eq;

    fn section(title: &str) -> FinalizedSection {
        SectionState::new(DocumentSet::default(), &SectionSpec::new(title, "")).finalize()
    }

    #[test]
    fn empty_report_is_empty_array() {
        let mut writer = JsonReportWriter::new(Vec::new());
        writer.begin().unwrap();
        let out = writer.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[\n]\n");
    }

    #[test]
    fn sections_form_a_json_array() {
        let mut writer = JsonReportWriter::new(Vec::new());
        writer.write_section(&section("Overview")).unwrap();
        writer.write_section(&section("Risks")).unwrap();
        assert_eq!(writer.written(), 2);

        let out = writer.finish().unwrap();
        let parsed: Vec<FinalizedSection> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, vec![section("Overview"), section("Risks")]);
    }

    #[test]
    fn faults_are_omitted_when_clean() {
        let mut writer = JsonReportWriter::new(Vec::new());
        writer.write_section(&section("Overview")).unwrap();
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(!out.contains("faults"));
        assert!(out.contains("\"tabular_data\": null"));
    }
}
