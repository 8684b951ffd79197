//! Streaming a run into report files
//!
//! Sections are appended to the JSON report as the orchestrator yields
//! them, so an interrupted run still leaves a valid file holding every
//! section finished before the interrupt.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use folio_core::{DocumentSet, SectionSpec};
use folio_pipeline::ReportOrchestrator;
use folio_render::{render_html_file, JsonReportWriter};
use futures::StreamExt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const REPORT_STEM: &str = "portfolio_analysis_report";

/// Where one run's report files go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub html: PathBuf,
}

/// Timestamped report paths under `output_dir`
#[must_use]
pub fn report_paths(output_dir: &Path, at: NaiveDateTime) -> ReportPaths {
    let stem = format!("{REPORT_STEM}_{}", at.format("%Y%m%d_%H%M%S"));
    ReportPaths {
        json: output_dir.join(format!("{stem}.json")),
        html: output_dir.join(format!("{stem}.html")),
    }
}

/// Outcome of [`write_report`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub requested: usize,
    pub written: usize,
    pub cancelled: bool,
    pub html: Option<PathBuf>,
}

/// Run the orchestrator and persist each section as it completes
///
/// The JSON array is closed whether the run finished or was cancelled.
/// The HTML page is rendered from the finished JSON file when `html` is set.
///
/// # Errors
/// Fails when the output directory or a report file cannot be written.
pub async fn write_report(
    orchestrator: &ReportOrchestrator,
    documents: DocumentSet,
    sections: Vec<SectionSpec>,
    paths: &ReportPaths,
    html: bool,
) -> Result<ReportSummary> {
    if let Some(dir) = paths.json.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }
    let file = File::create(&paths.json)
        .with_context(|| format!("creating {}", paths.json.display()))?;

    let requested = sections.len();
    let mut writer = JsonReportWriter::new(BufWriter::new(file));
    writer.begin().context("writing JSON report")?;

    let stream = orchestrator.stream(documents, sections);
    futures::pin_mut!(stream);
    while let Some(section) = stream.next().await {
        writer
            .write_section(&section)
            .with_context(|| format!("writing section {}", section.section))?;
        tracing::info!(
            section = %section.section,
            loop_count = section.loop_count,
            faults = section.faults.len(),
            "section written"
        );
    }

    let written = writer.written();
    writer.finish().context("closing JSON report")?;
    let cancelled = written < requested && orchestrator.cancellation_token().is_cancelled();
    tracing::info!(path = %paths.json.display(), written, requested, cancelled, "JSON report saved");

    let html = if html {
        render_html_file(&paths.json, &paths.html)
            .with_context(|| format!("rendering {}", paths.html.display()))?;
        Some(paths.html.clone())
    } else {
        None
    };

    Ok(ReportSummary {
        requested,
        written,
        cancelled,
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn paths_share_a_timestamped_stem() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 5)
            .unwrap();
        let paths = report_paths(Path::new("outputs"), at);

        assert_eq!(
            paths.json,
            PathBuf::from("outputs/portfolio_analysis_report_20250301_123005.json")
        );
        assert_eq!(
            paths.html,
            PathBuf::from("outputs/portfolio_analysis_report_20250301_123005.html")
        );
    }
}
