use folio_cli::{report_paths, write_report};
use folio_core::{ReportConfig, SectionSpec};
use folio_pipeline::ReportOrchestrator;
use folio_render::read_report;
use folio_test_utils::{sample_documents, ScriptedGateway};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn at() -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn orchestrator() -> ReportOrchestrator {
    let gateway = Arc::new(ScriptedGateway::happy_path());
    ReportOrchestrator::from_config(gateway, &ReportConfig::new().with_max_review_loops(1))
}

fn sections() -> Vec<SectionSpec> {
    vec![
        SectionSpec::new("Overview", "").with_table(true),
        SectionSpec::new("Risks", ""),
    ]
}

#[tokio::test]
async fn writes_json_and_html() {
    let dir = tempfile::tempdir().unwrap();
    let paths = report_paths(&dir.path().join("outputs"), at());

    let summary = write_report(&orchestrator(), sample_documents(), sections(), &paths, true)
        .await
        .unwrap();

    assert_eq!(summary.written, 2);
    assert!(!summary.cancelled);
    assert_eq!(summary.html, Some(paths.html.clone()));

    let report = read_report(&paths.json).unwrap();
    let titles: Vec<&str> = report.iter().map(|s| s.section.as_str()).collect();
    assert_eq!(titles, vec!["Overview", "Risks"]);
    assert_eq!(report[0].content, folio_test_utils::SAMPLE_TEXT);

    let html = std::fs::read_to_string(&paths.html).unwrap();
    assert!(html.contains("<h2>Overview</h2>"));
    assert!(html.contains("<h2>Risks</h2>"));
}

#[tokio::test]
async fn html_can_be_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let paths = report_paths(dir.path(), at());

    let summary = write_report(&orchestrator(), sample_documents(), sections(), &paths, false)
        .await
        .unwrap();

    assert_eq!(summary.html, None);
    assert!(paths.json.exists());
    assert!(!paths.html.exists());
}

#[tokio::test]
async fn cancelled_run_leaves_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let paths = report_paths(dir.path(), at());
    let orchestrator = orchestrator();
    orchestrator.cancellation_token().cancel();

    let summary = write_report(&orchestrator, sample_documents(), sections(), &paths, true)
        .await
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.written, 0);
    assert!(read_report(&paths.json).unwrap().is_empty());
}
