//! HTML report renderer
//!
//! Renders finalized sections into a single self-contained page. The
//! `include_table` / `include_graph` flags are honored here: a section's
//! table and charts are shown only when the caller asked for them.
//!
//! Everything that came from a model is untrusted. Text is escaped with
//! `html-escape`, raw HTML inside Markdown is shown as text, and chart
//! payloads are embedded as JSON that cannot close the script element.

use crate::error::Result;
use crate::json::read_report;
use chrono::{DateTime, Datelike, Utc};
use folio_core::{FinalizedSection, GraphKind, GraphSpec, TabularData};
use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::path::Path;

const TEMPLATE: &str = include_str!("templates/report.html");

/// Default page title
pub const DEFAULT_TITLE: &str = "Portfolio Analysis Report";

pub struct HtmlReport {
    title: String,
    generated_at: DateTime<Utc>,
}

impl Default for HtmlReport {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlReport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            generated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Render the whole page
    #[must_use]
    pub fn render(&self, sections: &[FinalizedSection]) -> String {
        let mut body = String::new();
        for (idx, section) in sections.iter().enumerate() {
            render_section(&mut body, idx, section);
        }

        TEMPLATE
            .replace("{{{TITLE}}}", &encode_text(&self.title))
            .replace(
                "{{{GENERATED_AT}}}",
                &self.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            )
            .replace("{{{YEAR}}}", &self.generated_at.year().to_string())
            .replace("{{{SECTIONS}}}", &body)
    }
}

/// Render the HTML sibling of a JSON report
///
/// Returns the number of sections rendered.
///
/// # Errors
/// Fails when the JSON cannot be read or parsed, or the HTML cannot be written.
pub fn render_html_file(json_path: &Path, html_path: &Path) -> Result<usize> {
    let sections = read_report(json_path)?;
    std::fs::write(html_path, HtmlReport::new().render(&sections))?;
    tracing::info!(path = %html_path.display(), sections = sections.len(), "HTML report written");
    Ok(sections.len())
}

fn render_section(out: &mut String, idx: usize, section: &FinalizedSection) {
    let _ = writeln!(out, "        <section>\n            <h2>{}</h2>", encode_text(&section.section));
    let _ = writeln!(out, "            <div class=\"content\">{}</div>", markdown_to_html(&section.content));

    if section.include_table {
        if let Some(table) = section.tabular_data.as_ref().filter(|t| !t.rows.is_empty()) {
            render_table(out, table);
        }
    }

    if section.include_graph {
        for (graph_idx, spec) in section.graph_specs.iter().enumerate() {
            render_graph(out, idx, graph_idx, spec);
        }
    }

    if !section.references.is_empty() {
        out.push_str("            <div class=\"references\">\n                <h4>References</h4>\n                <ul>\n");
        for reference in &section.references {
            let _ = writeln!(
                out,
                "                    <li>{}: {}</li>",
                encode_text(&reference.document),
                encode_text(&reference.location)
            );
        }
        out.push_str("                </ul>\n            </div>\n");
    }

    if !section.faults.is_empty() {
        let stages: Vec<&str> = section.faults.iter().map(|f| f.stage.as_str()).collect();
        let _ = writeln!(
            out,
            "            <p class=\"degraded\">Some stages degraded for this section: {}</p>",
            encode_text(&stages.join(", "))
        );
    }

    out.push_str("        </section>\n");
}

fn render_table(out: &mut String, table: &TabularData) {
    let columns = table.columns();
    if !table.title.is_empty() {
        let _ = writeln!(out, "            <h3>{}</h3>", encode_text(&table.title));
    }
    out.push_str("            <table>\n                <thead><tr>");
    for column in &columns {
        let _ = write!(out, "<th>{}</th>", encode_text(column));
    }
    out.push_str("</tr></thead>\n                <tbody>\n");
    for row in &table.rows {
        out.push_str("                    <tr>");
        for column in &columns {
            let cell = row.get(*column).map(cell_text).unwrap_or_default();
            let _ = write!(out, "<td>{}</td>", encode_text(&cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("                </tbody>\n            </table>\n");
}

fn render_graph(out: &mut String, section_idx: usize, graph_idx: usize, spec: &GraphSpec) {
    match spec.kind {
        GraphKind::None => {}
        GraphKind::TextualDescription => {
            if !spec.title.is_empty() {
                let _ = writeln!(out, "            <h3>{}</h3>", encode_text(&spec.title));
            }
            let text = spec.data.as_str().map_or_else(|| spec.data.to_string(), str::to_string);
            let _ = writeln!(out, "            <p>{}</p>", encode_text(&text));
        }
        GraphKind::Bar | GraphKind::Line | GraphKind::Pie => {
            let id = format!("chart-{}-{}", section_idx + 1, graph_idx + 1);
            let config = chart_config(spec);
            let _ = writeln!(
                out,
                "            <h3>{title}</h3>\n            <div class=\"chart-container\"><canvas id=\"{id}\"></canvas></div>\n            \
                 <script>new Chart(document.getElementById(\"{id}\").getContext(\"2d\"), {config});</script>",
                title = encode_text(&spec.title),
                id = encode_double_quoted_attribute(&id),
            );
        }
    }
}

/// Chart.js config for a chart spec, safe to inline in a script element
fn chart_config(spec: &GraphSpec) -> String {
    let kind = match spec.kind {
        GraphKind::Line => "line",
        GraphKind::Pie => "pie",
        _ => "bar",
    };
    let config = json!({
        "type": kind,
        "data": spec.data,
        "options": {
            "responsive": true,
            "plugins": {"title": {"display": true, "text": spec.title}},
        },
    });
    config.to_string().replace("</", "<\\/")
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Markdown to HTML with raw HTML shown as text and script URLs disarmed
fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// `#` for URLs whose scheme can run script
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme: String = url
        .trim_start()
        .chars()
        .take_while(|c| *c != ':')
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let has_scheme = url.contains(':');
    if has_scheme && matches!(scheme.as_str(), "javascript" | "vbscript" | "data") {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use folio_core::{Reference, Stage, StageFault};

    fn highlights() -> TabularData {
        serde_json::from_value(json!({
            "title": "Highlights",
            "rows": [{"Metric": "Revenue", "Value": 100}],
        }))
        .unwrap()
    }

    fn section() -> FinalizedSection {
        FinalizedSection {
            section: "Financial Review".into(),
            instruction: String::new(),
            content: "**Revenue** was $100M.".into(),
            references: vec![Reference::new("a.txt", "page 1")],
            tabular_data: Some(highlights()),
            graph_specs: vec![GraphSpec {
                title: "Revenue".into(),
                kind: GraphKind::Bar,
                data: json!({"labels": ["2024"], "datasets": [{"label": "Revenue", "data": [100]}]}),
            }],
            include_table: true,
            include_graph: true,
            loop_count: 0,
            faults: vec![],
        }
    }

    fn report() -> HtmlReport {
        HtmlReport::new().with_generated_at(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn renders_content_table_chart_and_references() {
        let html = report().render(&[section()]);

        assert!(html.contains("<h2>Financial Review</h2>"));
        assert!(html.contains("<strong>Revenue</strong> was $100M."));
        assert!(html.contains("<th>Metric</th><th>Value</th>"));
        assert!(html.contains("<td>Revenue</td><td>100</td>"));
        assert!(html.contains("<canvas id=\"chart-1-1\">"));
        assert!(html.contains("\"type\":\"bar\""));
        assert!(html.contains("<li>a.txt: page 1</li>"));
        assert!(html.contains("Date: 2025-03-01 12:00:00 UTC"));
        assert!(!html.contains("{{{"));
    }

    #[test]
    fn flags_hide_table_and_chart() {
        let mut section = section();
        section.include_table = false;
        section.include_graph = false;
        let html = report().render(&[section]);

        assert!(!html.contains("<table>"));
        assert!(!html.contains("<canvas"));
    }

    #[test]
    fn empty_table_and_none_graph_render_nothing() {
        let mut section = section();
        section.tabular_data = Some(TabularData::empty());
        section.graph_specs = vec![GraphSpec::none()];
        let html = report().render(&[section]);

        assert!(!html.contains("<table>"));
        assert!(!html.contains("<canvas"));
    }

    #[test]
    fn textual_description_is_a_paragraph() {
        let mut section = section();
        section.graph_specs = vec![GraphSpec::textual("Trend", "Growth was steady.")];
        let html = report().render(&[section]);

        assert!(html.contains("<h3>Trend</h3>"));
        assert!(html.contains("<p>Growth was steady.</p>"));
    }

    #[test]
    fn model_text_is_escaped() {
        let mut section = section();
        section.section = "R&D <Risks>".into();
        section.content = "Hello <script>alert(1)</script>".into();
        section.graph_specs[0].title = "</script><script>alert(2)</script>".into();
        let html = report().render(&[section]);

        assert!(html.contains("<h2>R&amp;D &lt;Risks&gt;</h2>"));
        assert!(!html.contains("<script>alert(1)"));
        assert!(!html.contains("</script><script>alert(2)"));
    }

    #[test]
    fn script_links_and_images_are_disarmed() {
        let html = markdown_to_html(
            "[click](javascript:alert(1)) [up](JavaScript:void(0)) ![img](data:text/html;base64,PHNjcmlwdD4=) [ok](https://example.com/report)",
        );

        assert!(!html.to_ascii_lowercase().contains("javascript:"));
        assert!(!html.contains("data:text/html"));
        assert!(html.contains("<a href=\"#\">click</a>"));
        assert!(html.contains("src=\"#\""));
        assert!(html.contains("<a href=\"https://example.com/report\">ok</a>"));
    }

    #[test]
    fn relative_links_survive() {
        let html = markdown_to_html("[notes](notes/a.txt#page-1)");
        assert!(html.contains("<a href=\"notes/a.txt#page-1\">notes</a>"));
    }

    #[test]
    fn degraded_stages_are_noted() {
        let mut section = section();
        section.faults = vec![StageFault {
            stage: Stage::Table,
            message: "table generation failed".into(),
        }];
        let html = report().render(&[section]);
        assert!(html.contains("Some stages degraded for this section: table"));
    }
}
