//! Renderers for collected report fragments.
//!
//! The HTML rendition keeps the markup of the report panel this tool
//! replaces: a heading and a preformatted JSON block per report, a red
//! paragraph per failure.

use obmiar_core::{Fragment, ReportKind, ReportView};

use crate::types::ExportFormat;

/// The localized per-option error text, keyed by the form identifier.
pub fn failure_line(report: ReportKind) -> String {
    format!("Błąd przy {}", report.form_id())
}

/// Render one fragment as plain text: the localized heading followed by the
/// 2-space pretty-printed JSON body, or the localized error line.
pub fn render_fragment_text(fragment: &Fragment) -> String {
    match fragment {
        Fragment::Report { report, body } => {
            format!("{}\n{}", report.label(), pretty(body))
        }
        Fragment::Failure { report, .. } => failure_line(*report),
    }
}

/// Render one fragment as an HTML snippet.
pub fn render_fragment_html(fragment: &Fragment) -> String {
    match fragment {
        Fragment::Report { report, body } => format!(
            "<h3>{}</h3><pre>{}</pre>",
            escape_html(report.label()),
            escape_html(&pretty(body))
        ),
        Fragment::Failure { report, .. } => format!(
            "<p style=\"color:red\">{}</p>",
            escape_html(&failure_line(*report))
        ),
    }
}

/// Export a whole view in the requested format.
pub fn export_view(view: &ReportView, format: ExportFormat) -> String {
    match format {
        ExportFormat::Text => view
            .fragments()
            .iter()
            .map(render_fragment_text)
            .collect::<Vec<_>>()
            .join("\n\n"),
        ExportFormat::Html => view
            .fragments()
            .iter()
            .map(render_fragment_html)
            .collect::<Vec<_>>()
            .join("\n"),
        ExportFormat::Json => {
            serde_json::to_string_pretty(view.fragments()).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

fn pretty(body: &serde_json::Value) -> String {
    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
}

/// Minimal escaping for HTML text nodes.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
