//! Templated report used when the gateway cannot write one.

use chrono::Utc;

use crate::intel::Analysis;
use crate::investigation::Investigation;
use crate::types::ReportFormat;

pub(crate) fn analysis_json(analysis: &Analysis) -> String {
    serde_json::to_string_pretty(analysis).unwrap_or_else(|_| "{}".to_string())
}

pub(crate) fn fallback(
    inv: &Investigation,
    analysis: &Analysis,
    format: ReportFormat,
    classification: &str,
) -> String {
    let date = Utc::now().format("%Y-%m-%d %H:%M:%S");
    let raw = analysis_json(analysis);
    match format {
        ReportFormat::Json => raw,
        ReportFormat::Html => format!(
            "<html><head><title>OSINT Investigation Report</title></head><body>\n\
             <p><strong>{classification}</strong></p>\n\
             <h1>OSINT Investigation Report</h1>\n\
             <p><strong>Investigation ID</strong>: {id}<br/>\
             <strong>Objective</strong>: {objective}<br/>\
             <strong>Date</strong>: {date}</p>\n\
             <h2>Summary</h2>\n\
             <p>Investigation completed with limited analysis due to processing constraints.</p>\n\
             <h2>Raw Analysis Data</h2>\n<pre>{raw}</pre>\n\
             <h2>Note</h2>\n\
             <p>Full report generation encountered an error. Please review the raw analysis data above.</p>\n\
             </body></html>\n",
            id = inv.id,
            objective = html_escape(&inv.objective),
            raw = html_escape(&raw),
        ),
        ReportFormat::Markdown | ReportFormat::Text => format!(
            "**{classification}**\n\n\
             # OSINT Investigation Report\n\n\
             **Investigation ID**: {id}\n\
             **Objective**: {objective}\n\
             **Date**: {date}\n\n\
             ## Summary\n\n\
             Investigation completed with limited analysis due to processing constraints.\n\n\
             ## Raw Analysis Data\n\n\
             ```json\n{raw}\n```\n\n\
             ## Note\n\n\
             Full report generation encountered an error. Please review the raw analysis data above.\n",
            id = inv.id,
            objective = inv.objective,
        ),
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
