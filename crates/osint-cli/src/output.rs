use serde::Serialize;

use osint_core::bundle::InvestigationResult;
use osint_core::workflow::Alert;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

/// Short human summary of one investigation bundle.
pub fn print_result_summary(result: &InvestigationResult) {
    println!("Investigation: {}", result.investigation_id);
    println!("Objective:     {}", result.objective);
    println!(
        "Confidence:    {}{}",
        result.analysis.confidence_assessment.overall,
        if result.is_degraded() { " (degraded)" } else { "" }
    );
    println!(
        "Iterations:    {}  ({:.1}s)",
        result.metadata.iterations, result.metadata.duration_seconds
    );
    println!(
        "Entities:      {}   Findings: {} ({} confident)",
        result.entity_count(),
        result.finding_count(),
        result.metadata.confident_findings
    );

    if !result.analysis.key_findings.is_empty() {
        println!();
        let rows = result
            .analysis
            .key_findings
            .iter()
            .map(|f| vec![f.confidence.to_string(), f.description.clone()])
            .collect();
        print_table(&["CONFIDENCE", "FINDING"], rows);
    }
}

pub fn print_alerts(alerts: &[Alert]) {
    if alerts.is_empty() {
        println!("No alerts triggered.");
        return;
    }
    let rows = alerts
        .iter()
        .map(|a| {
            vec![
                a.severity.to_string(),
                a.condition.kind.as_str().to_string(),
                a.workflow_name.clone(),
                a.id.clone(),
            ]
        })
        .collect();
    print_table(&["SEVERITY", "CONDITION", "WORKFLOW", "ID"], rows);
}
