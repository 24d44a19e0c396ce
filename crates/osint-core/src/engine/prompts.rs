//! Prompt builders for each lifecycle phase.

use serde::Serialize;
use serde_json::Value;

use crate::audit::AuditEntry;
use crate::gateway::{pretty, CompletionRequest};
use crate::intel::{ActionResult, Analysis, Plan, ProcessedData};
use crate::investigation::Investigation;
use crate::types::ReportFormat;

pub(crate) const PLANNER: &str = "You are an expert OSINT analyst creating an investigation plan.";
pub(crate) const DECIDER: &str = "You decide whether an OSINT investigation should continue.";
pub(crate) const ADAPTER: &str = "You are adapting an OSINT investigation strategy.";
pub(crate) const PROCESSOR: &str = "You are processing raw OSINT collection data.";
pub(crate) const ANALYST: &str = "You are an expert intelligence analyst.";
pub(crate) const REPORTER: &str = "You write professional intelligence reports.";
pub(crate) const EVALUATOR: &str = "You evaluate OSINT investigations for quality and effectiveness.";

fn json_of<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_value(value)
        .map(|v| pretty(&v))
        .unwrap_or_default()
}

fn header(inv: &Investigation) -> String {
    let mut out = format!("OBJECTIVE: {}\nINVESTIGATION ID: {}\n", inv.objective, inv.id);
    if let Some(c) = &inv.constraints {
        out.push_str(&format!("\nCONSTRAINTS:\n{}\n", json_of(c)));
    }
    out
}

pub(crate) fn planning(inv: &Investigation, tools: &Value) -> CompletionRequest {
    let prompt = format!(
        "{}\nAVAILABLE TOOLS:\n{}\n\n\
         Create an investigation plan following the intelligence lifecycle:\n\
         1. information_requirements: what specific information is needed\n\
         2. collection_strategy: which sources and tools to use, in what order\n\
         3. actions: 8-12 actions, each with tool, parameters, priority (1 = most urgent), \
         rationale and optional depends_on\n\
         4. success_criteria: how we know the intelligence is sufficient\n\
         5. risk_assessment: challenges and limitations\n\n\
         Only use tools from the list above.\n\
         Output as JSON with keys: information_requirements, collection_strategy, actions, \
         success_criteria, risk_assessment",
        header(inv),
        pretty(tools),
    );
    CompletionRequest::new(prompt).system(PLANNER)
}

pub(crate) fn decision(inv: &Investigation, recent: &[ActionResult]) -> CompletionRequest {
    let prompt = format!(
        "{}CURRENT ITERATION: {}/{}\n\nCURRENT FINDINGS:\n{}\n\n\
         Should we continue investigating? Consider whether the objective is answered, \
         whether recent findings add value, diminishing returns and unexplored leads.\n\n\
         Output JSON with: continue (true/false), confidence (0-1), reason, \
         recommendation (continue/conclude/pivot)",
        header(inv),
        inv.iteration,
        inv.max_iterations,
        json_of(recent),
    );
    CompletionRequest::new(prompt).system(DECIDER)
}

pub(crate) fn adaptation(
    inv: &Investigation,
    plan: &Plan,
    recent: &[ActionResult],
    tools: &Value,
) -> CompletionRequest {
    let state = serde_json::json!({
        "plan": plan,
        "results": recent,
        "iteration": inv.iteration,
    });
    let prompt = format!(
        "{}\nCURRENT STATE:\n{}\n\nAVAILABLE TOOLS:\n{}\n\n\
         Based on what has been learned, suggest 3-5 new actions: follow up leads, fill gaps, \
         resolve contradictions, cross-verify important findings.\n\n\
         Output a JSON array of actions with: tool, parameters, rationale",
        header(inv),
        pretty(&state),
        pretty(tools),
    );
    CompletionRequest::new(prompt).system(ADAPTER)
}

pub(crate) fn processing(inv: &Investigation, raw: &[ActionResult]) -> CompletionRequest {
    let prompt = format!(
        "{}\nRAW COLLECTION RESULTS:\n{}\n\n\
         Extract information relevant to the objective, normalize formats, deduplicate, \
         categorize into entities, events and relationships, cross-reference sources and \
         note data quality issues.\n\n\
         Output JSON with keys: entities (type, name, attributes, confidence), \
         events (description, when, entities, source), relationships (source, target, type, \
         confidence), data_quality_notes",
        header(inv),
        json_of(raw),
    );
    CompletionRequest::new(prompt).system(PROCESSOR)
}

pub(crate) fn analysis(
    inv: &Investigation,
    processed: &ProcessedData,
    history: &[AuditEntry],
    context: Option<&Value>,
) -> CompletionRequest {
    let mut prompt = format!(
        "{}\nPROCESSED DATA:\n{}\n\nINVESTIGATION HISTORY:\n{}\n",
        header(inv),
        json_of(processed),
        if history.is_empty() {
            "None".to_string()
        } else {
            json_of(history)
        },
    );
    if let Some(ctx) = context {
        prompt.push_str(&format!("\nADDITIONAL CONTEXT:\n{}\n", pretty(ctx)));
    }
    prompt.push_str(
        "\nProvide: key_findings ranked by significance (description, evidence, confidence \
         very_high/high/medium/low/very_low, significance high/medium/low), insights, \
         confidence_assessment (overall plus detail), gaps, risk_indicators, timeline, \
         recommendations.\n\nOutput as structured JSON.",
    );
    CompletionRequest::new(prompt).system(ANALYST)
}

pub(crate) fn report(
    inv: &Investigation,
    analysis: &Analysis,
    format: ReportFormat,
    classification: &str,
) -> CompletionRequest {
    let prompt = format!(
        "CLASSIFICATION: {classification}\n{}\nANALYSIS:\n{}\n\n\
         Write a report in {format} format with: header (classification, date, investigation \
         id), executive summary, objective, methodology, key findings, detailed analysis, \
         evidence, confidence assessment, gaps and limitations, recommendations, timeline.",
        header(inv),
        json_of(analysis),
    );
    CompletionRequest::new(prompt).system(REPORTER)
}

pub(crate) fn evaluation(inv: &Investigation, history: &[AuditEntry]) -> CompletionRequest {
    let prompt = format!(
        "{}\nCOMPLETE INVESTIGATION HISTORY:\n{}\n\n\
         Score: objective_achievement (%), coverage (%), source_quality (1-10), \
         efficiency (1-10), timeliness (1-10). List gaps, lessons_learned and \
         recommendations.\n\nOutput as JSON.",
        header(inv),
        json_of(history),
    );
    CompletionRequest::new(prompt).system(EVALUATOR)
}
