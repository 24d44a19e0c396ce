//! Contract for the language-model reasoning service.
//!
//! Implementations only provide [`ReasoningGateway::complete`]; the structured
//! helpers are layered on top of it. JSON parse failures of model output are
//! reported as [`OsintError::MalformedResponse`] so every caller can fall back
//! instead of aborting.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{OsintError, Result};
use crate::lenient;
use crate::types::Phase;

// ---------------------------------------------------------------------------
// CompletionRequest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    /// Overrides the gateway's configured temperature.
    pub temperature: Option<f32>,
    /// Overrides the gateway's configured token limit.
    pub max_tokens: Option<u32>,
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

// ---------------------------------------------------------------------------
// ChoiceDecision
// ---------------------------------------------------------------------------

/// Answer to [`ReasoningGateway::make_decision`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceDecision {
    #[serde(default)]
    pub chosen_option: usize,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rationale: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_considerations: Option<Value>,
}

impl ChoiceDecision {
    pub fn fallback() -> Self {
        Self {
            chosen_option: 0,
            rationale: "Default choice due to parsing error".into(),
            confidence: 0.5,
            alternative_considerations: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ReasoningGateway
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReasoningGateway: Send + Sync {
    /// Turn a prompt into text. In JSON mode the text is expected, but not
    /// guaranteed, to be a JSON document.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    /// Pick one of `options` for `objective` given `state`.
    async fn make_decision(
        &self,
        objective: &str,
        state: &Value,
        options: &[Value],
    ) -> Result<ChoiceDecision> {
        let prompt = format!(
            "You are making a strategic decision for an OSINT investigation.\n\n\
             OBJECTIVE: {objective}\n\nCURRENT STATE:\n{}\n\nAVAILABLE OPTIONS:\n{}\n\n\
             Output as JSON with: chosen_option (index), rationale, confidence (0-1), \
             alternative_considerations.",
            pretty(state),
            pretty(&Value::Array(options.to_vec())),
        );
        let request = CompletionRequest::new(prompt)
            .system("You are an expert strategic decision-maker for intelligence operations.")
            .json();
        let text = self.complete(request).await?;
        Ok(serde_json::from_str(extract_json(&text)).unwrap_or_else(|_| ChoiceDecision::fallback()))
    }

    /// Free-form structured analysis of `data`. Unparseable output is returned
    /// as `{raw_response, error}` rather than failing.
    async fn analyze_with_context(
        &self,
        data: &Value,
        analysis_type: &str,
        context: Option<&Value>,
    ) -> Result<Value> {
        let mut prompt = format!("Analyze the following data:\n\nDATA:\n{}\n", pretty(data));
        if let Some(ctx) = context {
            prompt.push_str(&format!("\nCONTEXT:\n{}\n", pretty(ctx)));
        }
        prompt.push_str(&format!(
            "\nProvide detailed analysis following best practices for {analysis_type}.\n\
             Output your response as valid JSON.\n"
        ));
        let request = CompletionRequest::new(prompt)
            .system(analysis_system_prompt(analysis_type))
            .json();
        let text = self.complete(request).await?;
        Ok(serde_json::from_str(extract_json(&text))
            .unwrap_or_else(|_| json!({"raw_response": text, "error": "JSON parsing failed"})))
    }
}

fn analysis_system_prompt(analysis_type: &str) -> &'static str {
    match analysis_type {
        "planning" => "You are an expert OSINT investigation planner. Create comprehensive, strategic investigation plans.",
        "processing" => "You are a data processing specialist. Clean, normalize, and structure raw intelligence data.",
        "analysis" => "You are a senior intelligence analyst. Synthesize information into actionable intelligence.",
        "decision" => "You are a strategic decision-maker. Evaluate situations and recommend optimal actions.",
        "synthesis" => "You are an intelligence synthesizer. Connect disparate information into coherent narratives.",
        _ => "You are an AI assistant analyzing OSINT data.",
    }
}

pub(crate) fn pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

/// Slice the JSON document out of model text: strips Markdown code fences and
/// surrounding prose. The longest `{`/`[` span that parses as JSON wins, so
/// bracketed asides like `[1]` before the payload are skipped.
pub fn extract_json(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(start) = body.find("```") {
        let after = &body[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        let after = after.strip_prefix("JSON").unwrap_or(after);
        body = match after.find("```") {
            Some(end) => after[..end].trim(),
            None => after.trim(),
        };
    }

    let mut best: Option<(usize, usize)> = None;
    let mut scanned_to = 0;
    for (open, _) in body.match_indices(['{', '[']) {
        if open < scanned_to {
            continue;
        }
        let mut stream = serde_json::Deserializer::from_str(&body[open..]).into_iter::<Value>();
        if let Some(Ok(_)) = stream.next() {
            let end = open + stream.byte_offset();
            scanned_to = end;
            if best.map_or(true, |(s, e)| end - open > e - s) {
                best = Some((open, end));
            }
        }
    }
    if let Some((open, end)) = best {
        return &body[open..end];
    }

    // Nothing parses; hand back the widest span so the caller's parse error
    // points at the broken document.
    let Some(open) = body.find(['{', '[']) else {
        return body;
    };
    let close_char = if body[open..].starts_with('{') { '}' } else { ']' };
    match body.rfind(close_char) {
        Some(close) if close > open => &body[open..=close],
        _ => &body[open..],
    }
}

/// Request JSON and deserialize it into `T`, tagging parse failures with `phase`.
pub async fn complete_json<T: DeserializeOwned>(
    gateway: &dyn ReasoningGateway,
    request: CompletionRequest,
    phase: Phase,
) -> Result<T> {
    let text = gateway.complete(request.json()).await?;
    tracing::debug!(%phase, bytes = text.len(), "reasoning response");
    serde_json::from_str(extract_json(&text)).map_err(|e| OsintError::malformed(phase, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGateway;

    #[test]
    fn extract_json_strips_fences_and_prose() {
        let text = "Here is the plan:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(extract_json(text), "{\"a\": 1}");
        assert_eq!(extract_json("Sure! [1, 2] done"), "[1, 2]");
        assert_eq!(extract_json("  {\"x\": {\"y\": 2}}  "), "{\"x\": {\"y\": 2}}");
        assert_eq!(extract_json("no json here"), "no json here");
        assert_eq!(
            extract_json(r#"Based on the results [1], here is the analysis: {"key_findings": ["x"]}"#),
            r#"{"key_findings": ["x"]}"#
        );
        assert_eq!(
            extract_json(r#"See [citation needed]. {"a": [1, {"b": 2}]} (end)"#),
            r#"{"a": [1, {"b": 2}]}"#
        );
        assert_eq!(extract_json(r#"truncated {"a": [1, 2"#), r#"{"a": [1, 2"#);
    }

    #[tokio::test]
    async fn complete_json_reports_malformed_with_phase() {
        let gw = ScriptedGateway::always("definitely not json");
        let err = complete_json::<Value>(&gw, CompletionRequest::new("p"), Phase::Analysis)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OsintError::MalformedResponse {
                phase: Phase::Analysis,
                ..
            }
        ));
        assert!(gw.requests()[0].json_mode);
    }

    #[tokio::test]
    async fn make_decision_falls_back_on_bad_json() {
        let gw = ScriptedGateway::always("I pick the second one");
        let d = gw.make_decision("obj", &json!({}), &[json!("a"), json!("b")]).await.unwrap();
        assert_eq!(d, ChoiceDecision::fallback());

        let gw = ScriptedGateway::always(r#"{"chosen_option": 1, "rationale": "b is better", "confidence": 0.9}"#);
        let d = gw.make_decision("obj", &json!({}), &[json!("a"), json!("b")]).await.unwrap();
        assert_eq!(d.chosen_option, 1);
    }

    #[tokio::test]
    async fn analyze_with_context_keeps_raw_text_on_bad_json() {
        let gw = ScriptedGateway::always("prose only");
        let v = gw
            .analyze_with_context(&json!({"k": 1}), "synthesis", Some(&json!({"c": true})))
            .await
            .unwrap();
        assert_eq!(v["raw_response"], "prose only");
        assert_eq!(v["error"], "JSON parsing failed");
        let req = &gw.requests()[0];
        assert!(req.prompt.contains("CONTEXT"));
        assert!(req.system_prompt.as_deref().unwrap_or("").contains("synthesizer"));
    }

    #[tokio::test]
    async fn gateway_errors_propagate() {
        let gw = ScriptedGateway::failing();
        assert!(gw.make_decision("o", &json!({}), &[]).await.is_err());
    }
}
