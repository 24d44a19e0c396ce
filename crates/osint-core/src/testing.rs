//! Scripted collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::bundle::InvestigationResult;
use crate::engine::Investigator;
use crate::error::{OsintError, Result};
use crate::gateway::{CompletionRequest, ReasoningGateway};
use crate::intel::{Entity, KeyFinding};
use crate::tool::Tool;
use crate::types::ConfidenceLevel;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail,
}

/// Gateway answering by substring match on the prompt or system prompt.
/// Replies queued with `sequence` are consumed in order; other rules repeat.
pub(crate) struct ScriptedGateway {
    rules: Mutex<Vec<(String, VecDeque<Reply>, bool)>>,
    default: Reply,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGateway {
    fn with_default(default: Reply) -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            default,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(text: &str) -> Self {
        Self::with_default(Reply::Text(text.to_string()))
    }

    pub fn failing() -> Self {
        Self::with_default(Reply::Fail)
    }

    pub fn on(self, needle: &str, reply: Value) -> Self {
        self.push_rule(needle, Reply::Text(reply.to_string()), true)
    }

    /// Queue replies for `needle`; once drained the rule stops matching.
    pub fn sequence(self, needle: &str, replies: Vec<Value>) -> Self {
        {
            let mut rules = self.rules.lock().unwrap();
            rules.push((
                needle.to_string(),
                replies.into_iter().map(|v| Reply::Text(v.to_string())).collect(),
                false,
            ));
        }
        self
    }

    fn push_rule(self, needle: &str, reply: Reply, sticky: bool) -> Self {
        {
            let mut rules = self.rules.lock().unwrap();
            rules.push((needle.to_string(), VecDeque::from([reply]), sticky));
        }
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| matches(r, needle))
            .count()
    }
}

fn matches(request: &CompletionRequest, needle: &str) -> bool {
    request.prompt.contains(needle)
        || request
            .system_prompt
            .as_deref()
            .is_some_and(|s| s.contains(needle))
}

#[async_trait]
impl ReasoningGateway for ScriptedGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let reply = {
            let mut rules = self.rules.lock().unwrap();
            let mut found = None;
            for (needle, replies, sticky) in rules.iter_mut() {
                if !matches(&request, needle) || replies.is_empty() {
                    continue;
                }
                found = if *sticky {
                    replies.front().cloned()
                } else {
                    replies.pop_front()
                };
                break;
            }
            found.unwrap_or_else(|| self.default.clone())
        };
        self.requests.lock().unwrap().push(request);
        match reply {
            Reply::Text(t) => Ok(t),
            Reply::Fail => Err(OsintError::Gateway("scripted failure".into())),
        }
    }
}

/// Tool that echoes its parameters back.
pub(crate) struct EchoTool {
    name: String,
}

impl EchoTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "echoes parameters"
    }

    async fn invoke(&self, params: &Map<String, Value>) -> std::result::Result<Value, String> {
        Ok(json!({"echo": params}))
    }
}

/// Tool whose every call fails.
pub(crate) struct BrokenTool(pub &'static str);

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        self.0
    }

    fn description(&self) -> &str {
        "always fails"
    }

    async fn invoke(&self, _params: &Map<String, Value>) -> std::result::Result<Value, String> {
        Err("connection refused".into())
    }
}

/// Result carrying the given entity names and `findings` medium-confidence
/// findings.
pub(crate) fn sample_result(id: &str, entities: &[&str], findings: usize) -> InvestigationResult {
    let mut result = InvestigationResult {
        investigation_id: id.to_string(),
        ..Default::default()
    };
    result.processed_data.entities = entities
        .iter()
        .map(|name| Entity {
            kind: "domain".into(),
            name: name.to_string(),
            attributes: Map::new(),
            confidence: None,
        })
        .collect();
    result.analysis.key_findings = (0..findings)
        .map(|i| KeyFinding::new(format!("finding {i}"), ConfidenceLevel::Medium))
        .collect();
    result
}

/// Investigator replaying queued outcomes. Once the queue drains it keeps
/// answering with an empty result. Objectives containing a `fail_on` needle
/// always fail.
pub(crate) struct ScriptedInvestigator {
    script: Mutex<VecDeque<std::result::Result<InvestigationResult, String>>>,
    fail_on: Vec<String>,
    delays: Vec<(String, Duration)>,
    objectives: Mutex<Vec<String>>,
}

impl ScriptedInvestigator {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fail_on: Vec::new(),
            delays: Vec::new(),
            objectives: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, result: InvestigationResult) -> Self {
        self.script.lock().unwrap().push_back(Ok(result));
        self
    }

    pub fn then_fail(self, message: &str) -> Self {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    /// Sleep before answering objectives containing `needle`.
    pub fn delay_on(mut self, needle: &str, delay: Duration) -> Self {
        self.delays.push((needle.to_string(), delay));
        self
    }

    pub fn objectives(&self) -> Vec<String> {
        self.objectives.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.objectives.lock().unwrap().len()
    }
}

#[async_trait]
impl Investigator for ScriptedInvestigator {
    async fn investigate(
        &self,
        objective: &str,
        _constraints: Option<Map<String, Value>>,
        _auto_report: bool,
    ) -> Result<InvestigationResult> {
        self.objectives.lock().unwrap().push(objective.to_string());
        let delay = self
            .delays
            .iter()
            .find(|(needle, _)| objective.contains(needle.as_str()))
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on.iter().any(|n| objective.contains(n.as_str())) {
            return Err(OsintError::Gateway(format!("no answer for {objective}")));
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(OsintError::Gateway(message)),
            None => {
                let mut result = sample_result("inv_default", &[], 0);
                result.objective = objective.to_string();
                Ok(result)
            }
        }
    }
}
