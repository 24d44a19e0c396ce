//! Collection tools and the registry the engine dispatches through.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::{OsintError, Result};

/// A named, documented collection action.
///
/// `invoke` returns `Err(message)` when the call fails; the engine records
/// that as a failed `ActionResult` instead of aborting.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// JSON-schema-like description of the accepted parameters.
    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn invoke(&self, params: &Map<String, Value>) -> std::result::Result<Value, String>;
}

/// Ordered set of tools. Registration order matters: the first tool is the
/// planning fallback.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tool`, replacing any existing tool with the same name in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(i) => self.tools[i] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .cloned()
            .ok_or_else(|| OsintError::ToolNotFound(name.to_string()))
    }

    pub fn first(&self) -> Option<&str> {
        self.tools.first().map(|t| t.name())
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Tool catalogue for planning prompts.
    pub fn describe(&self) -> Value {
        Value::Array(
            self.tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.parameters(),
                    })
                })
                .collect(),
        )
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EchoTool;

    #[test]
    fn first_registered_tool_is_first() {
        let reg = ToolRegistry::new()
            .with(Arc::new(EchoTool::new("web_search")))
            .with(Arc::new(EchoTool::new("dns_lookup")));
        assert_eq!(reg.first(), Some("web_search"));
        assert_eq!(reg.names(), vec!["web_search", "dns_lookup"]);
    }

    #[test]
    fn re_registering_keeps_position() {
        let reg = ToolRegistry::new()
            .with(Arc::new(EchoTool::new("a")))
            .with(Arc::new(EchoTool::new("b")))
            .with(Arc::new(EchoTool::new("a")));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.first(), Some("a"));
    }

    #[test]
    fn unknown_tool_is_typed_not_found() {
        let reg = ToolRegistry::new();
        assert!(matches!(reg.lookup("whois"), Err(OsintError::ToolNotFound(n)) if n == "whois"));
        assert_eq!(reg.describe(), json!([]));
    }
}
