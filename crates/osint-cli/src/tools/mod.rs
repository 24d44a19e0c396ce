//! Built-in collection tools. Each is an [`osint_core::tool::Tool`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use osint_core::tool::ToolRegistry;

pub mod dns_lookup;
pub mod http_probe;
pub mod web_search;

pub use dns_lookup::DnsLookupTool;
pub use http_probe::HttpProbeTool;
pub use web_search::WebSearchTool;

pub const USER_AGENT: &str = concat!("osint-agent/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for the network tools.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Every built-in tool, `web_search` first so it is the planning fallback.
pub fn default_registry(http: reqwest::Client) -> ToolRegistry {
    ToolRegistry::new()
        .with(Arc::new(WebSearchTool::new(http.clone())))
        .with(Arc::new(DnsLookupTool))
        .with(Arc::new(HttpProbeTool::new(http)))
}

pub(crate) fn required_str<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing required argument: {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn web_search_is_registered_first() {
        let registry = default_registry(reqwest::Client::new());
        assert_eq!(registry.first(), Some("web_search"));
        assert_eq!(registry.names(), vec!["web_search", "dns_lookup", "http_probe"]);
    }

    #[test]
    fn required_str_rejects_blank() {
        let params = json!({"query": "  ", "n": 3});
        let params = params.as_object().unwrap();
        assert!(required_str(params, "query").is_err());
        assert!(required_str(params, "n").is_err());
        assert!(required_str(params, "missing").is_err());
    }
}
