use std::collections::BTreeSet;
use std::net::IpAddr;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use osint_core::tool::Tool;

use super::required_str;

/// A/AAAA resolution through the system resolver.
pub struct DnsLookupTool;

#[async_trait]
impl Tool for DnsLookupTool {
    fn name(&self) -> &str {
        "dns_lookup"
    }

    fn description(&self) -> &str {
        "Resolve a domain's A and AAAA records"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "domain": {"type": "string", "description": "Domain name to resolve"}
            },
            "required": ["domain"]
        })
    }

    async fn invoke(&self, params: &Map<String, Value>) -> Result<Value, String> {
        let domain = required_str(params, "domain")?;
        let domain = domain.trim_end_matches('.');
        let addrs = tokio::net::lookup_host((domain, 0))
            .await
            .map_err(|e| format!("failed to resolve {domain}: {e}"))?;

        let mut v4 = BTreeSet::new();
        let mut v6 = BTreeSet::new();
        for addr in addrs {
            match addr.ip() {
                IpAddr::V4(ip) => v4.insert(ip.to_string()),
                IpAddr::V6(ip) => v6.insert(ip.to_string()),
            };
        }

        Ok(json!({
            "domain": domain,
            "a": v4,
            "aaaa": v6,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_localhost() {
        let params = json!({"domain": "localhost"});
        let out = DnsLookupTool.invoke(params.as_object().unwrap()).await.unwrap();
        assert_eq!(out["domain"], "localhost");
        let total = out["a"].as_array().unwrap().len() + out["aaaa"].as_array().unwrap().len();
        assert!(total > 0);
    }

    #[tokio::test]
    async fn missing_domain_is_an_error() {
        let err = DnsLookupTool.invoke(&Map::new()).await.unwrap_err();
        assert_eq!(err, "missing required argument: domain");
    }
}
