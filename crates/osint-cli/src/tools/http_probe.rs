use async_trait::async_trait;
use serde_json::{json, Map, Value};

use osint_core::tool::Tool;

use super::required_str;

pub const SECURITY_HEADERS: &[&str] = &[
    "strict-transport-security",
    "content-security-policy",
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
];

/// Fetch a URL and report status, redirects and security posture headers.
pub struct HttpProbeTool {
    http: reqwest::Client,
}

impl HttpProbeTool {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Tool for HttpProbeTool {
    fn name(&self) -> &str {
        "http_probe"
    }

    fn description(&self) -> &str {
        "Fetch a URL and report status, final URL, server banner and security headers"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "URL or bare host to probe"}
            },
            "required": ["url"]
        })
    }

    async fn invoke(&self, params: &Map<String, Value>) -> Result<Value, String> {
        let target = required_str(params, "url")?;
        let url = if target.contains("://") {
            target.to_string()
        } else {
            format!("https://{target}")
        };

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("probe of {url} failed: {e}"))?;

        let headers = resp.headers();
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let mut present = Map::new();
        let mut missing = Vec::new();
        for name in SECURITY_HEADERS {
            match header(name) {
                Some(v) => {
                    present.insert(name.to_string(), Value::String(v));
                }
                None => missing.push(*name),
            }
        }

        Ok(json!({
            "url": url,
            "status": resp.status().as_u16(),
            "final_url": resp.url().as_str(),
            "server": header("server"),
            "content_type": header("content-type"),
            "security_headers": present,
            "missing_security_headers": missing,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_headers_and_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("server", "nginx/1.25")
            .with_header("x-frame-options", "DENY")
            .with_body("ok")
            .create_async()
            .await;

        let tool = HttpProbeTool::new(reqwest::Client::new());
        let params = json!({"url": format!("{}/", server.url())});
        let out = tool.invoke(params.as_object().unwrap()).await.unwrap();

        assert_eq!(out["status"], 200);
        assert_eq!(out["server"], "nginx/1.25");
        assert_eq!(out["security_headers"]["x-frame-options"], "DENY");
        let missing = out["missing_security_headers"].as_array().unwrap();
        assert_eq!(missing.len(), SECURITY_HEADERS.len() - 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_reported_not_raised() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/gone").with_status(404).create_async().await;
        let tool = HttpProbeTool::new(reqwest::Client::new());
        let params = json!({"url": format!("{}/gone", server.url())});
        let out = tool.invoke(params.as_object().unwrap()).await.unwrap();
        assert_eq!(out["status"], 404);
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let tool = HttpProbeTool::new(reqwest::Client::new());
        let params = json!({"url": "http://127.0.0.1:1/"});
        assert!(tool.invoke(params.as_object().unwrap()).await.is_err());
    }
}
