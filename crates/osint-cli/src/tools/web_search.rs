use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};

use osint_core::tool::Tool;

use super::required_str;

pub const DUCKDUCKGO_HTML: &str = "https://html.duckduckgo.com/html/";
const DEFAULT_RESULTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// DuckDuckGo HTML search, scraped with regular expressions.
pub struct WebSearchTool {
    http: reqwest::Client,
    endpoint: String,
}

impl WebSearchTool {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: DUCKDUCKGO_HTML.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web and return titles, URLs and snippets of the top results"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"},
                "num_results": {"type": "integer", "description": "Maximum results (default 10)"}
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, params: &Map<String, Value>) -> Result<Value, String> {
        let query = required_str(params, "query")?;
        let limit = params
            .get("num_results")
            .and_then(Value::as_u64)
            .map_or(DEFAULT_RESULTS, |n| n as usize);

        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| format!("search request failed: {e}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("search returned {status}"));
        }
        let html = resp.text().await.map_err(|e| e.to_string())?;
        let results = parse_results(&html, limit);

        Ok(json!({
            "query": query,
            "count": results.len(),
            "results": results,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}

fn result_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).unwrap()
    })
}

fn snippet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</a>"#).unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Extract up to `limit` hits. Snippets are paired with links by position.
pub fn parse_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let snippets: Vec<String> = snippet_re()
        .captures_iter(html)
        .map(|c| clean(&c[1]))
        .collect();
    result_link_re()
        .captures_iter(html)
        .take(limit)
        .enumerate()
        .map(|(i, c)| SearchHit {
            title: clean(&c[2]),
            url: resolve_redirect(&c[1]),
            snippet: snippets.get(i).cloned().unwrap_or_default(),
        })
        .collect()
}

fn clean(fragment: &str) -> String {
    let text = tag_re().replace_all(fragment, "");
    text.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// DuckDuckGo wraps targets as `//duckduckgo.com/l/?uddg=<encoded>`.
fn resolve_redirect(href: &str) -> String {
    let href = href.replace("&amp;", "&");
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.clone()
    };
    reqwest::Url::parse(&absolute)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(href)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<div class="result results_links">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fabout&amp;rut=abc">Example <b>Corp</b></a>
  </h2>
  <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Example Corp &amp; partners make <b>widgets</b>.</a>
</div>
<div class="result results_links">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://direct.example.org/">Direct</a>
  </h2>
  <a class="result__snippet" href="https://direct.example.org/">Second snippet</a>
</div>
"#;

    #[test]
    fn parses_titles_urls_and_snippets() {
        let hits = parse_results(PAGE, 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Example Corp");
        assert_eq!(hits[0].url, "https://example.com/about");
        assert_eq!(hits[0].snippet, "Example Corp & partners make widgets.");
        assert_eq!(hits[1].url, "https://direct.example.org/");
    }

    #[test]
    fn respects_limit() {
        assert_eq!(parse_results(PAGE, 1).len(), 1);
        assert!(parse_results("<html></html>", 5).is_empty());
    }

    #[tokio::test]
    async fn invoke_queries_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/html/")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "acme corp".into()))
            .with_body(PAGE)
            .create_async()
            .await;

        let tool = WebSearchTool::new(reqwest::Client::new())
            .with_endpoint(format!("{}/html/", server.url()));
        let params = json!({"query": "acme corp", "num_results": 1});
        let out = tool.invoke(params.as_object().unwrap()).await.unwrap();
        assert_eq!(out["count"], 1);
        assert_eq!(out["results"][0]["title"], "Example Corp");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/html/")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;
        let tool = WebSearchTool::new(reqwest::Client::new())
            .with_endpoint(format!("{}/html/", server.url()));
        let params = json!({"query": "x"});
        let err = tool.invoke(params.as_object().unwrap()).await.unwrap_err();
        assert!(err.contains("503"));
    }
}
