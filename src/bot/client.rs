use std::time::Duration;

use anyhow::Context;
use tracing::{debug, warn};

/// Longest reply sent back to the chat, in characters.
pub const MAX_REPLY_CHARS: usize = 3500;

/// HTTP client for the user directory API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("build api http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GETs `path` and renders the outcome as chat text. Never fails.
    pub async fn fetch_text(&self, path: &str) -> String {
        let url = self.url(path);
        debug!(%url, "api request");
        let resp = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, %url, "api request failed");
                return format!("Request failed: {e}");
            }
        };
        let status = resp.status();
        match resp.text().await {
            Ok(body) => render(status.as_u16(), status.is_success(), &body),
            Err(e) => format!("Request failed: {e}"),
        }
    }
}

pub fn render(status: u16, success: bool, body: &str) -> String {
    if !success {
        return format!("HTTP {status}: {body}");
    }
    if body.trim().is_empty() {
        return "OK".to_string();
    }
    truncate(body)
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_REPLY_CHARS) {
        None => body.to_string(),
        Some((cut, _)) => format!("{}\n... (truncated)", &body[..cut]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_is_prefixed() {
        assert_eq!(render(404, false, "User not found"), "HTTP 404: User not found");
    }

    #[test]
    fn empty_body_is_ok() {
        assert_eq!(render(200, true, ""), "OK");
        assert_eq!(render(204, true, "  \n"), "OK");
    }

    #[test]
    fn long_body_is_truncated_on_char_boundary() {
        let body = "ж".repeat(MAX_REPLY_CHARS + 10);
        let out = render(200, true, &body);
        assert!(out.ends_with("\n... (truncated)"));
        assert_eq!(
            out.trim_end_matches("\n... (truncated)").chars().count(),
            MAX_REPLY_CHARS
        );
    }

    #[test]
    fn body_at_limit_is_kept() {
        let body = "x".repeat(MAX_REPLY_CHARS);
        assert_eq!(render(200, true, &body), body);
    }

    #[test]
    fn url_joins_without_double_slash() {
        let api = ApiClient::new("http://localhost:8080/").unwrap();
        assert_eq!(
            api.url("/api/v1/users/stats/count"),
            "http://localhost:8080/api/v1/users/stats/count"
        );
    }

    #[tokio::test]
    async fn unreachable_api_reports_failure() {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let text = api.fetch_text("/api/v1/users/stats/count").await;
        assert!(text.starts_with("Request failed:"));
    }
}
