//! Web fetch - HTTP GET, HTML to text
//!
//! Fetches a single page and reduces it to readable text.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::time::Duration;
use url::Url;

use crate::agent::tools::{FetchError, PageFetcher, ToolError};

/// Bodies are read up to this many bytes; the rest is dropped
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// ============================================================================
// WebFetcher
// ============================================================================

pub struct WebFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl WebFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("research-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes.max(1);
        self
    }

    /// Legacy contract: any failure becomes an empty string
    pub async fn fetch_or_empty(&self, url: &str) -> String {
        match self.fetch(url).await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("Fetch of {} failed, using empty text: {}", url, e);
                String::new()
            }
        }
    }

    async fn read_body(&self, mut response: reqwest::Response, url: &str) -> Result<String, FetchError> {
        if let Some(len) = response.content_length() {
            if len as usize > self.max_body_bytes {
                tracing::debug!("{} announces {} bytes, reading the first {}", url, len, self.max_body_bytes);
            }
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })? {
            let room = self.max_body_bytes - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                tracing::debug!("{} body cut at {} bytes", url, self.max_body_bytes);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl PageFetcher for WebFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        let body = self.read_body(response, url).await?;

        let text = if is_html(&content_type, &body) {
            html_to_text(&body)
        } else {
            body.trim().to_string()
        };

        tracing::debug!("Fetched {} ({}, {} bytes of text)", url, content_type, text.len());
        Ok(text)
    }
}

fn is_html(content_type: &str, body: &str) -> bool {
    if content_type.contains("text/html") || content_type.contains("application/xhtml") {
        return true;
    }
    if !content_type.is_empty() {
        return false;
    }
    let head: String = body.trim_start().chars().take(64).collect::<String>().to_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

// ============================================================================
// Helpers
// ============================================================================

/// Elements whose contents never reach the reader
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

const BLOCK_ELEMENTS: &[&str] = &[
    "br", "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "tr", "table",
    "section", "article", "header", "footer", "nav", "blockquote", "pre",
];

static INLINE_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\x0C\u{A0}]+").expect("valid regex"));

/// HTML to visible text: parses the document, drops head/script/style,
/// keeps text nodes, collapses whitespace. Keeps at most one blank line.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);
    let cleaned = strip_control_chars(&raw);

    let mut result = String::new();
    let mut empty_lines = 0;
    for line in cleaned.lines() {
        let collapsed = INLINE_SPACE.replace_all(line, " ");
        let trimmed = collapsed.trim();
        if trimmed.is_empty() {
            empty_lines += 1;
            if empty_lines == 1 && !result.is_empty() {
                result.push('\n');
            }
        } else {
            empty_lines = 0;
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if HIDDEN_ELEMENTS.contains(&name) {
                    continue;
                }
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                collect_text(child_element, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Whitespace controls become spaces; other controls, NUL and U+FFFD are dropped
fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            c if c.is_whitespace() => Some(' '),
            c if c.is_control() || c == '\u{FFFD}' => None,
            c => Some(c),
        })
        .collect()
}
