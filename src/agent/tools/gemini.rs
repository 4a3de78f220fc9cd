//! Gemini summarizer
//!
//! Calls the Gemini `generateContent` REST endpoint to condense a page into a
//! query-focused summary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::prompts::{build_summary_prompt, EMPTY_PAGE_SUMMARY};
use crate::agent::tools::{Summarizer, ToolError};
use crate::types::config::ResearchConfig;

const SUMMARY_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// Gemini API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    #[serde(default)]
    code: u16,
    message: String,
}

// ============================================================================
// GeminiSummarizer
// ============================================================================

pub struct GeminiSummarizer {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiSummarizer {
    /// A missing key is not an error here; every `summarize` call will fail instead.
    pub fn new(config: &ResearchConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(SUMMARY_TIMEOUT_SECS))
            .build()
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &ResearchConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_api_base.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, text: &str, query: &str) -> Result<String, ToolError> {
        if text.trim().is_empty() {
            return Ok(EMPTY_PAGE_SUMMARY.to_string());
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::NotConfigured("GEMINI_API_KEY is not set".into()))?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(build_summary_prompt(text, query)),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 1024,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        let parsed: Option<GenerateContentResponse> = serde_json::from_str(&response_text).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(response_text);
            return Err(ToolError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = parsed.ok_or_else(|| {
            ToolError::ExecutionFailed("Failed to parse Gemini response".into())
        })?;

        let summary = extract_candidate_text(parsed)?;
        tracing::debug!("Gemini ({}) summary: {} chars", self.model, summary.len());
        Ok(summary)
    }
}

fn extract_candidate_text(response: GenerateContentResponse) -> Result<String, ToolError> {
    if let Some(error) = response.error {
        return Err(ToolError::Api {
            status: error.code,
            message: error.message,
        });
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::ExecutionFailed("No candidates in Gemini response".into()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(ToolError::ExecutionFailed(format!(
            "Empty Gemini response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{http_response, serve_capture, test_client};
    use std::time::Duration;

    fn config_for(base: &str, key: Option<&str>) -> ResearchConfig {
        ResearchConfig {
            gemini_api_key: key.map(String::from),
            gemini_api_base: base.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "AI helps "}, {"text": "diagnostics.\n"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(extract_candidate_text(response).unwrap(), "AI helps diagnostics.");
    }

    #[test]
    fn test_extract_no_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(matches!(
            extract_candidate_text(response),
            Err(ToolError::ExecutionFailed(_))
        ));
    }

    #[test]
    fn test_extract_blocked_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        let err = extract_candidate_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_empty_text_skips_network() {
        // Unroutable base: any request would fail
        let summarizer = GeminiSummarizer::with_client(
            &config_for("http://127.0.0.1:9", None),
            test_client(Duration::from_secs(1)),
        );
        assert_eq!(summarizer.summarize("  \n ", "q").await.unwrap(), EMPTY_PAGE_SUMMARY);
    }

    #[tokio::test]
    async fn test_missing_key_fails_on_use() {
        let summarizer = GeminiSummarizer::with_client(
            &config_for("http://127.0.0.1:9", None),
            test_client(Duration::from_secs(1)),
        );
        assert!(matches!(
            summarizer.summarize("hello world", "q").await,
            Err(ToolError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_summarize_round_trip() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"greeting"}]},"finishReason":"STOP"}]}"#;
        let (url, request) = serve_capture(http_response("200 OK", "application/json", body)).await;
        let base = url.trim_end_matches("/page").to_string();

        let summarizer = GeminiSummarizer::with_client(
            &config_for(&base, Some("gm-key")),
            test_client(Duration::from_secs(5)),
        );
        assert_eq!(summarizer.summarize("hello world", "test").await.unwrap(), "greeting");

        let raw = request.await.unwrap();
        assert!(raw.starts_with("POST /models/gemini-1.5-flash:generateContent?key=gm-key"));
        assert!(raw.contains("generationConfig"));
        assert!(raw.contains("Research question: test"));
    }

    #[tokio::test]
    async fn test_api_error_message_surfaced() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        let (url, _request) = serve_capture(http_response("429 Too Many Requests", "application/json", body)).await;
        let base = url.trim_end_matches("/page").to_string();

        let summarizer = GeminiSummarizer::with_client(
            &config_for(&base, Some("gm-key")),
            test_client(Duration::from_secs(5)),
        );
        match summarizer.summarize("hello world", "test").await {
            Err(ToolError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }
}
