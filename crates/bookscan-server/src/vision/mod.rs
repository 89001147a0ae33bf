//! Vision extraction client
//!
//! Sends a bookshelf photo to an external multimodal completion API and
//! parses the model's free-text reply into raw title/author candidates.
//!
//! The reply is expected to *contain* a JSON array but rarely to *be* one;
//! models like to wrap the payload in prose. The client locates the first
//! balanced `[...]` span in the reply and parses only that span.
//!
//! No retries happen here. Upstream failures (network, timeout, non-2xx)
//! are distinguishable from parse failures so the caller can decide what is
//! worth retrying: upstream errors may succeed on a second attempt, parse
//! failures will not without a different image or prompt.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::config::VisionConfig;

/// Instruction prompt sent with every image
const DETECTION_PROMPT: &str = "Identify all book titles and authors visible on the book spines \
in this bookshelf image. Return a JSON array with objects containing only 'title' and 'author' \
for each book you can identify. Focus only on clearly readable text on the spines.";

/// Vision extraction errors
#[derive(Error, Debug)]
pub enum VisionError {
    /// The external API was unreachable, timed out, or answered non-2xx.
    /// Retryable from the caller's point of view.
    #[error("Vision API request failed: {0}")]
    Upstream(String),

    /// A response arrived but no parseable JSON array could be extracted
    /// from it. Not retryable without a different image or prompt. The raw
    /// response text is attached for diagnosis.
    #[error("Could not extract a JSON array from the vision response")]
    Extraction { raw: String },
}

impl VisionError {
    /// Whether a retry with the same input could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, VisionError::Upstream(_))
    }
}

/// An unvalidated title/author pair as returned by the model
///
/// Both fields are untrusted and possibly missing; validation happens in
/// the ingestion pipeline, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookCandidate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Client for the external multimodal completion endpoint
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    config: VisionConfig,
}

impl VisionClient {
    /// Build a client with the configured request timeout
    pub fn new(config: VisionConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    /// Send one image to the completion endpoint and parse the candidates
    ///
    /// `content_type` is the image MIME type used in the data URL (the API
    /// wants to know what it is looking at).
    #[tracing::instrument(skip(self, image), fields(image_bytes = image.len()))]
    pub async fn detect(
        &self,
        image: &[u8],
        content_type: &str,
    ) -> Result<Vec<BookCandidate>, VisionError> {
        let encoded = BASE64.encode(image);

        let body = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": DETECTION_PROMPT },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:{};base64,{}", content_type, encoded)
                        }
                    }
                ]
            }],
            "max_tokens": self.config.max_tokens
        });

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VisionError::Upstream(format!(
                        "request timed out after {}s",
                        self.config.timeout_secs
                    ))
                } else {
                    VisionError::Upstream(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| VisionError::Upstream(e.to_string()))?;

        if !status.is_success() {
            return Err(VisionError::Upstream(format!(
                "vision API returned status {}: {}",
                status, text
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::debug!(error = %e, "Vision response envelope did not parse");
            VisionError::Extraction { raw: text.clone() }
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| VisionError::Extraction { raw: text.clone() })?;

        tracing::debug!(content_len = content.len(), "Vision API response received");

        parse_candidates(&content)
    }
}

/// Parse the model's free-text reply into candidates
fn parse_candidates(content: &str) -> Result<Vec<BookCandidate>, VisionError> {
    let span = extract_json_array(content).ok_or_else(|| VisionError::Extraction {
        raw: content.to_string(),
    })?;

    let candidates: Vec<BookCandidate> =
        serde_json::from_str(span).map_err(|e| {
            tracing::debug!(error = %e, "Extracted span did not parse as a candidate array");
            VisionError::Extraction {
                raw: content.to_string(),
            }
        })?;

    tracing::debug!(candidates = candidates.len(), "Parsed vision candidates");

    Ok(candidates)
}

/// Locate the first balanced `[...]` span in free text
///
/// Bracket depth is tracked outside JSON string literals so brackets inside
/// titles do not unbalance the scan.
fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '[' if !in_string => depth += 1,
            ']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            },
            _ => {},
        }
    }

    None
}
