//! Gemini API endpoints
//!
//! Drives the `generateContent` endpoint that backs query assistance.
//! The API key travels in the `x-goog-api-key` header; the model comes
//! from the client configuration.

use crate::client::{AuthScheme, QuerydeckClient};
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base URL of the generative language API
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API interface
#[derive(Clone)]
pub struct GeminiApi {
    client: QuerydeckClient,
}

impl GeminiApi {
    /// Create a new Gemini API interface
    pub(crate) fn new(client: QuerydeckClient) -> Self {
        Self { client }
    }

    fn auth(&self) -> ApiResult<AuthScheme> {
        Ok(AuthScheme::Header {
            name: API_KEY_HEADER,
            value: self.client.config().gemini_key()?.to_string(),
        })
    }

    /// Generate content from a full request
    ///
    /// POST models/{model}:generateContent
    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> ApiResult<GenerateContentResponse> {
        let auth = self.auth()?;
        let url = format!(
            "{}/models/{}:generateContent",
            GEMINI_API_BASE,
            self.client.config().gemini_model
        );
        self.client.post_url(&url, &auth, request).await
    }

    /// Send a single user prompt and return the reply text
    ///
    /// Safety blocks and empty replies surface as their own error
    /// variants so callers can report them distinctly.
    pub async fn generate_text(&self, prompt: &str) -> ApiResult<String> {
        let response = self.generate(&GenerateContentRequest::user_text(prompt)).await?;
        extract_text(response)
    }

    /// Timed connectivity probe fetching the configured model's metadata
    ///
    /// GET models/{model}
    pub async fn ping(&self) -> ApiResult<Duration> {
        let auth = self.auth()?;
        let url = format!(
            "{}/models/{}",
            GEMINI_API_BASE,
            self.client.config().gemini_model
        );
        let (_, elapsed): (serde_json::Value, Duration) =
            self.client.timed_get_url(&url, &auth).await?;
        Ok(elapsed)
    }
}

/// Pull the first candidate's text out of a response
fn extract_text(response: GenerateContentResponse) -> ApiResult<String> {
    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            return Err(ApiError::SafetyBlocked {
                reason: reason.clone(),
            });
        }
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ApiError::EmptyReply);
    };

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(ApiError::SafetyBlocked {
            reason: "SAFETY".to_string(),
        });
    }

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::EmptyReply);
    }
    Ok(text)
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Content generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    /// Conversation turns; a single user turn for this tool
    pub contents: Vec<Content>,
    /// Optional sampling configuration
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Build a request carrying one user prompt
    pub fn user_text(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            generation_config: None,
        }
    }

    /// Attach a generation config
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

/// One conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// Turn role (`user` or `model`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Turn content parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Build a user turn with one text part
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

/// One part of a turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Text content; other part kinds are ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Sampling configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Cap on reply length
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Content generation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    /// Candidate replies, best first
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Feedback about the prompt itself
    #[serde(rename = "promptFeedback", default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One candidate reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Reply content
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation stopped (`STOP`, `MAX_TOKENS`, `SAFETY`, ...)
    #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>,
}

/// Prompt-level feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptFeedback {
    /// Set when the prompt was blocked outright
    #[serde(rename = "blockReason", default)]
    pub block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_from(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_request_wire_format() {
        let request = GenerateContentRequest::user_text("explain this query");
        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("\"contents\""));
        assert!(json.contains("\"parts\""));
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("explain this query"));
        // No config set, so the field is omitted
        assert!(!json.contains("generationConfig"));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response = response_from(
            r#"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{"text": "_sourceCategory=prod "}, {"text": "error | count"}]
                    },
                    "finishReason": "STOP"
                }]
            }"#,
        );

        let text = extract_text(response).unwrap();
        assert_eq!(text, "_sourceCategory=prod error | count");
    }

    #[test]
    fn test_extract_text_trims_whitespace() {
        let response = response_from(
            r#"{"candidates": [{"content": {"parts": [{"text": "\n  reply  \n"}]}}]}"#,
        );
        assert_eq!(extract_text(response).unwrap(), "reply");
    }

    #[test]
    fn test_prompt_block_maps_to_safety_error() {
        let response = response_from(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        match extract_text(response) {
            Err(ApiError::SafetyBlocked { reason }) => assert_eq!(reason, "SAFETY"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_safety_finish_maps_to_safety_error() {
        let response = response_from(
            r#"{"candidates": [{"content": {"parts": []}, "finishReason": "SAFETY"}]}"#,
        );
        assert!(matches!(
            extract_text(response),
            Err(ApiError::SafetyBlocked { .. })
        ));
    }

    #[test]
    fn test_no_candidates_is_empty_reply() {
        let response = response_from(r#"{"candidates": []}"#);
        assert!(matches!(extract_text(response), Err(ApiError::EmptyReply)));
    }

    #[test]
    fn test_blank_text_is_empty_reply() {
        let response =
            response_from(r#"{"candidates": [{"content": {"parts": [{"text": "   "}]}}]}"#);
        assert!(matches!(extract_text(response), Err(ApiError::EmptyReply)));
    }
}
