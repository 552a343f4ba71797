//! Gemini API client.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::SoulError;
use crate::llm::{http_client, send_with_retry, LanguageModel};

/// Gemini `generateContent` client.
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, SoulError> {
        Ok(Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: http_client(timeout)?,
        })
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, SoulError> {
        let request = GeminiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: user_prompt.to_string(),
                }],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: system_prompt.to_string(),
                }],
            }),
        };

        // Key goes in a header so it never shows up in logged URLs.
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let body = send_with_retry(|| {
            self.http
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request)
        })
        .await?;

        parse_gemini_response(&body)
    }
}

impl LanguageModel for GeminiClient {
    fn complete<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> BoxFuture<'a, Result<String, SoulError>> {
        self.generate(system_prompt, user_prompt).boxed()
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_gemini_response(body: &str) -> Result<String, SoulError> {
    let parsed: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| SoulError::Llm(format!("failed to parse response: {e}")))?;

    Ok(parsed
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .map(|parts| parts.into_iter().map(|p| p.text).collect::<String>())
        .unwrap_or_default())
}
