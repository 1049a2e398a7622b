//! Gemini `generateContent` binding. Serves the roadmap advisor persona.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{
    provider_error_message, CompletionError, CompletionRequest, CompletionService, Role,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CompletionError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?,
            base_url: base_url.into(),
        })
    }
}

fn build_request<'a>(request: &CompletionRequest<'a>) -> GenerateRequest<'a> {
    let system_instruction = (!request.persona_instruction.is_empty()).then(|| Content {
        role: None,
        parts: vec![Part {
            text: request.persona_instruction,
        }],
    });

    // Gemini only knows "user" and "model" turns.
    let contents = request
        .turns
        .iter()
        .map(|t| Content {
            role: Some(match t.role {
                Role::Assistant => "model",
                Role::User | Role::System => "user",
            }),
            parts: vec![Part { text: &t.content }],
        })
        .collect();

    GenerateRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig {
            temperature: request.sampling_temperature,
        },
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest<'_>,
    ) -> Result<String, CompletionError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            MODEL
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&build_request(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {status}");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: provider_error_message(body),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(CompletionError::EmptyContent);
        }
        Ok(text)
    }

    fn model(&self) -> &str {
        MODEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ConversationTurn;

    #[test]
    fn test_request_maps_assistant_to_model_role() {
        let turns = vec![
            ConversationTurn::user("analyse me"),
            ConversationTurn::assistant("sure"),
        ];
        let request = CompletionRequest {
            persona_instruction: "",
            turns: &turns,
            sampling_temperature: 0.4,
        };
        let json = serde_json::to_value(build_request(&request)).unwrap();
        assert!(json.get("systemInstruction").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["generationConfig"]["temperature"].as_f64().unwrap() as f32, 0.4);
    }

    #[test]
    fn test_candidate_parts_deserialize() {
        let json = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"A"},{"text":"B"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        let parts: Vec<_> = parsed.candidates[0]
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.clone())
            .collect();
        assert_eq!(parts, vec!["A", "B"]);
    }
}
