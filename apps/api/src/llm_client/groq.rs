//! OpenAI-compatible chat-completions binding (Groq). Serves the interviewer
//! and career-mentor personas.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{provider_error_message, CompletionError, CompletionRequest, CompletionService};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Model used for every interviewer and mentor call.
pub const MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    base_url: String,
}

impl GroqClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CompletionError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?,
            base_url: base_url.into(),
        })
    }
}

/// System instruction first, then the conversation in order.
fn build_messages<'a>(request: &CompletionRequest<'a>) -> Vec<ChatMessage<'a>> {
    let mut messages = Vec::with_capacity(request.turns.len() + 1);
    if !request.persona_instruction.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: request.persona_instruction,
        });
    }
    messages.extend(request.turns.iter().map(|t| ChatMessage {
        role: t.role.as_str(),
        content: &t.content,
    }));
    messages
}

#[async_trait]
impl CompletionService for GroqClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest<'_>,
    ) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: MODEL,
            messages: build_messages(request),
            temperature: request.sampling_temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Chat completion API returned {status}");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: provider_error_message(body),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        if let Some(usage) = &parsed.usage {
            debug!(
                "Chat completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(CompletionError::EmptyContent)
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
    fn test_system_instruction_leads_messages() {
        let turns = vec![
            ConversationTurn::user("I built a robot"),
            ConversationTurn::assistant("What did it do?"),
        ];
        let request = CompletionRequest {
            persona_instruction: "Be factual.",
            turns: &turns,
            sampling_temperature: 0.7,
        };
        let messages = build_messages(&request);
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
        assert_eq!(messages[0].content, "Be factual.");
    }

    #[test]
    fn test_empty_instruction_omits_system_message() {
        let turns = vec![ConversationTurn::user("prompt")];
        let request = CompletionRequest {
            persona_instruction: "",
            turns: &turns,
            sampling_temperature: 0.6,
        };
        assert_eq!(build_messages(&request).len(), 1);
    }

    #[test]
    fn test_response_choice_content_deserializes() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Hello"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Hello"));
        assert!(parsed.usage.is_none());
    }
}
