//! LLM Client: the single point of entry for every completion call in Scholar.
//!
//! ARCHITECTURAL RULE: personas (interviewer, mentor, roadmap advisor) never talk
//! to a provider directly. They build a `CompletionRequest` and hand it to a
//! `CompletionService`, passing the API key explicitly so credential rotation
//! stays visible to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod credentials;
pub mod gemini;
pub mod groq;

pub use credentials::CredentialPool;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in an ordered conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Provider-neutral completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub persona_instruction: &'a str,
    pub turns: &'a [ConversationTurn],
    pub sampling_temperature: f32,
}

/// A text-completion backend. Implemented once per provider binding.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest<'_>,
    ) -> Result<String, CompletionError>;

    fn model(&self) -> &str;
}

/// Extracts a provider error message of the shape `{"error": {"message": ".."}}`,
/// falling back to the raw body.
pub(crate) fn provider_error_message(body: String) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorBody,
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[cfg(test)]
pub mod testing {
    //! In-process completion service used by persona and router tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone)]
    pub enum Scripted {
        Reply(String),
        Fail,
    }

    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub api_key: String,
        pub persona_instruction: String,
        pub temperature: f32,
        pub turn_count: usize,
    }

    /// Replays queued responses in order; once the queue is drained it answers
    /// with a generic follow-up question.
    #[derive(Default)]
    pub struct ScriptedCompletionService {
        script: Mutex<VecDeque<Scripted>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedCompletionService {
        pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletionService {
        async fn complete(
            &self,
            api_key: &str,
            request: &CompletionRequest<'_>,
        ) -> Result<String, CompletionError> {
            self.calls.lock().unwrap().push(RecordedCall {
                api_key: api_key.to_string(),
                persona_instruction: request.persona_instruction.to_string(),
                temperature: request.sampling_temperature,
                turn_count: request.turns.len(),
            });

            match self.script.lock().unwrap().pop_front() {
                Some(Scripted::Reply(text)) => Ok(text),
                Some(Scripted::Fail) => Err(CompletionError::Api {
                    status: 503,
                    message: "scripted outage".to_string(),
                }),
                None => Ok("What was the hardest technical problem you solved?".to_string()),
            }
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }
}
