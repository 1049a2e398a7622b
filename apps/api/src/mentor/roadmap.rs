use std::sync::Arc;

use tracing::info;

use super::prompts::{roadmap_prompt, ROADMAP_TEMPERATURE};
use super::{render_grades, render_portfolio};
use crate::llm_client::{CompletionError, CompletionRequest, CompletionService, ConversationTurn};
use crate::models::activity::ActivityRow;
use crate::models::grade::GradeRow;

/// Career roadmap over the second provider binding. Unlike the mentor, a
/// provider failure is returned to the caller.
#[derive(Clone)]
pub struct RoadmapAdvisor {
    service: Arc<dyn CompletionService>,
    api_key: String,
}

impl RoadmapAdvisor {
    pub fn new(service: Arc<dyn CompletionService>, api_key: String) -> Self {
        Self { service, api_key }
    }

    pub async fn roadmap(
        &self,
        grades: &[GradeRow],
        activities: &[ActivityRow],
    ) -> Result<String, CompletionError> {
        let prompt = roadmap_prompt(&render_grades(grades), &render_portfolio(activities));
        let turns = [ConversationTurn::user(prompt)];
        let request = CompletionRequest {
            persona_instruction: "",
            turns: &turns,
            sampling_temperature: ROADMAP_TEMPERATURE,
        };

        info!("Requesting career roadmap from {}", self.service.model());
        self.service.complete(&self.api_key, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{Scripted, ScriptedCompletionService};

    #[tokio::test]
    async fn test_roadmap_uses_configured_key() {
        let service = Arc::new(ScriptedCompletionService::new(vec![Scripted::Reply(
            "Primary Strength: Technical".into(),
        )]));
        let advisor = RoadmapAdvisor::new(service.clone(), "gemini-key".into());

        let text = advisor.roadmap(&[], &[]).await.unwrap();
        assert_eq!(text, "Primary Strength: Technical");
        assert_eq!(service.calls()[0].api_key, "gemini-key");
    }

    #[tokio::test]
    async fn test_roadmap_failure_propagates() {
        let service = Arc::new(ScriptedCompletionService::new(vec![Scripted::Fail]));
        let advisor = RoadmapAdvisor::new(service, "gemini-key".into());
        assert!(advisor.roadmap(&[], &[]).await.is_err());
    }
}
