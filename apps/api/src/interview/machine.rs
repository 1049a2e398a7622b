//! Interview state machine.
//!
//! Each user message advances the round counter by one. Rounds below
//! `TERMINAL_ROUND` run the investigative persona; from `TERMINAL_ROUND` on the
//! summarizing persona is forced, and its `SAVE_DATA` payload moves the session
//! to `Complete`.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::parser::{contains_sentinel, parse_terminal_payload, ParseError};
use super::prompts::{
    INVESTIGATIVE_PERSONA, INVESTIGATIVE_TEMPERATURE, PARSE_RETRY_NOTICE, STALL_MESSAGE,
    SUMMARIZING_PERSONA, SUMMARIZING_TEMPERATURE,
};
use super::session::{
    is_known_grade_level, InterviewPhase, InterviewSession, StructuredRecord, TERMINAL_ROUND,
};
use crate::llm_client::{
    CompletionError, CompletionRequest, CompletionService, ConversationTurn, CredentialPool,
};

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("completion service unavailable: {0}")]
    ServiceUnavailable(#[from] CompletionError),

    #[error("could not parse terminal payload: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Validation(String),
}

/// Result of one `advance` call.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub phase: InterviewPhase,
    pub round_counter: i32,
    /// Soft, retryable notice for the student (e.g. an unparseable payload).
    pub notice: Option<String>,
    pub pending_record: Option<StructuredRecord>,
}

/// Persona instruction and sampling temperature for a round.
pub fn persona_for_round(round_counter: i32) -> (&'static str, f32) {
    if round_counter < TERMINAL_ROUND {
        (INVESTIGATIVE_PERSONA, INVESTIGATIVE_TEMPERATURE)
    } else {
        (SUMMARIZING_PERSONA, SUMMARIZING_TEMPERATURE)
    }
}

#[derive(Clone)]
pub struct Interviewer {
    service: Arc<dyn CompletionService>,
    credentials: Arc<CredentialPool>,
}

impl Interviewer {
    pub fn new(service: Arc<dyn CompletionService>, credentials: Arc<CredentialPool>) -> Self {
        Self {
            service,
            credentials,
        }
    }

    /// Records the user's message, runs one completion, and applies the reply.
    ///
    /// Provider failures never surface here: the credential pool rotates and a
    /// stalling reply keeps the conversation going.
    pub async fn advance(
        &self,
        session: &mut InterviewSession,
        user_message: &str,
    ) -> Result<TurnOutcome, InterviewError> {
        let user_message = user_message.trim();
        if user_message.is_empty() {
            return Err(InterviewError::Validation(
                "message cannot be empty".to_string(),
            ));
        }
        if session.is_complete {
            return Err(InterviewError::Validation(
                "interview is complete; finalize it with evidence or redo it".to_string(),
            ));
        }

        session.turns.push(ConversationTurn::user(user_message));
        session.round_counter += 1;

        let reply = match self.request_completion(session).await {
            Ok(text) => text,
            Err(InterviewError::ServiceUnavailable(e)) => {
                self.credentials.next();
                warn!(
                    "Interview completion failed on round {}: {e}; rotated to credential #{}",
                    session.round_counter,
                    self.credentials.current_index()
                );
                STALL_MESSAGE.to_string()
            }
            Err(other) => return Err(other),
        };

        session.turns.push(ConversationTurn::assistant(reply.clone()));

        let mut notice = None;
        if contains_sentinel(&reply) {
            match apply_terminal_payload(session, &reply) {
                Ok(()) => info!(
                    "Interview complete after round {}",
                    session.round_counter
                ),
                Err(InterviewError::Parse(e)) => {
                    warn!("Terminal payload rejected: {e}");
                    notice = Some(PARSE_RETRY_NOTICE.to_string());
                }
                Err(other) => return Err(other),
            }
        }

        Ok(TurnOutcome {
            reply,
            phase: session.phase(),
            round_counter: session.round_counter,
            notice,
            pending_record: session.pending_record.clone(),
        })
    }

    async fn request_completion(
        &self,
        session: &InterviewSession,
    ) -> Result<String, InterviewError> {
        let (persona, temperature) = persona_for_round(session.round_counter);
        let request = CompletionRequest {
            persona_instruction: persona,
            turns: &session.turns,
            sampling_temperature: temperature,
        };
        Ok(self
            .service
            .complete(self.credentials.current(), &request)
            .await?)
    }
}

fn apply_terminal_payload(
    session: &mut InterviewSession,
    reply: &str,
) -> Result<(), InterviewError> {
    let record = parse_terminal_payload(reply, &session.grade_context)?;
    session.pending_record = Some(record);
    session.is_complete = true;
    Ok(())
}

/// Changes the grade the next achievement is filed under. Only allowed before
/// the first message.
pub fn set_grade_context(
    session: &mut InterviewSession,
    grade: &str,
) -> Result<(), InterviewError> {
    if session.phase() != InterviewPhase::Reset {
        return Err(InterviewError::Validation(
            "grade can only be chosen before the conversation starts".to_string(),
        ));
    }
    if !is_known_grade_level(grade) {
        return Err(InterviewError::Validation(format!(
            "unknown grade level '{grade}'"
        )));
    }
    session.grade_context = grade.to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::parser::closing_statement;
    use crate::interview::session::NOT_APPLICABLE;
    use crate::llm_client::testing::{Scripted, ScriptedCompletionService};
    use crate::llm_client::Role;

    fn interviewer(
        script: Vec<Scripted>,
        keys: &[&str],
    ) -> (Interviewer, Arc<ScriptedCompletionService>, Arc<CredentialPool>) {
        let service = Arc::new(ScriptedCompletionService::new(script));
        let pool = Arc::new(CredentialPool::new(keys.iter().map(|k| k.to_string())).unwrap());
        (
            Interviewer::new(service.clone(), pool.clone()),
            service,
            pool,
        )
    }

    fn question(text: &str) -> Scripted {
        Scripted::Reply(text.to_string())
    }

    #[tokio::test]
    async fn test_round_counter_increases_by_one_per_message() {
        let (iv, _, _) = interviewer(vec![], &["k1"]);
        let mut session = InterviewSession::default();
        for expected in 0..4 {
            let outcome = iv.advance(&mut session, "I built a robot arm").await.unwrap();
            assert_eq!(outcome.round_counter, expected);
            assert_eq!(session.round_counter, expected);
        }
        assert_eq!(session.turns.len(), 8);
        assert_eq!(session.turns[0].role, Role::User);
        assert_eq!(session.turns[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_terminal_rounds_use_summarizing_persona() {
        // Malformed payloads keep the session open past round 5.
        let mut script: Vec<Scripted> = (0..5).map(|_| question("Which sensor?")).collect();
        script.push(question("Summary.\nSAVE_DATA: broken"));
        script.push(question("Summary.\nSAVE_DATA: still | broken"));
        let (iv, service, _) = interviewer(script, &["k1"]);
        let mut session = InterviewSession::default();
        for _ in 0..7 {
            iv.advance(&mut session, "details").await.unwrap();
        }

        let calls = service.calls();
        assert_eq!(calls.len(), 7);
        for (round, call) in calls.iter().enumerate() {
            if round < 5 {
                assert_eq!(call.persona_instruction, INVESTIGATIVE_PERSONA);
                assert_eq!(call.temperature, INVESTIGATIVE_TEMPERATURE);
            } else {
                assert_eq!(call.persona_instruction, SUMMARIZING_PERSONA);
                assert_eq!(call.temperature, SUMMARIZING_TEMPERATURE);
            }
        }
        assert!(SUMMARIZING_TEMPERATURE < INVESTIGATIVE_TEMPERATURE);
        assert_eq!(session.phase(), InterviewPhase::Terminal);
    }

    #[tokio::test]
    async fn test_full_history_is_sent_each_round() {
        let (iv, service, _) = interviewer(vec![], &["k1"]);
        let mut session = InterviewSession::default();
        iv.advance(&mut session, "first").await.unwrap();
        iv.advance(&mut session, "second").await.unwrap();
        let counts: Vec<_> = service.calls().iter().map(|c| c.turn_count).collect();
        assert_eq!(counts, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_no_sentinel_before_terminal_round_stays_collecting() {
        let (iv, _, _) = interviewer(vec![], &["k1"]);
        let mut session = InterviewSession::default();
        for _ in 0..5 {
            let outcome = iv.advance(&mut session, "We won the science fair").await.unwrap();
            assert_eq!(outcome.phase, InterviewPhase::Collecting);
            assert!(outcome.pending_record.is_none());
        }
        assert!(!session.is_complete);
    }

    #[tokio::test]
    async fn test_service_failure_rotates_credentials_once() {
        let script = vec![question("q0"), question("q1"), Scripted::Fail];
        let (iv, service, pool) = interviewer(script, &["k1", "k2", "k3"]);
        let mut session = InterviewSession::default();
        iv.advance(&mut session, "one").await.unwrap();
        iv.advance(&mut session, "two").await.unwrap();
        assert_eq!(pool.current_index(), 0);

        let outcome = iv.advance(&mut session, "three").await.unwrap();
        assert_eq!(session.round_counter, 2);
        assert_eq!(pool.current_index(), 1);
        assert_eq!(outcome.reply, STALL_MESSAGE);
        assert!(!outcome.reply.is_empty());
        assert_eq!(session.turns.last().unwrap().content, STALL_MESSAGE);

        iv.advance(&mut session, "four").await.unwrap();
        let keys: Vec<_> = service.calls().into_iter().map(|c| c.api_key).collect();
        assert_eq!(keys, vec!["k1", "k1", "k1", "k2"]);
    }

    #[tokio::test]
    async fn test_rotation_wraps_around_pool() {
        let (iv, _, pool) = interviewer(vec![Scripted::Fail, Scripted::Fail], &["k1", "k2"]);
        let mut session = InterviewSession::default();
        iv.advance(&mut session, "a").await.unwrap();
        iv.advance(&mut session, "b").await.unwrap();
        assert_eq!(pool.current_index(), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_returns_notice_and_stays_open() {
        let (iv, _, _) = interviewer(
            vec![question("Done.\nSAVE_DATA: Grade 9 | Robotics")],
            &["k1"],
        );
        let mut session = InterviewSession::default();
        let outcome = iv.advance(&mut session, "robot").await.unwrap();
        assert_eq!(outcome.notice.as_deref(), Some(PARSE_RETRY_NOTICE));
        assert!(!session.is_complete);
        assert!(session.pending_record.is_none());
    }

    #[tokio::test]
    async fn test_valid_payload_completes_session() {
        let mut script: Vec<Scripted> = (0..5).map(|_| question("Tell me more.")).collect();
        script.push(question(
            "The student built a sensor rig.\n\nSAVE_DATA: Grade 10 | Science Fair | Python, Testing | Built a sensor rig",
        ));
        let (iv, _, _) = interviewer(script, &["k1"]);
        let mut session = InterviewSession {
            grade_context: "Grade 10".into(),
            ..Default::default()
        };
        for _ in 0..5 {
            iv.advance(&mut session, "sensor rig in python").await.unwrap();
        }
        let outcome = iv.advance(&mut session, "that's all").await.unwrap();
        assert_eq!(outcome.phase, InterviewPhase::Complete);
        let record = session.pending_record.clone().unwrap();
        assert_eq!(record.grade, "Grade 10");
        assert_eq!(record.title, "Science Fair");

        let err = iv.advance(&mut session, "more?").await.unwrap_err();
        assert!(matches!(err, InterviewError::Validation(_)));
        assert_eq!(session.round_counter, 5);
    }

    #[tokio::test]
    async fn test_low_information_interview_yields_not_applicable_record() {
        let refusal = "Please provide the specific information I asked for. I cannot document dots or gibberish.";
        let mut script: Vec<Scripted> = (0..5).map(|_| question(refusal)).collect();
        script.push(question(
            "No valid data provided.\n\nSAVE_DATA: N/A | N/A | N/A | N/A",
        ));
        let (iv, service, _) = interviewer(script, &["k1"]);
        let mut session = InterviewSession::default();

        for reply in ["...", "asdf", "k", "n/a", "."] {
            let outcome = iv.advance(&mut session, reply).await.unwrap();
            assert_eq!(outcome.phase, InterviewPhase::Collecting);
        }
        let outcome = iv.advance(&mut session, "?").await.unwrap();

        assert_eq!(session.round_counter, TERMINAL_ROUND);
        assert_eq!(outcome.phase, InterviewPhase::Complete);
        assert_eq!(closing_statement(&outcome.reply), "No valid data provided.");
        let record = outcome.pending_record.unwrap();
        assert_eq!(record.title, NOT_APPLICABLE);
        assert_eq!(record.skills, NOT_APPLICABLE);
        assert_eq!(record.summary, NOT_APPLICABLE);
        assert_eq!(
            service.calls().last().unwrap().persona_instruction,
            SUMMARIZING_PERSONA
        );
    }

    #[tokio::test]
    async fn test_empty_message_rejected_without_state_change() {
        let (iv, service, _) = interviewer(vec![], &["k1"]);
        let mut session = InterviewSession::default();
        let err = iv.advance(&mut session, "   ").await.unwrap_err();
        assert!(matches!(err, InterviewError::Validation(_)));
        assert_eq!(session.round_counter, -1);
        assert!(service.calls().is_empty());
    }

    #[test]
    fn test_grade_context_only_settable_before_start() {
        let mut session = InterviewSession::default();
        set_grade_context(&mut session, "Grade 11").unwrap();
        assert_eq!(session.grade_context, "Grade 11");
        assert!(set_grade_context(&mut session, "Grade 42").is_err());

        session.round_counter = 0;
        assert!(set_grade_context(&mut session, "Grade 12").is_err());
        assert_eq!(session.grade_context, "Grade 11");
    }
}
