use serde::{Deserialize, Serialize};

use crate::llm_client::ConversationTurn;

/// Round index at and beyond which the summarizing persona takes over.
pub const TERMINAL_ROUND: i32 = 5;

/// Placeholder for any field the persona could not fill with real content.
pub const NOT_APPLICABLE: &str = "N/A";

pub const DEFAULT_GRADE_CONTEXT: &str = "Grade 9";

pub const GRADE_LEVELS: &[&str] = &[
    "Grade 1",
    "Grade 2",
    "Grade 3",
    "Grade 4",
    "Grade 5",
    "Grade 6",
    "Grade 7",
    "Grade 8",
    "Grade 9",
    "Grade 10",
    "Grade 11",
    "Grade 12",
    "University",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPhase {
    /// Nothing said yet; grade context may still change.
    Reset,
    Collecting,
    Terminal,
    Complete,
}

/// Fields extracted from a terminal completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub grade: String,
    pub title: String,
    pub skills: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSession {
    pub round_counter: i32,
    pub turns: Vec<ConversationTurn>,
    pub is_complete: bool,
    pub pending_record: Option<StructuredRecord>,
    pub grade_context: String,
}

impl Default for InterviewSession {
    fn default() -> Self {
        Self {
            round_counter: -1,
            turns: Vec::new(),
            is_complete: false,
            pending_record: None,
            grade_context: DEFAULT_GRADE_CONTEXT.to_string(),
        }
    }
}

impl InterviewSession {
    pub fn phase(&self) -> InterviewPhase {
        if self.is_complete {
            InterviewPhase::Complete
        } else if self.is_terminal_round() {
            InterviewPhase::Terminal
        } else if self.round_counter < 0 {
            InterviewPhase::Reset
        } else {
            InterviewPhase::Collecting
        }
    }

    pub fn is_terminal_round(&self) -> bool {
        self.round_counter >= TERMINAL_ROUND
    }

    /// Fraction of the interview depth reached, for progress display.
    pub fn progress(&self) -> f64 {
        (f64::from(self.round_counter + 2) / f64::from(TERMINAL_ROUND + 1)).clamp(0.0, 1.0)
    }

    /// Returns the session to its initial state. The grade context survives.
    pub fn reset(&mut self) {
        self.round_counter = -1;
        self.turns.clear();
        self.is_complete = false;
        self.pending_record = None;
    }
}

pub fn is_known_grade_level(grade: &str) -> bool {
    GRADE_LEVELS.contains(&grade)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_in_reset_phase() {
        let session = InterviewSession::default();
        assert_eq!(session.round_counter, -1);
        assert_eq!(session.phase(), InterviewPhase::Reset);
        assert_eq!(session.grade_context, DEFAULT_GRADE_CONTEXT);
    }

    #[test]
    fn test_phase_boundaries() {
        let mut session = InterviewSession::default();
        session.round_counter = 0;
        assert_eq!(session.phase(), InterviewPhase::Collecting);
        session.round_counter = 4;
        assert_eq!(session.phase(), InterviewPhase::Collecting);
        session.round_counter = 5;
        assert_eq!(session.phase(), InterviewPhase::Terminal);
        session.is_complete = true;
        assert_eq!(session.phase(), InterviewPhase::Complete);
    }

    #[test]
    fn test_reset_is_idempotent_from_any_state() {
        let mut session = InterviewSession {
            round_counter: 7,
            turns: vec![ConversationTurn::user("hello")],
            is_complete: true,
            pending_record: Some(StructuredRecord {
                grade: "Grade 10".into(),
                title: "Robotics".into(),
                skills: "C".into(),
                summary: "Built a rover".into(),
            }),
            grade_context: "Grade 10".into(),
        };
        session.reset();
        let once = session.clone();
        session.reset();
        assert_eq!(session, once);
        assert_eq!(session.round_counter, -1);
        assert!(session.turns.is_empty());
        assert!(!session.is_complete);
        assert!(session.pending_record.is_none());
        assert_eq!(session.grade_context, "Grade 10");
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut session = InterviewSession::default();
        assert!((session.progress() - 1.0 / 6.0).abs() < 1e-9);
        session.round_counter = 9;
        assert_eq!(session.progress(), 1.0);
    }

    #[test]
    fn test_grade_levels() {
        assert!(is_known_grade_level("University"));
        assert!(!is_known_grade_level("Grade 13"));
    }
}
