//! Career Mentor: stateless single-call persona over grades and portfolio.
//!
//! Mode is chosen by the `ADMIN_MODE` marker in the context string:
//! administrative requests get three fixed sections, everything else gets a
//! conversational mentor answer.

pub mod handlers;
pub mod prompts;
pub mod roadmap;

use std::sync::Arc;

use tracing::warn;

use crate::interview::session::NOT_APPLICABLE;
use crate::llm_client::{CompletionRequest, CompletionService, ConversationTurn, CredentialPool};
use crate::models::activity::ActivityRow;
use crate::models::grade::GradeRow;
use prompts::{
    mentor_prompt, ADMIN_INSTRUCTIONS, MENTOR_OFFLINE_MESSAGE, MENTOR_TEMPERATURE,
    STUDENT_INSTRUCTIONS,
};

pub const ADMIN_MODE_MARKER: &str = "ADMIN_MODE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentorMode {
    Administrative,
    Student,
}

impl MentorMode {
    pub fn from_context(context: &str) -> Self {
        if context.contains(ADMIN_MODE_MARKER) {
            MentorMode::Administrative
        } else {
            MentorMode::Student
        }
    }
}

/// Context string for an administrative insight request.
pub fn admin_context() -> String {
    format!("{ADMIN_MODE_MARKER}: General Administrative Assessment")
}

/// Context string for a student question, carrying prior mentor turns.
pub fn student_context(
    history: &[ConversationTurn],
    question: &str,
    interests: Option<&str>,
) -> String {
    let transcript = history
        .iter()
        .map(|t| format!("{}: {}", t.role.as_str(), t.content))
        .collect::<Vec<_>>()
        .join(" | ");

    let mut context = String::new();
    if let Some(interests) = interests.map(str::trim).filter(|s| !s.is_empty()) {
        context.push_str(&format!("Student interests: {interests}. "));
    }
    context.push_str(&format!(
        "Chat Context: [{transcript}]. User Question: {question}"
    ));
    context
}

/// Renders rows as a fixed-width text table.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "(no records)".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut lines = vec![format_row(headers, &widths)];
    lines.extend(rows.iter().map(|r| {
        let cells: Vec<&str> = r.iter().map(String::as_str).collect();
        format_row(&cells, &widths)
    }));
    lines.join("\n")
}

fn format_row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{cell:<w$}", w = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn render_grades(grades: &[GradeRow]) -> String {
    let rows: Vec<Vec<String>> = grades
        .iter()
        .map(|g| {
            vec![
                g.year.to_string(),
                g.term.clone(),
                g.subject.clone(),
                g.mark.to_string(),
            ]
        })
        .collect();
    render_table(&["year", "term", "subject", "mark"], &rows)
}

pub fn render_portfolio(activities: &[ActivityRow]) -> String {
    let rows: Vec<Vec<String>> = activities
        .iter()
        .map(|a| {
            vec![
                a.date.to_string(),
                a.grade_section.clone().unwrap_or_else(|| NOT_APPLICABLE.to_string()),
                a.title.clone(),
                a.skills.clone(),
                a.summary.clone(),
                a.status.clone(),
            ]
        })
        .collect();
    render_table(
        &["date", "grade", "title", "skills", "summary", "status"],
        &rows,
    )
}

pub fn build_mentor_prompt(
    grades: &[GradeRow],
    activities: &[ActivityRow],
    context: &str,
) -> String {
    let instructions = match MentorMode::from_context(context) {
        MentorMode::Administrative => ADMIN_INSTRUCTIONS,
        MentorMode::Student => STUDENT_INSTRUCTIONS,
    };
    mentor_prompt(
        context,
        &render_grades(grades),
        &render_portfolio(activities),
        instructions,
    )
}

#[derive(Clone)]
pub struct CareerMentor {
    service: Arc<dyn CompletionService>,
    credentials: Arc<CredentialPool>,
}

impl CareerMentor {
    pub fn new(service: Arc<dyn CompletionService>, credentials: Arc<CredentialPool>) -> Self {
        Self {
            service,
            credentials,
        }
    }

    /// One completion for the given records and context. Never fails: an
    /// unavailable provider yields the offline message.
    pub async fn advise(
        &self,
        grades: &[GradeRow],
        activities: &[ActivityRow],
        context: &str,
    ) -> String {
        let prompt = build_mentor_prompt(grades, activities, context);
        let turns = [ConversationTurn::user(prompt)];
        let request = CompletionRequest {
            persona_instruction: "",
            turns: &turns,
            sampling_temperature: MENTOR_TEMPERATURE,
        };

        match self.service.complete(self.credentials.current(), &request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Career mentor completion failed: {e}");
                MENTOR_OFFLINE_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{Scripted, ScriptedCompletionService};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn grade(subject: &str, mark: i32) -> GradeRow {
        GradeRow {
            student_id: "1042".into(),
            year: 2025,
            term: "Term 1".into(),
            subject: subject.into(),
            mark,
        }
    }

    fn activity(title: &str) -> ActivityRow {
        ActivityRow {
            id: Uuid::new_v4(),
            student_id: "1042".into(),
            title: title.into(),
            summary: "Built a sensor rig".into(),
            skills: "Python".into(),
            date: NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
            evidence_path: None,
            grade_section: Some("Grade 10".into()),
            status: "approved".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_mode_follows_marker() {
        assert_eq!(
            MentorMode::from_context(&admin_context()),
            MentorMode::Administrative
        );
        assert_eq!(
            MentorMode::from_context("Chat Context: []. User Question: what next?"),
            MentorMode::Student
        );
    }

    #[test]
    fn test_admin_prompt_requests_three_sections() {
        let prompt = build_mentor_prompt(&[grade("Maths", 88)], &[], &admin_context());
        assert!(prompt.contains("FUTURE PERSPECTIVE"));
        assert!(prompt.contains("AREAS TO IMPROVE"));
        assert!(prompt.contains("HELP NEEDED"));
        assert!(prompt.contains("Maths"));
        assert!(prompt.contains("(no records)"));
    }

    #[test]
    fn test_student_prompt_is_conversational() {
        let context = student_context(&[], "Should I study robotics?", Some("drones"));
        let prompt = build_mentor_prompt(&[], &[activity("Science Fair")], &context);
        assert!(prompt.contains("career mentor"));
        assert!(!prompt.contains("FUTURE PERSPECTIVE"));
        assert!(prompt.contains("Science Fair"));
        assert!(prompt.contains("Student interests: drones."));
    }

    #[test]
    fn test_placeholders_in_student_text_stay_literal() {
        let context = student_context(&[], "What do {grades} and {instructions} mean?", None);
        let prompt = build_mentor_prompt(&[grade("Maths", 88)], &[], &context);
        assert!(prompt.contains("User Question: What do {grades} and {instructions} mean?"));
        assert_eq!(prompt.matches("Maths").count(), 1);
        assert_eq!(prompt.matches("career mentor").count(), 1);
    }

    #[test]
    fn test_student_context_includes_history() {
        let history = vec![
            ConversationTurn::assistant("Ready! Ask me anything about your future path."),
            ConversationTurn::user("I like maths"),
        ];
        let context = student_context(&history, "Which jobs?", None);
        assert_eq!(
            context,
            "Chat Context: [assistant: Ready! Ask me anything about your future path. | user: I like maths]. User Question: Which jobs?"
        );
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let table = render_grades(&[grade("Maths", 88), grade("Art", 9)]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "year  term    subject  mark");
        assert_eq!(lines[1], "2025  Term 1  Maths    88");
        assert_eq!(lines[2], "2025  Term 1  Art      9");
    }

    #[tokio::test]
    async fn test_offline_message_on_failure_without_rotation() {
        let service = Arc::new(ScriptedCompletionService::new(vec![Scripted::Fail]));
        let pool = Arc::new(CredentialPool::new(vec!["k1".into(), "k2".into()]).unwrap());
        let mentor = CareerMentor::new(service.clone(), pool.clone());

        let answer = mentor.advise(&[], &[], "User Question: hi").await;
        assert_eq!(answer, MENTOR_OFFLINE_MESSAGE);
        assert_eq!(pool.current_index(), 0);

        let call = &service.calls()[0];
        assert_eq!(call.temperature, MENTOR_TEMPERATURE);
        assert_eq!(call.turn_count, 1);
    }
}
