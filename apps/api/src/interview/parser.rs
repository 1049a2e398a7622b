//! Terminal payload parsing.
//!
//! Wire format, emitted by the summarizing persona on a single line:
//!
//! ```text
//! SAVE_DATA: [Grade] | [Project Title] | [Key Skills] | [Detailed Summary]
//! ```
//!
//! The first segment is discarded; the grade comes from the session's grade
//! context instead.

use thiserror::Error;

use super::session::StructuredRecord;

pub const SENTINEL: &str = "SAVE_DATA";

const MIN_SEGMENTS: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("completion carries no SAVE_DATA payload")]
    MissingSentinel,

    #[error("terminal payload has {found} fields, expected at least 4")]
    TooFewSegments { found: usize },
}

pub fn contains_sentinel(text: &str) -> bool {
    text.contains(SENTINEL)
}

/// Parses the payload following the first sentinel occurrence.
pub fn parse_terminal_payload(text: &str, grade: &str) -> Result<StructuredRecord, ParseError> {
    let payload = text
        .split(SENTINEL)
        .nth(1)
        .ok_or(ParseError::MissingSentinel)?
        .trim_matches(|c: char| c == ':' || c.is_whitespace());

    let segments: Vec<&str> = payload.split('|').map(str::trim).collect();
    if segments.len() < MIN_SEGMENTS {
        return Err(ParseError::TooFewSegments {
            found: segments.len(),
        });
    }

    Ok(StructuredRecord {
        grade: grade.to_string(),
        title: segments[1].to_string(),
        skills: segments[2].to_string(),
        summary: segments[3].to_string(),
    })
}

/// The persona's one-sentence summary preceding the payload.
pub fn closing_statement(text: &str) -> &str {
    text.split(SENTINEL).next().unwrap_or_default().trim()
}
