// Career mentor and roadmap advisor prompt templates.

/// Single-pass formatting, so braces inside student text are never expanded.
pub fn mentor_prompt(context: &str, grades: &str, portfolio: &str, instructions: &str) -> String {
    format!(
        "CONTEXT: {context}\n\nGRADES:\n{grades}\n\nPORTFOLIO:\n{portfolio}\n\n{instructions}"
    )
}

pub const ADMIN_INSTRUCTIONS: &str = "\
This is an administrative assessment. Provide exactly three sections and nothing else:
🔭 FUTURE PERSPECTIVE: the career trajectory this student is naturally moving toward.
🎯 AREAS TO IMPROVE: gaps visible in the grades or the portfolio.
🆘 HELP NEEDED: where teachers or parents should step in to support the student.";

pub const STUDENT_INSTRUCTIONS: &str = "\
Answer the student's question as a friendly career mentor. \
Be specific about job roles and the skills that lead to them, and ground your answer in the records above.";

pub const MENTOR_TEMPERATURE: f32 = 0.6;

pub const MENTOR_OFFLINE_MESSAGE: &str = "Mentor is currently offline. Please try again in a moment.";

pub fn roadmap_prompt(grades: &str, portfolio: &str) -> String {
    format!(
        "Analyze the following student data and provide a Career Roadmap.

Academic Performance:
{grades}

Extracurricular Activities:
{portfolio}

Identify:
1. Primary Strength (e.g. Technical, Creative, Leadership).
2. Three recommended career paths.
3. A 'Skill Gap' analysis (what they should learn next)."
    )
}

pub const ROADMAP_TEMPERATURE: f32 = 0.5;
