// Prompt constants for resume scoring.
// The first reply line must stay `Score: <n>/100`; `scoring::parse_score` reads exactly that line.

/// Scoring prompt template. Replace `{jd}` and `{resume}` before sending.
pub const SCORING_PROMPT_TEMPLATE: &str = r#"You are a recruiter. Based on the following job description (JD) and candidate resume,
rate the resume's match with the JD on a scale from 0 to 100, and justify the score.

JD:
{jd}

Resume:
{resume}

Return output in the format:
Score: <score>/100
Justification: <one short paragraph>"#;
