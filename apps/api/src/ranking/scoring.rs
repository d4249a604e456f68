//! Scoring: one LLM call per (JD, resume) pair, plus recovery of the score from the reply.
//!
//! `AppState` holds an `Arc<dyn ResumeScorer>`; `LlmResumeScorer` is the production backend.

use std::num::IntErrorKind;

use async_trait::async_trait;

use crate::llm_client::{LlmClient, LlmError};
use crate::ranking::prompts::SCORING_PROMPT_TEMPLATE;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Produces the raw model completion for one resume against one job description.
/// Errors are not recovered by callers: a failed call aborts the whole ranking run.
#[async_trait]
pub trait ResumeScorer: Send + Sync {
    async fn score(&self, jd_text: &str, resume_text: &str) -> Result<String, LlmError>;
}

/// Scores through the configured Azure OpenAI deployment.
pub struct LlmResumeScorer(pub LlmClient);

#[async_trait]
impl ResumeScorer for LlmResumeScorer {
    async fn score(&self, jd_text: &str, resume_text: &str) -> Result<String, LlmError> {
        let prompt = build_scoring_prompt(jd_text, resume_text);
        self.0.complete(&prompt).await
    }
}

/// Fills the scoring template. Placeholders are substituted in a single pass, so
/// document text that happens to contain `{jd}` or `{resume}` is left alone.
pub fn build_scoring_prompt(jd_text: &str, resume_text: &str) -> String {
    let mut prompt = String::with_capacity(
        SCORING_PROMPT_TEMPLATE.len() + jd_text.len() + resume_text.len(),
    );
    let mut rest = SCORING_PROMPT_TEMPLATE;

    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{jd}") {
            prompt.push_str(jd_text);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{resume}") {
            prompt.push_str(resume_text);
            rest = after;
        } else {
            prompt.push('{');
            rest = &tail[1..];
        }
    }
    prompt.push_str(rest);
    prompt
}

// ────────────────────────────────────────────────────────────────────────────
// Score parsing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedScore {
    Parsed(i64),
    /// The first line did not carry a readable score; ranks as 0.
    Unparsed,
}

impl ParsedScore {
    pub fn value(self) -> i64 {
        match self {
            ParsedScore::Parsed(v) => v,
            ParsedScore::Unparsed => 0,
        }
    }

    pub fn is_parsed(self) -> bool {
        matches!(self, ParsedScore::Parsed(_))
    }
}

/// Reads the score from the first line of a completion shaped `Score: <n>/100`.
///
/// Takes the text between the first and second colon, drops whitespace and any `/100`,
/// and parses a signed integer. The value is not range checked; digits beyond the `i64`
/// range saturate to `i64::MAX` or `i64::MIN`.
pub fn parse_score(completion: &str) -> ParsedScore {
    let first_line = completion.split('\n').next().unwrap_or_default();

    let Some(field) = first_line.split(':').nth(1) else {
        return ParsedScore::Unparsed;
    };

    let number = field.trim().replace("/100", "");
    match number.trim().parse::<i64>() {
        Ok(v) => ParsedScore::Parsed(v),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => ParsedScore::Parsed(i64::MAX),
            IntErrorKind::NegOverflow => ParsedScore::Parsed(i64::MIN),
            _ => ParsedScore::Unparsed,
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_score_line() {
        assert_eq!(parse_score("Score: 87/100"), ParsedScore::Parsed(87));
    }

    #[test]
    fn test_score_with_justification_below() {
        let reply = "Score: 72/100\nJustification: Solid Rust background, little Kubernetes.";
        assert_eq!(parse_score(reply).value(), 72);
    }

    #[test]
    fn test_not_applicable_defaults_to_zero() {
        let parsed = parse_score("Score: N/A\nJustification: The resume is empty.");
        assert_eq!(parsed, ParsedScore::Unparsed);
        assert_eq!(parsed.value(), 0);
        assert!(!parsed.is_parsed());
    }

    #[test]
    fn test_missing_colon_defaults_to_zero() {
        assert_eq!(parse_score("Score 87/100").value(), 0);
        assert_eq!(parse_score("").value(), 0);
    }

    #[test]
    fn test_out_of_range_is_not_clamped() {
        assert_eq!(parse_score("Score: 150/100"), ParsedScore::Parsed(150));
        assert_eq!(parse_score("Score: -5/100"), ParsedScore::Parsed(-5));
    }

    #[test]
    fn test_overflowing_digits_saturate() {
        assert_eq!(
            parse_score("Score: 99999999999999999999/100"),
            ParsedScore::Parsed(i64::MAX)
        );
        assert_eq!(
            parse_score("Score: -99999999999999999999/100"),
            ParsedScore::Parsed(i64::MIN)
        );
    }

    #[test]
    fn test_only_first_line_is_read() {
        let reply = "Here is my assessment.\nScore: 90/100";
        assert_eq!(parse_score(reply), ParsedScore::Unparsed);
    }

    #[test]
    fn test_whitespace_and_crlf_tolerated() {
        assert_eq!(parse_score("Score:   64 /100\r\nJustification: ok"), ParsedScore::Parsed(64));
        assert_eq!(parse_score("  Score:55"), ParsedScore::Parsed(55));
    }

    #[test]
    fn test_segment_stops_at_second_colon() {
        assert_eq!(parse_score("Score: 81/100: strong match"), ParsedScore::Parsed(81));
    }

    #[test]
    fn test_markdown_emphasis_defaults_to_zero() {
        assert_eq!(parse_score("**Score:** 88/100").value(), 0);
    }

    #[test]
    fn test_decimal_defaults_to_zero() {
        assert_eq!(parse_score("Score: 87.5/100").value(), 0);
    }

    #[test]
    fn test_prompt_contains_both_documents() {
        let prompt = build_scoring_prompt("Senior Rust Engineer", "Ten years of Rust");
        assert!(prompt.contains("JD:\nSenior Rust Engineer"));
        assert!(prompt.contains("Resume:\nTen years of Rust"));
        assert!(prompt.contains("Score: <score>/100"));
        assert!(!prompt.contains("{jd}"));
        assert!(!prompt.contains("{resume}"));
    }

    #[test]
    fn test_prompt_does_not_expand_placeholders_inside_documents() {
        let prompt = build_scoring_prompt("uses {resume} templating", "writes {jd} parsers");
        assert!(prompt.contains("uses {resume} templating"));
        assert!(prompt.contains("writes {jd} parsers"));
    }
}
