use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded file, held only until its text has been extracted.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub data: Bytes,
}

/// One resume after its scoring call returned. `justification` is the raw completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub name: String,
    pub score: i64, // not clamped to 0..=100
    /// False when the completion's first line could not be parsed and `score` fell back to 0.
    pub score_parsed: bool,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResume {
    pub rank: usize, // 1-based
    pub name: String,
    pub score: i64,
    pub score_parsed: bool,
    pub justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingResponse {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub job_description: String,
    pub results: Vec<RankedResume>,
}
