//! Ranker: scores every resume, then orders them by score.
//!
//! Ranking happens only once every resume has a score. The first scoring failure aborts the
//! run and everything scored so far is dropped.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::ranking::{RankedResume, ScoredResult};
use crate::ranking::scoring::{parse_score, ResumeScorer};

/// Extracted text of one resume, ready for scoring.
#[derive(Debug, Clone)]
pub struct ResumeText {
    pub name: String,
    pub text: String,
}

/// One ranking pass over a set of resumes.
pub struct RankingRun {
    scorer: Arc<dyn ResumeScorer>,
    /// Maximum scoring calls in flight. 1 scores strictly in upload order.
    concurrency: usize,
}

impl RankingRun {
    pub fn new(scorer: Arc<dyn ResumeScorer>, concurrency: usize) -> Self {
        Self {
            scorer,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn execute(
        &self,
        jd_text: String,
        resumes: Vec<ResumeText>,
    ) -> Result<Vec<RankedResume>, AppError> {
        let total = resumes.len();
        let scored = if self.concurrency == 1 || total <= 1 {
            self.score_sequential(&jd_text, resumes).await?
        } else {
            self.score_concurrent(Arc::from(jd_text), resumes).await?
        };

        let ranked = rank_results(scored);
        if let Some(top) = ranked.first() {
            info!(
                "Ranked {total} resumes; top: '{}' ({}/100)",
                top.name, top.score
            );
        }
        Ok(ranked)
    }

    async fn score_sequential(
        &self,
        jd_text: &str,
        resumes: Vec<ResumeText>,
    ) -> Result<Vec<ScoredResult>, AppError> {
        let mut scored = Vec::with_capacity(resumes.len());
        for resume in resumes {
            scored.push(score_one(self.scorer.as_ref(), jd_text, resume).await?);
        }
        Ok(scored)
    }

    /// Bounded worker pool. Results are put back in upload order so ties rank the same
    /// as in sequential mode. Returning early drops the `JoinSet`, which aborts the rest.
    async fn score_concurrent(
        &self,
        jd_text: Arc<str>,
        resumes: Vec<ResumeText>,
    ) -> Result<Vec<ScoredResult>, AppError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut slots: Vec<Option<ScoredResult>> = vec![None; resumes.len()];
        let mut tasks = JoinSet::new();

        for (index, resume) in resumes.into_iter().enumerate() {
            let scorer = Arc::clone(&self.scorer);
            let jd_text = Arc::clone(&jd_text);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Internal(e.into()))?;
                let result = score_one(scorer.as_ref(), &jd_text, resume).await?;
                Ok::<_, AppError>((index, result))
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| AppError::Internal(e.into()))??;
            slots[index] = Some(result);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

async fn score_one(
    scorer: &dyn ResumeScorer,
    jd_text: &str,
    resume: ResumeText,
) -> Result<ScoredResult, AppError> {
    let completion = scorer.score(jd_text, &resume.text).await?;
    let parsed = parse_score(&completion);

    if !parsed.is_parsed() {
        let first_line = completion.lines().next().unwrap_or_default();
        warn!(
            "Could not read a score for '{}' from {first_line:?}; ranking it as 0",
            resume.name
        );
    }
    info!("Scored '{}': {}", resume.name, parsed.value());

    Ok(ScoredResult {
        name: resume.name,
        score: parsed.value(),
        score_parsed: parsed.is_parsed(),
        justification: completion,
    })
}

/// Orders results by score, highest first. Equal scores keep their encounter order.
pub fn rank_results(mut results: Vec<ScoredResult>) -> Vec<RankedResume> {
    // sort_by is stable
    results.sort_by(|a, b| b.score.cmp(&a.score));

    results
        .into_iter()
        .enumerate()
        .map(|(i, r)| RankedResume {
            rank: i + 1,
            name: r.name,
            score: r.score,
            score_parsed: r.score_parsed,
            justification: r.justification,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
