//! Axum route handlers for the Ranking API.

use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{extract_text, ExtractionError};
use crate::models::ranking::{RankingResponse, UploadedDocument};
use crate::ranking::ranker::{RankingRun, ResumeText};
use crate::ranking::render::render_markdown;
use crate::state::AppState;

const JD_FIELD: &str = "jd";
const RESUMES_FIELD: &str = "resumes";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    #[serde(default)]
    pub format: OutputFormat,
}

/// The two inputs of a ranking run, as read from the multipart body.
#[derive(Debug, Default)]
struct RankingUpload {
    jd: Option<UploadedDocument>,
    resumes: Vec<UploadedDocument>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/rankings
///
/// Multipart body: one `jd` file and one or more `resumes` files (PDF).
/// Nothing is extracted or scored unless both are present.
pub async fn handle_rank(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_upload(multipart).await?;

    let jd = upload.jd.ok_or_else(|| {
        AppError::Validation(format!(
            "A job description document ('{JD_FIELD}') is required"
        ))
    })?;
    if upload.resumes.is_empty() {
        return Err(AppError::Validation(format!(
            "At least one resume document ('{RESUMES_FIELD}') is required"
        )));
    }
    if upload.resumes.len() > state.config.max_resumes {
        return Err(AppError::Validation(format!(
            "At most {} resumes can be ranked at once, got {}",
            state.config.max_resumes,
            upload.resumes.len()
        )));
    }

    info!(
        "Ranking {} resumes against '{}'",
        upload.resumes.len(),
        jd.name
    );

    let job_description = jd.name.clone();
    let (jd_text, resumes) =
        tokio::task::spawn_blocking(move || extract_documents(&jd, upload.resumes))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

    let run = RankingRun::new(state.scorer.clone(), state.config.scoring_concurrency);
    let results = run.execute(jd_text, resumes).await?;

    let response = RankingResponse {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        job_description,
        results,
    };

    Ok(match query.format {
        OutputFormat::Json => Json(response).into_response(),
        OutputFormat::Markdown => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            render_markdown(&response),
        )
            .into_response(),
    })
}

async fn read_upload(mut multipart: Multipart) -> Result<RankingUpload, AppError> {
    let mut upload = RankingUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name != JD_FIELD && field_name != RESUMES_FIELD {
            debug!("Ignoring multipart field '{field_name}'");
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let data = field.bytes().await.map_err(|e| {
            AppError::Validation(format!("Failed to read '{field_name}' upload: {e}"))
        })?;

        // Browsers send an empty, unnamed part for a file input left blank.
        if data.is_empty() && file_name.is_none() {
            continue;
        }

        let document = UploadedDocument {
            name: file_name.unwrap_or_else(|| field_name.clone()),
            data,
        };

        if field_name == JD_FIELD {
            if upload.jd.is_some() {
                return Err(AppError::Validation(
                    "Exactly one job description document is accepted".to_string(),
                ));
            }
            upload.jd = Some(document);
        } else {
            upload.resumes.push(document);
        }
    }

    Ok(upload)
}

/// Extracts the JD and every resume, in upload order.
fn extract_documents(
    jd: &UploadedDocument,
    resumes: Vec<UploadedDocument>,
) -> Result<(String, Vec<ResumeText>), ExtractionError> {
    let jd_text = extract_text(&jd.name, &jd.data)?;

    let resumes = resumes
        .into_iter()
        .map(|doc| {
            let text = extract_text(&doc.name, &doc.data)?;
            Ok(ResumeText {
                name: doc.name,
                text,
            })
        })
        .collect::<Result<Vec<_>, ExtractionError>>()?;

    Ok((jd_text, resumes))
}
