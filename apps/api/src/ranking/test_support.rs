use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::LlmError;
use crate::ranking::scoring::ResumeScorer;

/// A scorer that replies from a table keyed by a marker found in the resume text.
/// Resumes containing `FAIL` get a quota error. Every call is counted.
#[derive(Default)]
pub struct ScriptedScorer {
    replies: HashMap<String, (String, Duration)>,
    calls: AtomicUsize,
}

impl ScriptedScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, marker: &str, completion: &str) -> Self {
        self.replies
            .insert(marker.to_string(), (completion.to_string(), Duration::ZERO));
        self
    }

    /// Like `reply`, but the completion only arrives after `delay`.
    pub fn delayed_reply(mut self, marker: &str, completion: &str, delay: Duration) -> Self {
        self.replies
            .insert(marker.to_string(), (completion.to_string(), delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResumeScorer for ScriptedScorer {
    async fn score(&self, _jd_text: &str, resume_text: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if resume_text.contains("FAIL") {
            return Err(LlmError::Api {
                status: 429,
                message: "quota exceeded".to_string(),
            });
        }

        let (completion, delay) = self
            .replies
            .iter()
            .find(|(marker, _)| resume_text.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| ("I cannot score this.".to_string(), Duration::ZERO));

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(completion)
    }
}

/// Serves `body` as every chat-completions response on a local port and returns the
/// endpoint base URL.
pub async fn stub_deployment(body: serde_json::Value) -> String {
    use axum::{routing::post, Json, Router};

    let app = Router::new().route(
        "/openai/deployments/:deployment/chat/completions",
        post(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
