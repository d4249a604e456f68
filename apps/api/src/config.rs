use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Built once in `main` and passed by reference; nothing reads the environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub azure_openai_api_key: String,
    pub azure_openai_endpoint: String,
    pub azure_openai_deployment: String,
    pub azure_openai_api_version: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_resumes: usize,
    /// Upper bound on in-flight scoring calls. 1 keeps scoring strictly sequential.
    pub scoring_concurrency: usize,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let scoring_concurrency = optional_env("SCORING_CONCURRENCY", 1usize)?;
        if scoring_concurrency == 0 {
            bail!("SCORING_CONCURRENCY must be at least 1");
        }

        let max_upload_mb = optional_env("MAX_UPLOAD_MB", 25usize)?;

        Ok(Config {
            azure_openai_api_key: require_env("AZURE_OPENAI_API_KEY")?,
            azure_openai_endpoint: require_env("AZURE_OPENAI_ENDPOINT")?,
            azure_openai_deployment: require_env("AZURE_OPENAI_DEPLOYMENT_NAME")?,
            azure_openai_api_version: require_env("AZURE_OPENAI_API_VERSION")?,
            temperature: optional_env("LLM_TEMPERATURE", 0.3f32)?,
            max_tokens: optional_env("LLM_MAX_TOKENS", 500u32)?,
            max_resumes: optional_env("MAX_RESUMES", 10usize)?,
            scoring_concurrency,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            port: optional_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
