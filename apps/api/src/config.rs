use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::llm_client::{gemini, groq};

/// Where uploaded evidence is written.
#[derive(Debug, Clone)]
pub enum EvidenceBackend {
    Local {
        dir: PathBuf,
    },
    S3 {
        bucket: String,
        endpoint: String,
        access_key_id: String,
        secret_access_key: String,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Sessions are kept in process memory when unset.
    pub redis_url: Option<String>,
    pub session_ttl_secs: u64,
    pub groq_api_keys: Vec<String>,
    pub groq_base_url: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub evidence: EvidenceBackend,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let groq_api_keys = parse_key_list(&require_env("GROQ_API_KEYS")?);
        if groq_api_keys.is_empty() {
            anyhow::bail!("GROQ_API_KEYS must contain at least one non-empty key");
        }

        let evidence = match optional_env("S3_BUCKET") {
            Some(bucket) => EvidenceBackend::S3 {
                bucket,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            },
            None => EvidenceBackend::Local {
                dir: optional_env("EVIDENCE_DIR")
                    .unwrap_or_else(|| "student_evidence".to_string())
                    .into(),
            },
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: optional_env("REDIS_URL"),
            session_ttl_secs: optional_env("SESSION_TTL_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("SESSION_TTL_SECS must be a whole number of seconds")?
                .unwrap_or(86_400),
            groq_api_keys,
            groq_base_url: optional_env("GROQ_BASE_URL")
                .unwrap_or_else(|| groq::DEFAULT_BASE_URL.to_string()),
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_base_url: optional_env("GEMINI_BASE_URL")
                .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string()),
            evidence,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Splits a comma-separated key list, dropping blank entries.
fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}
