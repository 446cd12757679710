use anyhow::{Context, Result};

use crate::analysis::parse::RecordPolicy;
use crate::analysis::pipeline::AnalysisOptions;
use crate::analysis::prompts::DEFAULT_PROMPT_CHAR_CAP;
use crate::llm_client::DEFAULT_MODEL;

/// Application configuration loaded from environment variables.
///
/// The model credential and the backup-store group are optional: the server
/// boots without them. A missing credential fails analysis requests at
/// request time; a missing backup group just disables archival.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub model_max_retries: u32,
    pub prompt_char_cap: usize,
    pub record_policy: RecordPolicy,
    pub backup: Option<BackupConfig>,
}

/// S3 (or S3-compatible, e.g. MinIO) settings for the backup store.
/// All-or-nothing: the store is enabled only when every variable is set.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            model_max_retries: std::env::var("MODEL_MAX_RETRIES")
                .unwrap_or_else(|_| "0".to_string())
                .parse::<u32>()
                .context("MODEL_MAX_RETRIES must be a non-negative integer")?,
            prompt_char_cap: std::env::var("PROMPT_CHAR_CAP")
                .unwrap_or_else(|_| DEFAULT_PROMPT_CHAR_CAP.to_string())
                .parse::<usize>()
                .context("PROMPT_CHAR_CAP must be a positive integer")?,
            record_policy: parse_record_policy(optional_env("RECORD_POLICY").as_deref()),
            backup: BackupConfig::from_env(),
        })
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            prompt_char_cap: self.prompt_char_cap,
            record_policy: self.record_policy,
        }
    }
}

impl BackupConfig {
    fn from_env() -> Option<Self> {
        Some(BackupConfig {
            s3_bucket: optional_env("S3_BUCKET")?,
            s3_endpoint: optional_env("S3_ENDPOINT")?,
            aws_access_key_id: optional_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY")?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_record_policy(value: Option<&str>) -> RecordPolicy {
    match value {
        Some("reject-batch") => RecordPolicy::RejectBatch,
        _ => RecordPolicy::DropInvalid,
    }
}
