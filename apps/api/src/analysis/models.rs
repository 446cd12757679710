//! Wire types for the analysis pipeline.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One extracted candidate with the model's estimated job-fit score.
///
/// Invariant: `score` is always present and within 0..=100 once a record has
/// passed validation. Every other field defaults when the model omits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    #[serde(default)]
    pub name: String,
    /// Model-reported order, duplicates kept as-is.
    #[serde(default)]
    pub skills: Vec<String>,
    /// The model is prompted for `experience`; some responses spell it out
    /// as `experienceYears`. Both are accepted.
    #[serde(
        default,
        alias = "experience",
        skip_serializing_if = "Option::is_none"
    )]
    pub experience_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    pub score: u8,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub summary: String,
}

/// Validated output of one pipeline run. Producer order carries no ranking
/// meaning; the leaderboard sorts downstream.
pub type AnalysisResult = Vec<CandidateRecord>;

/// The uploaded file as received. Lives only for the duration of one
/// analysis request and is never persisted by the pipeline itself.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub bytes: Bytes,
    pub content_type: String,
    pub filename: String,
}
