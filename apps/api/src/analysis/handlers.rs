use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::analysis::models::{AnalysisResult, CandidateRecord, UploadedDocument};
use crate::analysis::pipeline::analyze_document;
use crate::errors::AppError;
use crate::leaderboard::{self, Leaderboard};
use crate::state::AppState;

/// Multipart field name the operator UI uploads under.
const UPLOAD_FIELD: &str = "resume";

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: AnalysisResult,
}

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let doc = read_upload(&mut multipart)
        .await?
        .ok_or(AppError::UploadMissing)?;

    let invoker = state
        .invoker
        .clone()
        .ok_or(AppError::ConfigurationMissing)?;

    let analysis = analyze_document(
        doc,
        invoker.as_ref(),
        state.backup.clone(),
        state.config.analysis_options(),
    )
    .await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis,
    }))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Option<UploadedDocument>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidUpload(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("resume.pdf").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/pdf")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidUpload(e.to_string()))?;
        return Ok(Some(UploadedDocument {
            bytes,
            content_type,
            filename,
        }));
    }
    Ok(None)
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardRequest {
    pub analysis: Vec<CandidateRecord>,
    #[serde(default)]
    pub top_n: Option<usize>,
}

/// POST /api/v1/leaderboard
/// Re-ranks an existing analysis under a new top-N bound without
/// re-running the pipeline.
pub async fn handle_leaderboard(Json(req): Json<LeaderboardRequest>) -> Json<Leaderboard> {
    Json(leaderboard::rank(&req.analysis, req.top_n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leaderboard_request_top_n_defaults_to_none() {
        let req: LeaderboardRequest = serde_json::from_value(json!({
            "analysis": [{"name": "A", "score": 50}]
        }))
        .unwrap();
        assert_eq!(req.top_n, None);
        assert_eq!(req.analysis.len(), 1);
    }

    #[test]
    fn test_analyze_response_shape() {
        let response = AnalyzeResponse {
            success: true,
            analysis: vec![],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert!(value["analysis"].as_array().unwrap().is_empty());
    }
}
