//! Analysis Orchestrator — runs one upload through the pipeline stages.
//!
//! Stages are strictly sequential: Extracting → Prompting → Invoking →
//! Validating. The first failure short-circuits the rest and carries its
//! stage tag up to the error mapping. The backup upload is the only
//! off-path work: dispatched before extraction, detached, never awaited.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::extract::{self, ExtractionError};
use crate::analysis::models::{AnalysisResult, UploadedDocument};
use crate::analysis::parse::{self, RecordPolicy, SchemaError};
use crate::analysis::prompts::{self, DEFAULT_PROMPT_CHAR_CAP};
use crate::llm_client::{InvocationError, ModelInvoker};
use crate::storage::BackupStore;

/// Pipeline stage, used to tag failures for diagnostics and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Prompting,
    Invoking,
    Validating,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extracting => "extracting",
            Stage::Prompting => "prompting",
            Stage::Invoking => "invoking",
            Stage::Validating => "validating",
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("model invocation failed: {0}")]
    Invocation(#[from] InvocationError),

    #[error("model response rejected: {0}")]
    Schema(#[from] SchemaError),
}

impl AnalysisError {
    pub fn stage(&self) -> Stage {
        match self {
            AnalysisError::Extraction(_) => Stage::Extracting,
            AnalysisError::Invocation(_) => Stage::Invoking,
            AnalysisError::Schema(_) => Stage::Validating,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    pub prompt_char_cap: usize,
    pub record_policy: RecordPolicy,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            prompt_char_cap: DEFAULT_PROMPT_CHAR_CAP,
            record_policy: RecordPolicy::default(),
        }
    }
}

/// Runs the full pipeline for one uploaded document.
///
/// A failed extraction never reaches the invoker. The backup write runs in
/// its own task; its outcome is logged inside `BackupStore` and cannot fail
/// the request.
pub async fn analyze_document(
    doc: UploadedDocument,
    invoker: &dyn ModelInvoker,
    backup: Option<Arc<BackupStore>>,
    opts: AnalysisOptions,
) -> Result<AnalysisResult, AnalysisError> {
    if let Some(store) = backup {
        let copy = doc.clone();
        tokio::spawn(async move {
            store.put(&copy).await;
        });
    }

    debug!(stage = Stage::Extracting.as_str(), filename = %doc.filename);
    let text = extract::extract_text(&doc.bytes)?;
    debug!("extracted {} chars from {}", text.len(), doc.filename);

    analyze_text(&text, invoker, opts).await
}

/// Model-facing stages: prompt build, invocation, validation. Split out so
/// the sequence is testable with a stub invoker and no PDF fixture.
pub async fn analyze_text(
    text: &str,
    invoker: &dyn ModelInvoker,
    opts: AnalysisOptions,
) -> Result<AnalysisResult, AnalysisError> {
    debug!(stage = Stage::Prompting.as_str());
    let prompt = prompts::build_analysis_prompt(text, opts.prompt_char_cap);

    debug!(stage = Stage::Invoking.as_str());
    let raw = invoker.invoke(&prompt).await?;

    debug!(stage = Stage::Validating.as_str());
    let records = parse::parse_candidates(&raw, opts.record_policy)?;

    info!("analysis produced {} candidate record(s)", records.len());
    Ok(records)
}
