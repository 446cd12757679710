//! Response Validator/Parser — defensive parsing of the model's output.
//!
//! The model is an untrusted black box: it may fence its JSON in markdown,
//! return a single object instead of an array, or emit records that violate
//! the score invariant. Syntactic failure rejects the whole response;
//! per-record failure is handled according to `RecordPolicy`.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::analysis::models::CandidateRecord;

/// What to do with records that fail validation when the response as a
/// whole parsed fine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordPolicy {
    /// Keep valid records, drop and log invalid ones. A partial batch is
    /// more useful to a screener than none.
    #[default]
    DropInvalid,
    /// Any invalid record fails the whole batch.
    RejectBatch,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("model response is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("model response is not a candidate object or array")]
    NotACandidateList,

    #[error("invalid candidate record: {0}")]
    InvalidRecord(String),

    #[error("no valid candidate records in model response ({dropped} dropped)")]
    NoValidRecords { dropped: usize },
}

/// Parses the raw model response into validated candidate records.
///
/// Steps: strip markdown code fences, parse as JSON, coerce a single object
/// into a one-element array, then validate each element. Zero surviving
/// records is an error regardless of policy.
pub fn parse_candidates(
    raw: &str,
    policy: RecordPolicy,
) -> Result<Vec<CandidateRecord>, SchemaError> {
    let body = strip_code_fences(raw);
    let value: Value = serde_json::from_str(body)?;

    let elements = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => return Err(SchemaError::NotACandidateList),
    };

    let total = elements.len();
    let mut records = Vec::with_capacity(total);
    for element in elements {
        match validate_record(element) {
            Ok(record) => records.push(record),
            Err(reason) => match policy {
                RecordPolicy::RejectBatch => return Err(SchemaError::InvalidRecord(reason)),
                RecordPolicy::DropInvalid => {
                    warn!("dropping candidate record: {reason}");
                }
            },
        }
    }

    if records.is_empty() {
        return Err(SchemaError::NoValidRecords { dropped: total });
    }
    Ok(records)
}

/// Builds a record from one JSON element. Only the score invariant rejects:
/// every other field is taken on a best-effort basis and defaults when the
/// model got its type wrong.
fn validate_record(element: Value) -> Result<CandidateRecord, String> {
    let obj = match element.as_object() {
        Some(obj) => obj,
        None => return Err(format!("candidate entry is not an object: {element}")),
    };

    let score = obj.get("score").ok_or("score is missing")?;
    let score = score
        .as_u64()
        .ok_or_else(|| format!("score {score} is not a non-negative integer"))?;
    if score > 100 {
        return Err(format!("score {score} out of range 0-100"));
    }

    Ok(CandidateRecord {
        name: string_field(obj, "name"),
        skills: obj
            .get("skills")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        experience_years: obj
            .get("experienceYears")
            .or_else(|| obj.get("experience"))
            .and_then(Value::as_u64)
            .map(|years| years as u32),
        education: obj
            .get("education")
            .and_then(Value::as_str)
            .map(String::from),
        score: score as u8,
        role: string_field(obj, "role"),
        summary: string_field(obj, "summary"),
    })
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Strips a leading/trailing markdown code fence, with or without a
/// language tag, from the model output.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Everything up to the first newline is the fence line (language tag).
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    match rest.trim_end().strip_suffix("```") {
        Some(inner) => inner.trim(),
        None => rest.trim(),
    }
}
