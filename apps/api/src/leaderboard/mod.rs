//! Leaderboard Engine — pure ranking over validated candidate records.
//!
//! Deterministic and side-effect free: stable sort by score descending,
//! operator-bounded top-N, and fixed-threshold banding for the chart.

use serde::{Deserialize, Serialize};

use crate::analysis::models::CandidateRecord;

/// Presentation band for a score. Drives chart colors only, never ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Mid,
    Low,
}

impl ScoreBand {
    /// score >= 80 → High, 60..=79 → Mid, < 60 → Low.
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            ScoreBand::High
        } else if score >= 60 {
            ScoreBand::Mid
        } else {
            ScoreBand::Low
        }
    }
}

/// One row of the ranked view. Rank is 1-based.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub band: ScoreBand,
    #[serde(flatten)]
    pub record: CandidateRecord,
}

/// Chart-ready series in ranked order: one label/score/band per candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub scores: Vec<u8>,
    pub bands: Vec<ScoreBand>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    /// Records in the analysis before the top-N cut.
    pub total: usize,
    /// Effective bound after clamping.
    pub top_n: usize,
    pub entries: Vec<RankedCandidate>,
    /// Absent when the leaderboard is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSeries>,
}

/// Clamps the operator-requested top-N to `[1, len]`; an empty analysis has
/// no meaningful bound and yields 0. `None` means "show everything".
pub fn clamp_top_n(requested: Option<usize>, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    requested.unwrap_or(len).clamp(1, len)
}

/// Ranks candidates by score descending and derives the chart series.
///
/// The sort is stable: records with equal scores keep their input order, so
/// identical analyses always render identically.
pub fn rank(records: &[CandidateRecord], requested_top_n: Option<usize>) -> Leaderboard {
    let top_n = clamp_top_n(requested_top_n, records.len());

    let mut sorted: Vec<&CandidateRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));
    sorted.truncate(top_n);

    let entries: Vec<RankedCandidate> = sorted
        .into_iter()
        .enumerate()
        .map(|(idx, record)| RankedCandidate {
            rank: idx + 1,
            band: ScoreBand::from_score(record.score),
            record: record.clone(),
        })
        .collect();

    let chart = if entries.is_empty() {
        None
    } else {
        Some(ChartSeries {
            labels: entries.iter().map(|e| e.record.name.clone()).collect(),
            scores: entries.iter().map(|e| e.record.score).collect(),
            bands: entries.iter().map(|e| e.band).collect(),
        })
    };

    Leaderboard {
        total: records.len(),
        top_n,
        entries,
        chart,
    }
}
