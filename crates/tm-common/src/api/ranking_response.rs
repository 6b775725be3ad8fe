use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    matching::{MatchScore, MismatchKind, PlatformScore, RankedCandidate},
    shortlist::MaterializedShortlist,
};

/// One ranked therapist as returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidateResponse {
    pub candidate_id: String,
    /// 1-based position in the ranking
    pub rank: usize,
    pub match_score: f64,
    pub platform_score: f64,
    pub total_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_perfect: Option<bool>,
    pub mismatch_reasons: Vec<MismatchKind>,
    pub has_compatible_slot: bool,
    /// Photo, approach text and a structured bio are all filled in.
    pub profile_complete: bool,
    pub platform_breakdown: PlatformScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_breakdown: Option<MatchScore>,
}

impl RankedCandidateResponse {
    pub fn from_ranked(rank: usize, ranked: &RankedCandidate) -> Self {
        Self {
            candidate_id: ranked.candidate.id.clone(),
            rank,
            match_score: ranked.score.match_score,
            platform_score: ranked.score.platform_score,
            total_score: ranked.score.total_score,
            is_perfect: ranked.mismatches.as_ref().map(|m| m.is_perfect),
            mismatch_reasons: ranked
                .mismatches
                .as_ref()
                .map(|m| m.reasons.clone())
                .unwrap_or_default(),
            has_compatible_slot: ranked.has_compatible_slot,
            profile_complete: ranked.candidate.profile_completion(),
            platform_breakdown: ranked.platform_breakdown.clone(),
            match_breakdown: ranked.match_breakdown.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShortlistEntryResponse {
    pub candidate_id: String,
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShortlistResponse {
    pub access_token: String,
    pub reused: bool,
    pub match_run_id: String,
    pub entries: Vec<ShortlistEntryResponse>,
}

impl From<&MaterializedShortlist> for ShortlistResponse {
    fn from(materialized: &MaterializedShortlist) -> Self {
        let shortlist = &materialized.shortlist;
        Self {
            access_token: shortlist.access_token.clone(),
            reused: materialized.reused,
            match_run_id: shortlist.match_run_id.clone(),
            entries: shortlist
                .entries
                .iter()
                .map(|e| ShortlistEntryResponse {
                    candidate_id: e.candidate_id.clone(),
                    rank: e.rank,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingResponse {
    pub mode: String,
    pub match_run_id: String,
    pub generated_at: DateTime<Utc>,
    pub pool_size: usize,
    pub candidates: Vec<RankedCandidateResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortlist: Option<ShortlistResponse>,
}

impl RankingResponse {
    pub fn new(mode: &str, match_run_id: &str, pool_size: usize, ranked: &[RankedCandidate]) -> Self {
        Self {
            mode: mode.to_string(),
            match_run_id: match_run_id.to_string(),
            generated_at: Utc::now(),
            pool_size,
            candidates: ranked
                .iter()
                .enumerate()
                .map(|(idx, r)| RankedCandidateResponse::from_ranked(idx + 1, r))
                .collect(),
            shortlist: None,
        }
    }
}
