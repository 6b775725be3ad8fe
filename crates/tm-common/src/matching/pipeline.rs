use std::{cmp::Ordering, collections::HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use super::{
    eligibility::filter_eligible,
    mismatch::{MismatchResult, compute_mismatches},
    platform::{PlatformScore, PlatformScorer},
    scoring::{MatchScore, MatchScorer},
    slots::{DEFAULT_LOOKAHEAD_DAYS, MAX_LOOKAHEAD_DAYS, has_compatible_slot},
    weights::{MATCH_POINTS, MATCH_SCORE_WEIGHT, MatchPoints, PLATFORM_POINTS, PlatformPoints},
};
use crate::{Availability, CandidateProfile, PatientPreferences};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub match_score: f64,
    pub platform_score: f64,
    pub total_score: f64,
}

impl ScoreBreakdown {
    pub fn new(match_score: f64, platform_score: f64, match_weight: f64) -> Self {
        Self {
            match_score,
            platform_score,
            total_score: match_score * match_weight + platform_score,
        }
    }

    /// Directory listings have no patient; the platform score is the total.
    pub fn platform_only(platform_score: f64) -> Self {
        Self {
            match_score: 0.0,
            platform_score,
            total_score: platform_score,
        }
    }
}

/// `match_score * 1.5 + platform_score`
pub fn total_score(match_score: f64, platform_score: f64) -> f64 {
    ScoreBreakdown::new(match_score, platform_score, MATCH_SCORE_WEIGHT).total_score
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub candidate: CandidateProfile,
    pub score: ScoreBreakdown,
    pub platform_breakdown: PlatformScore,
    /// `None` for patient-independent rankings.
    pub match_breakdown: Option<MatchScore>,
    pub mismatches: Option<MismatchResult>,
    pub has_compatible_slot: bool,
}

impl RankedCandidate {
    pub fn is_perfect(&self) -> bool {
        self.mismatches.as_ref().is_some_and(|m| m.is_perfect)
    }

    pub fn reason_count(&self) -> usize {
        self.mismatches.as_ref().map_or(0, MismatchResult::reason_count)
    }
}

#[derive(Debug, Clone)]
pub struct MatchingEngineConfig {
    pub match_points: MatchPoints,
    pub platform_points: PlatformPoints,
    pub match_score_weight: f64,
    /// Look-ahead window for the instant-match slot tie-break.
    pub slot_lookahead_days: i64,
}

impl Default for MatchingEngineConfig {
    fn default() -> Self {
        Self {
            match_points: MATCH_POINTS,
            platform_points: PLATFORM_POINTS,
            match_score_weight: MATCH_SCORE_WEIGHT,
            slot_lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
        }
    }
}

impl MatchingEngineConfig {
    /// Defaults, overridden by `TM_MATCH_SCORE_WEIGHT` and `TM_SLOT_LOOKAHEAD_DAYS` (capped at
    /// `MAX_LOOKAHEAD_DAYS`).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            match_score_weight: env_parse::<f64>("TM_MATCH_SCORE_WEIGHT")
                .filter(|w| w.is_finite() && *w >= 0.0)
                .unwrap_or(defaults.match_score_weight),
            slot_lookahead_days: env_parse::<i64>("TM_SLOT_LOOKAHEAD_DAYS")
                .filter(|d| *d > 0)
                .map(|d| d.min(MAX_LOOKAHEAD_DAYS))
                .unwrap_or(defaults.slot_lookahead_days),
            ..defaults
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse().ok())
}

pub struct MatchingEngine {
    config: MatchingEngineConfig,
    match_scorer: MatchScorer,
    platform_scorer: PlatformScorer,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(MatchingEngineConfig::default())
    }
}

impl MatchingEngine {
    pub fn new(config: MatchingEngineConfig) -> Self {
        Self {
            match_scorer: MatchScorer::new(config.match_points),
            platform_scorer: PlatformScorer::new(config.platform_points),
            config,
        }
    }

    pub fn config(&self) -> &MatchingEngineConfig {
        &self.config
    }

    /// Patient ranking: eligibility with the patient, then `total = match * weight + platform`,
    /// descending. Ties keep pool order.
    pub fn rank(
        &self,
        candidates: &[CandidateProfile],
        patient: &PatientPreferences,
        availability: &HashMap<String, Availability>,
    ) -> Vec<RankedCandidate> {
        let mut ranked: Vec<_> = filter_eligible(candidates, Some(patient))
            .into_iter()
            .map(|candidate| {
                self.build_ranked(candidate, patient, availability.get(&candidate.id), None)
            })
            .collect();

        ranked.sort_by(|a, b| by_total_desc(a, b));

        debug!(
            pool_size = candidates.len(),
            ranked = ranked.len(),
            top_total = ranked.first().map(|r| r.score.total_score),
            "patient_ranking_done"
        );
        ranked
    }

    /// Directory listing without a patient: accepting-new gate only, platform score alone.
    pub fn rank_for_directory(
        &self,
        candidates: &[CandidateProfile],
        availability: &HashMap<String, Availability>,
    ) -> Vec<RankedCandidate> {
        let mut ranked: Vec<_> = filter_eligible(candidates, None)
            .into_iter()
            .map(|candidate| {
                let platform = self.platform_breakdown(candidate, availability.get(&candidate.id));
                RankedCandidate {
                    candidate: candidate.clone(),
                    score: ScoreBreakdown::platform_only(platform.total),
                    platform_breakdown: platform,
                    match_breakdown: None,
                    mismatches: None,
                    has_compatible_slot: false,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .platform_score
                .partial_cmp(&a.score.platform_score)
                .unwrap_or(Ordering::Equal)
        });

        debug!(
            pool_size = candidates.len(),
            ranked = ranked.len(),
            "directory_ranking_done"
        );
        ranked
    }

    /// Instant-match ordering: perfect matches first, then fewer mismatch reasons, then a
    /// compatible slot inside the look-ahead window, then total score.
    pub fn rank_for_instant_match(
        &self,
        candidates: &[CandidateProfile],
        patient: &PatientPreferences,
        availability: &HashMap<String, Availability>,
        now: NaiveDateTime,
    ) -> Vec<RankedCandidate> {
        let mut ranked: Vec<_> = filter_eligible(candidates, Some(patient))
            .into_iter()
            .map(|candidate| {
                let slots = availability.get(&candidate.id);
                self.build_ranked(candidate, patient, slots, Some(now))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.is_perfect()
                .cmp(&a.is_perfect())
                .then_with(|| a.reason_count().cmp(&b.reason_count()))
                .then_with(|| b.has_compatible_slot.cmp(&a.has_compatible_slot))
                .then_with(|| by_total_desc(a, b))
        });

        debug!(
            pool_size = candidates.len(),
            ranked = ranked.len(),
            perfect = ranked.iter().filter(|r| r.is_perfect()).count(),
            "instant_match_ranking_done"
        );
        ranked
    }

    fn platform_breakdown(
        &self,
        candidate: &CandidateProfile,
        availability: Option<&Availability>,
    ) -> PlatformScore {
        let (within_7, within_14) = availability
            .map(|a| (a.slots_within_7_days, a.slots_within_14_days))
            .unwrap_or((0, 0));
        self.platform_scorer.score(candidate, within_7, within_14)
    }

    fn build_ranked(
        &self,
        candidate: &CandidateProfile,
        patient: &PatientPreferences,
        availability: Option<&Availability>,
        slot_check_from: Option<NaiveDateTime>,
    ) -> RankedCandidate {
        let match_breakdown = self.match_scorer.score(candidate, patient);
        let platform = self.platform_breakdown(candidate, availability);
        let mismatches = compute_mismatches(patient, candidate);

        let has_compatible_slot = match (slot_check_from, availability) {
            (Some(now), Some(availability)) => has_compatible_slot(
                &availability.upcoming_slots,
                &patient.time_slots,
                now,
                self.config.slot_lookahead_days,
            ),
            _ => false,
        };

        RankedCandidate {
            candidate: candidate.clone(),
            score: ScoreBreakdown::new(
                match_breakdown.total,
                platform.total,
                self.config.match_score_weight,
            ),
            platform_breakdown: platform,
            match_breakdown: Some(match_breakdown),
            mismatches: Some(mismatches),
            has_compatible_slot,
        }
    }
}

fn by_total_desc(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.score
        .total_score
        .partial_cmp(&a.score.total_score)
        .unwrap_or(Ordering::Equal)
}
