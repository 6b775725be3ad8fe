use serde::Serialize;

use super::{
    scoring::ScoringResult,
    weights::{PLATFORM_POINTS, PlatformPoints},
};
use crate::CandidateProfile;

/// Patient-independent engagement score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformScore {
    pub total: f64,
    pub availability: ScoringResult,
    pub profile: ScoringResult,
}

pub fn calculate_platform_score(
    candidate: &CandidateProfile,
    slots_within_7_days: u32,
    slots_within_14_days: u32,
) -> f64 {
    PlatformScorer::default()
        .score(candidate, slots_within_7_days, slots_within_14_days)
        .total
}

pub struct PlatformScorer {
    points: PlatformPoints,
}

impl Default for PlatformScorer {
    fn default() -> Self {
        Self::new(PLATFORM_POINTS)
    }
}

impl PlatformScorer {
    pub fn new(points: PlatformPoints) -> Self {
        Self { points }
    }

    /// The 14-day count only shows up in the details text.
    pub fn score(
        &self,
        candidate: &CandidateProfile,
        slots_within_7_days: u32,
        slots_within_14_days: u32,
    ) -> PlatformScore {
        let availability = self.score_availability(slots_within_7_days, slots_within_14_days);
        let profile = self.score_profile(candidate);

        PlatformScore {
            total: availability.points + profile.points,
            availability,
            profile,
        }
    }

    fn score_availability(&self, within_7: u32, within_14: u32) -> ScoringResult {
        let points = self.points.availability(within_7);
        let status = if points >= self.points.many_slots {
            "MATCH"
        } else if points > 0.0 {
            "PARTIAL_MATCH"
        } else {
            "MISS"
        };

        ScoringResult {
            points,
            max_points: self.points.many_slots,
            status,
            details: format!("{} slot(s) within 7 days, {} within 14 days", within_7, within_14),
        }
    }

    fn score_profile(&self, candidate: &CandidateProfile) -> ScoringResult {
        let profile = &candidate.profile;
        if profile.has_photo() && profile.has_descriptive_text() {
            ScoringResult {
                points: self.points.complete_profile,
                max_points: self.points.complete_profile,
                status: "MATCH",
                details: "photo and descriptive text present".into(),
            }
        } else {
            let missing = match (profile.has_photo(), profile.has_descriptive_text()) {
                (false, false) => "photo and descriptive text missing",
                (false, true) => "photo missing",
                _ => "descriptive text missing",
            };
            ScoringResult {
                points: self.points.incomplete_profile,
                max_points: self.points.complete_profile,
                status: "PARTIAL_MATCH",
                details: missing.into(),
            }
        }
    }
}
