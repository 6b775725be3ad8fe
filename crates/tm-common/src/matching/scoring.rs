use serde::Serialize;

use super::weights::{MATCH_POINTS, MatchPoints};
use crate::{
    CandidateProfile, PatientPreferences, SessionFormat,
    normalize::{normalize_tag_set, same_city, shared_tag_count},
};

/// One scoring rule's contribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringResult {
    pub points: f64,
    pub max_points: f64,
    pub status: &'static str,
    pub details: String,
}

impl ScoringResult {
    fn hit(points: f64, max_points: f64, details: String) -> Self {
        Self {
            points,
            max_points,
            status: if points >= max_points { "MATCH" } else { "PARTIAL_MATCH" },
            details,
        }
    }

    fn miss(max_points: f64, details: impl Into<String>) -> Self {
        Self {
            points: 0.0,
            max_points,
            status: "MISS",
            details: details.into(),
        }
    }

    fn not_requested(max_points: f64, details: impl Into<String>) -> Self {
        Self {
            points: 0.0,
            max_points,
            status: "NOT_REQUESTED",
            details: details.into(),
        }
    }
}

/// Match score with per-rule breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScore {
    pub total: f64,
    pub gender: ScoringResult,
    pub modality: ScoringResult,
    pub schwerpunkte: ScoringResult,
    pub in_person_city: ScoringResult,
}

/// Patient-specific compatibility points.
pub fn calculate_match_score(candidate: &CandidateProfile, patient: &PatientPreferences) -> f64 {
    MatchScorer::default().score(candidate, patient).total
}

pub struct MatchScorer {
    points: MatchPoints,
}

impl Default for MatchScorer {
    fn default() -> Self {
        Self::new(MATCH_POINTS)
    }
}

impl MatchScorer {
    pub fn new(points: MatchPoints) -> Self {
        Self { points }
    }

    /// Every rule runs; the total is their plain sum.
    pub fn score(&self, candidate: &CandidateProfile, patient: &PatientPreferences) -> MatchScore {
        let gender = self.score_gender(candidate, patient);
        let modality = self.score_modality(candidate, patient);
        let schwerpunkte = self.score_schwerpunkte(candidate, patient);
        let in_person_city = self.score_in_person_city(candidate, patient);

        let total = gender.points + modality.points + schwerpunkte.points + in_person_city.points;

        MatchScore {
            total,
            gender,
            modality,
            schwerpunkte,
            in_person_city,
        }
    }

    fn score_gender(
        &self,
        candidate: &CandidateProfile,
        patient: &PatientPreferences,
    ) -> ScoringResult {
        let max = self.points.gender;
        match patient.required_gender() {
            None => ScoringResult::not_requested(max, "no gender preference"),
            Some(required) if candidate.gender == Some(required) => {
                ScoringResult::hit(max, max, format!("gender matches: {}", required.as_ref()))
            }
            Some(required) => {
                ScoringResult::miss(max, format!("gender differs from {}", required.as_ref()))
            }
        }
    }

    fn score_modality(
        &self,
        candidate: &CandidateProfile,
        patient: &PatientPreferences,
    ) -> ScoringResult {
        let max = self.points.modality;
        let requested = normalize_tag_set(&patient.specializations);
        if requested.is_empty() {
            return ScoringResult::not_requested(max, "no modality requested");
        }

        let offered = normalize_tag_set(&candidate.modalities);
        let mut shared: Vec<_> = requested.intersection(&offered).cloned().collect();
        if shared.is_empty() {
            return ScoringResult::miss(max, "no shared modality");
        }
        shared.sort();

        ScoringResult::hit(max, max, format!("shared modalities: {}", shared.join(", ")))
    }

    fn score_schwerpunkte(
        &self,
        candidate: &CandidateProfile,
        patient: &PatientPreferences,
    ) -> ScoringResult {
        let max = self.points.schwerpunkte_cap;
        if patient.schwerpunkte.is_empty() {
            return ScoringResult::not_requested(max, "no focus areas requested");
        }

        let shared = shared_tag_count(&patient.schwerpunkte, &candidate.schwerpunkte);
        if shared == 0 {
            return ScoringResult::miss(max, "no shared focus area");
        }

        ScoringResult::hit(
            self.points.schwerpunkte(shared),
            max,
            format!("{} shared focus area(s)", shared),
        )
    }

    fn score_in_person_city(
        &self,
        candidate: &CandidateProfile,
        patient: &PatientPreferences,
    ) -> ScoringResult {
        let max = self.points.in_person_city;
        if !patient.accepts(SessionFormat::InPerson) {
            return ScoringResult::not_requested(max, "patient does not ask for in-person");
        }
        if !candidate.offers(SessionFormat::InPerson) {
            return ScoringResult::miss(max, "no in-person sessions offered");
        }
        if !same_city(patient.city.as_deref(), candidate.city.as_deref()) {
            return ScoringResult::miss(max, "in-person practice in another city");
        }

        ScoringResult::hit(
            max,
            max,
            format!(
                "in-person in {}",
                candidate.city.as_deref().unwrap_or_default()
            ),
        )
    }
}
