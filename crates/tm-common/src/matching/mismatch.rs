use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::{
    CandidateProfile, PatientPreferences, SessionFormat,
    normalize::{normalize_tag_set, same_city},
};

/// Soft mismatch dimension between one patient and one candidate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MismatchKind {
    Gender,
    Location,
    City,
    Modality,
}

impl MismatchKind {
    pub const ALL: [MismatchKind; 4] = [
        MismatchKind::Gender,
        MismatchKind::Location,
        MismatchKind::City,
        MismatchKind::Modality,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchResult {
    pub is_perfect: bool,
    /// Fired dimensions; `city` first when present.
    pub reasons: Vec<MismatchKind>,
    /// Every dimension, fired or not.
    pub mismatches: BTreeMap<MismatchKind, bool>,
}

impl MismatchResult {
    fn from_flags(flags: BTreeMap<MismatchKind, bool>) -> Self {
        let mut reasons: Vec<MismatchKind> = Vec::new();
        if flags.get(&MismatchKind::City).copied().unwrap_or(false) {
            reasons.push(MismatchKind::City);
        }
        reasons.extend(
            MismatchKind::ALL
                .into_iter()
                .filter(|kind| *kind != MismatchKind::City)
                .filter(|kind| flags.get(kind).copied().unwrap_or(false)),
        );

        Self {
            is_perfect: reasons.is_empty(),
            reasons,
            mismatches: flags,
        }
    }

    pub fn has(&self, kind: MismatchKind) -> bool {
        self.mismatches.get(&kind).copied().unwrap_or(false)
    }

    pub fn reason_count(&self) -> usize {
        self.reasons.len()
    }
}

/// Soft mismatches used to explain a recommendation. They never change the score.
pub fn compute_mismatches(
    patient: &PatientPreferences,
    candidate: &CandidateProfile,
) -> MismatchResult {
    let mut flags = BTreeMap::new();
    flags.insert(MismatchKind::Gender, gender_mismatch(patient, candidate));
    flags.insert(MismatchKind::Location, location_mismatch(patient, candidate));
    flags.insert(MismatchKind::City, city_mismatch(patient, candidate));
    flags.insert(MismatchKind::Modality, modality_mismatch(patient, candidate));

    MismatchResult::from_flags(flags)
}

fn gender_mismatch(patient: &PatientPreferences, candidate: &CandidateProfile) -> bool {
    patient
        .required_gender()
        .is_some_and(|required| candidate.gender != Some(required))
}

/// Patient accepts in-person and the candidate cannot do in-person at all.
fn location_mismatch(patient: &PatientPreferences, candidate: &CandidateProfile) -> bool {
    patient.accepts(SessionFormat::InPerson) && !candidate.offers(SessionFormat::InPerson)
}

/// Candidate does in-person, but elsewhere. Only binding when the patient will not go online.
fn city_mismatch(patient: &PatientPreferences, candidate: &CandidateProfile) -> bool {
    if !patient.accepts(SessionFormat::InPerson) || patient.accepts(SessionFormat::Online) {
        return false;
    }
    if !candidate.offers(SessionFormat::InPerson) {
        return false;
    }

    match patient.city.as_deref().map(str::trim) {
        Some(city) if !city.is_empty() => !same_city(Some(city), candidate.city.as_deref()),
        _ => false,
    }
}

fn modality_mismatch(patient: &PatientPreferences, candidate: &CandidateProfile) -> bool {
    let requested = normalize_tag_set(&patient.specializations);
    if requested.is_empty() {
        return false;
    }
    let offered = normalize_tag_set(&candidate.modalities);
    requested.is_disjoint(&offered)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{Gender, GenderPreference};

    fn patient() -> PatientPreferences {
        PatientPreferences {
            city: Some("Berlin".into()),
            session_preference: Some(SessionFormat::InPerson),
            ..PatientPreferences::default()
        }
    }

    fn candidate(formats: &[SessionFormat], city: &str) -> CandidateProfile {
        CandidateProfile {
            id: "t-1".into(),
            accepting_new: true,
            gender: Some(Gender::Female),
            city: Some(city.into()),
            session_preferences: formats.iter().copied().collect(),
            modalities: vec!["NARM".into(), "Hakomi".into()],
            ..CandidateProfile::default()
        }
    }

    #[test]
    fn online_only_candidate_is_location_not_city() {
        let result = compute_mismatches(&patient(), &candidate(&[SessionFormat::Online], "Hamburg"));

        assert!(result.has(MismatchKind::Location));
        assert!(!result.has(MismatchKind::City));
        assert_eq!(result.reasons, vec![MismatchKind::Location]);
        assert!(!result.is_perfect);
    }

    #[test]
    fn in_person_elsewhere_is_city_not_location() {
        let result =
            compute_mismatches(&patient(), &candidate(&[SessionFormat::InPerson], "Hamburg"));

        assert!(result.has(MismatchKind::City));
        assert!(!result.has(MismatchKind::Location));
    }

    #[test]
    fn accepting_online_suppresses_city() {
        let mut patient = patient();
        patient.session_preferences = BTreeSet::from([SessionFormat::Online]);

        let result =
            compute_mismatches(&patient, &candidate(&[SessionFormat::InPerson], "München"));
        assert!(!result.has(MismatchKind::City));
        assert!(result.is_perfect);
    }

    #[test]
    fn missing_candidate_city_counts_as_different() {
        let mut therapist = candidate(&[SessionFormat::InPerson], "");
        therapist.city = None;

        let result = compute_mismatches(&patient(), &therapist);
        assert!(result.has(MismatchKind::City));
    }

    #[test]
    fn city_is_listed_first() {
        let mut patient = patient();
        patient.gender_preference = Some(GenderPreference::Male);
        patient.specializations = vec!["Gestalt".into()];

        let result =
            compute_mismatches(&patient, &candidate(&[SessionFormat::InPerson], "Köln"));
        assert_eq!(
            result.reasons,
            vec![
                MismatchKind::City,
                MismatchKind::Gender,
                MismatchKind::Modality
            ]
        );
        assert_eq!(result.mismatches.len(), 4);
    }

    #[test]
    fn modality_overlap_ignores_case_and_spacing() {
        let mut patient = patient();
        patient.session_preference = Some(SessionFormat::Online);
        patient.specializations = vec![" narm ".into()];

        let result = compute_mismatches(&patient, &candidate(&[SessionFormat::Online], "Berlin"));
        assert!(!result.has(MismatchKind::Modality));

        patient.specializations.clear();
        let mut no_modalities = candidate(&[SessionFormat::Online], "Berlin");
        no_modalities.modalities.clear();
        assert!(!compute_mismatches(&patient, &no_modalities).has(MismatchKind::Modality));
    }
}
