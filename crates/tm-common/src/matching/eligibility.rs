use tracing::debug;

use crate::{CandidateProfile, PatientPreferences};

/// Outcome of one hard gate.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Pass,
    Excluded { reason: String },
}

impl GateDecision {
    pub fn is_excluded(&self) -> bool {
        matches!(self, GateDecision::Excluded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            GateDecision::Excluded { reason } => Some(reason),
            GateDecision::Pass => None,
        }
    }
}

/// All gate decisions for one candidate (gate name, decision).
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityResult {
    pub decisions: Vec<(&'static str, GateDecision)>,
}

impl EligibilityResult {
    pub fn is_eligible(&self) -> bool {
        !self.decisions.iter().any(|(_, d)| d.is_excluded())
    }

    /// "gate: reason" for every failed gate, in gate order.
    pub fn exclusion_reasons(&self) -> Vec<String> {
        self.decisions
            .iter()
            .filter_map(|(name, d)| d.reason().map(|r| format!("{}: {}", name, r)))
            .collect()
    }
}

/// Run every hard gate. With `patient = None` only the accepting-new gate is evaluated.
pub fn check_eligibility(
    candidate: &CandidateProfile,
    patient: Option<&PatientPreferences>,
) -> EligibilityResult {
    let mut decisions = vec![("accepting_new", check_accepting_new(candidate))];

    if let Some(patient) = patient {
        decisions.push(("gender", check_gender(candidate, patient)));
        decisions.push(("session_format", check_session_format(candidate, patient)));
    }

    EligibilityResult { decisions }
}

/// Hard pass/fail gate.
pub fn is_eligible(candidate: &CandidateProfile, patient: Option<&PatientPreferences>) -> bool {
    check_eligibility(candidate, patient).is_eligible()
}

/// Survivors of the gate, in pool order.
pub fn filter_eligible<'a>(
    pool: &'a [CandidateProfile],
    patient: Option<&PatientPreferences>,
) -> Vec<&'a CandidateProfile> {
    let survivors: Vec<_> = pool
        .iter()
        .filter(|candidate| is_eligible(candidate, patient))
        .collect();

    debug!(
        pool_size = pool.len(),
        eligible = survivors.len(),
        excluded = pool.len() - survivors.len(),
        with_patient = patient.is_some(),
        "eligibility_filtered"
    );

    survivors
}

fn check_accepting_new(candidate: &CandidateProfile) -> GateDecision {
    if candidate.accepting_new {
        GateDecision::Pass
    } else {
        GateDecision::Excluded {
            reason: "not accepting new patients".into(),
        }
    }
}

fn check_gender(candidate: &CandidateProfile, patient: &PatientPreferences) -> GateDecision {
    match patient.required_gender() {
        None => GateDecision::Pass,
        Some(required) if candidate.gender == Some(required) => GateDecision::Pass,
        Some(required) => GateDecision::Excluded {
            reason: format!(
                "patient requires {} therapist, candidate is {}",
                required.as_ref(),
                candidate.gender.as_ref().map_or("unknown", |g| g.as_ref())
            ),
        },
    }
}

fn check_session_format(
    candidate: &CandidateProfile,
    patient: &PatientPreferences,
) -> GateDecision {
    let accepted = patient.accepted_formats();
    if accepted.is_empty() {
        // no preference: any candidate that offers at least one format
        return if candidate.session_preferences.is_empty() {
            GateDecision::Excluded {
                reason: "candidate offers no session format".into(),
            }
        } else {
            GateDecision::Pass
        };
    }

    if accepted
        .iter()
        .any(|format| candidate.session_preferences.contains(format))
    {
        GateDecision::Pass
    } else {
        GateDecision::Excluded {
            reason: format!(
                "no offered format among [{}]",
                accepted
                    .iter()
                    .map(|f| f.as_ref())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}
