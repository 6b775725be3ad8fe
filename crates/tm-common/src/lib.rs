pub mod api;
pub mod corrections;
pub mod db;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod run_id;
pub mod shortlist;
pub mod token;

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionFormat {
    Online,
    InPerson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Diverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GenderPreference {
    Male,
    Female,
    NoPreference,
}

impl GenderPreference {
    /// The gender a candidate must have, or `None` when the patient does not mind.
    pub fn required_gender(self) -> Option<Gender> {
        match self {
            GenderPreference::Male => Some(Gender::Male),
            GenderPreference::Female => Some(Gender::Female),
            GenderPreference::NoPreference => None,
        }
    }
}

/// Coarse time-of-day bucket a patient can ask for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Weekend,
}

// Preferences of one patient, already translated into closed enums.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientPreferences {
    pub city: Option<String>,
    pub session_preference: Option<SessionFormat>,
    pub session_preferences: BTreeSet<SessionFormat>,
    pub gender_preference: Option<GenderPreference>,
    pub specializations: Vec<String>,
    pub schwerpunkte: Vec<String>,
    pub time_slots: BTreeSet<TimeOfDay>,
}

impl PatientPreferences {
    /// Union of the single and multi-valued format fields. Empty means "no constraint".
    pub fn accepted_formats(&self) -> BTreeSet<SessionFormat> {
        let mut formats = self.session_preferences.clone();
        if let Some(format) = self.session_preference {
            formats.insert(format);
        }
        formats
    }

    pub fn accepts(&self, format: SessionFormat) -> bool {
        self.session_preference == Some(format) || self.session_preferences.contains(&format)
    }

    pub fn required_gender(&self) -> Option<Gender> {
        self.gender_preference
            .and_then(GenderPreference::required_gender)
    }
}

/// Public profile content used for the completeness checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileContent {
    pub photo_url: Option<String>,
    pub approach_text: Option<String>,
    pub who_comes_to_me: Option<String>,
    pub session_focus: Option<String>,
    pub first_session: Option<String>,
    pub about_me: Option<String>,
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl ProfileContent {
    pub fn has_photo(&self) -> bool {
        is_filled(&self.photo_url)
    }

    pub fn has_structured_bio(&self) -> bool {
        [
            &self.who_comes_to_me,
            &self.session_focus,
            &self.first_session,
            &self.about_me,
        ]
        .into_iter()
        .any(is_filled)
    }

    /// Approach text or any structured bio field.
    pub fn has_descriptive_text(&self) -> bool {
        is_filled(&self.approach_text) || self.has_structured_bio()
    }

    /// Photo, approach text and at least one structured bio field.
    pub fn is_complete(&self) -> bool {
        self.has_photo() && is_filled(&self.approach_text) && self.has_structured_bio()
    }
}

// One therapist row from the publicly listable pool.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CandidateProfile {
    pub id: String,
    pub accepting_new: bool,
    pub gender: Option<Gender>,
    pub city: Option<String>,
    pub session_preferences: BTreeSet<SessionFormat>,
    pub modalities: Vec<String>,
    pub schwerpunkte: Vec<String>,
    pub profile: ProfileContent,
}

impl CandidateProfile {
    pub fn offers(&self, format: SessionFormat) -> bool {
        self.session_preferences.contains(&format)
    }

    pub fn profile_completion(&self) -> bool {
        self.profile.is_complete()
    }
}

/// Slot counts supplied by the scheduling collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Availability {
    pub slots_within_7_days: u32,
    pub slots_within_14_days: u32,
    /// Upcoming bookable slot start times in practice-local wall-clock time.
    pub upcoming_slots: Vec<NaiveDateTime>,
}
