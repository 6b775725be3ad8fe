use serde::Deserialize;

use crate::{
    PatientPreferences,
    corrections::{
        correct_gender_preference, correct_session_format, correct_session_formats,
        correct_time_slots,
    },
};

/// Patient preferences as submitted by the intake form. Labels may be German or English.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientRequest {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub session_preference: Option<String>,
    #[serde(default)]
    pub session_preferences: Vec<String>,
    #[serde(default)]
    pub gender_preference: Option<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(default)]
    pub schwerpunkte: Vec<String>,
    #[serde(default)]
    pub time_slots: Vec<String>,
}

impl PatientRequest {
    /// Translate free-text labels into closed enums. Unknown labels become "no constraint".
    pub fn into_preferences(self) -> PatientPreferences {
        let session_preference = self
            .session_preference
            .as_deref()
            .and_then(correct_session_format);

        let mut session_preferences = correct_session_formats(&self.session_preferences);
        // "beides" has no single-format reading; keep both formats instead.
        if session_preference.is_none() {
            if let Some(raw) = self.session_preference {
                session_preferences.extend(correct_session_formats(&[raw]));
            }
        }

        PatientPreferences {
            city: self.city.filter(|c| !c.trim().is_empty()),
            session_preference,
            session_preferences,
            gender_preference: self
                .gender_preference
                .as_deref()
                .and_then(correct_gender_preference),
            specializations: self.specializations,
            schwerpunkte: self.schwerpunkte,
            time_slots: correct_time_slots(&self.time_slots),
        }
    }
}
