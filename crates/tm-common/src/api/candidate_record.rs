use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    CandidateProfile, ProfileContent,
    corrections::{correct_gender, correct_session_formats},
};

/// Therapist row as exported by the directory. Only `id` is strict: a scalar of the wrong type
/// falls back to its default and list-valued attributes are kept as raw JSON, so one malformed
/// column does not reject the whole pool.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateRecord {
    #[serde(deserialize_with = "candidate_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub accepting_new: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub city: Option<String>,
    #[serde(default)]
    pub session_preferences: Option<Value>,
    #[serde(default)]
    pub modalities: Option<Value>,
    #[serde(default)]
    pub schwerpunkte: Option<Value>,
    #[serde(default, deserialize_with = "lenient_profile")]
    pub profile: ProfileContent,
}

/// Directory ids are strings, older exports carry them as numbers.
fn candidate_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) if !id.trim().is_empty() => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "candidate id must be a non-empty string or a number, got {other}"
        ))),
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Field-wise: a non-string field is treated as missing, a non-object profile as empty.
fn lenient_profile<'de, D>(deserializer: D) -> Result<ProfileContent, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    Ok(ProfileContent {
        photo_url: text("photo_url"),
        approach_text: text("approach_text"),
        who_comes_to_me: text("who_comes_to_me"),
        session_focus: text("session_focus"),
        first_session: text("first_session"),
        about_me: text("about_me"),
    })
}

/// Array of strings -> Vec. Anything else, including non-string items, is dropped.
fn parse_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => vec![],
    }
}

impl CandidateRecord {
    pub fn to_profile(&self) -> CandidateProfile {
        CandidateProfile {
            id: self.id.clone(),
            accepting_new: self.accepting_new,
            gender: self.gender.as_deref().and_then(correct_gender),
            city: self.city.clone().filter(|c| !c.trim().is_empty()),
            session_preferences: correct_session_formats(&parse_string_list(
                self.session_preferences.as_ref(),
            )),
            modalities: parse_string_list(self.modalities.as_ref()),
            schwerpunkte: parse_string_list(self.schwerpunkte.as_ref()),
            profile: self.profile.clone(),
        }
    }
}

impl From<CandidateRecord> for CandidateProfile {
    fn from(record: CandidateRecord) -> Self {
        record.to_profile()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::json;

    use super::*;
    use crate::{Gender, SessionFormat};

    #[test]
    fn maps_well_formed_rows() {
        let record: CandidateRecord = serde_json::from_value(json!({
            "id": "t-1",
            "accepting_new": true,
            "gender": "weiblich",
            "city": "Berlin",
            "session_preferences": ["online", "in_person"],
            "modalities": ["NARM", "Hakomi"],
            "schwerpunkte": ["trauma"],
            "profile": { "photo_url": "https://cdn/p.jpg", "approach_text": "..." }
        }))
        .unwrap();

        let profile = CandidateProfile::from(record);
        assert!(profile.accepting_new);
        assert_eq!(profile.gender, Some(Gender::Female));
        assert_eq!(
            profile.session_preferences,
            BTreeSet::from([SessionFormat::Online, SessionFormat::InPerson])
        );
        assert_eq!(profile.modalities, vec!["NARM", "Hakomi"]);
        assert!(profile.profile.has_photo());
    }

    #[test]
    fn malformed_lists_become_empty() {
        let record: CandidateRecord = serde_json::from_value(json!({
            "id": "t-2",
            "modalities": "NARM",
            "schwerpunkte": { "trauma": true },
            "session_preferences": 3
        }))
        .unwrap();

        let profile = record.to_profile();
        assert!(profile.modalities.is_empty());
        assert!(profile.schwerpunkte.is_empty());
        assert!(profile.session_preferences.is_empty());
        assert!(!profile.accepting_new);
        assert_eq!(profile.profile, ProfileContent::default());
    }

    #[test]
    fn mistyped_scalars_fall_back_to_defaults() {
        let record: CandidateRecord = serde_json::from_value(json!({
            "id": "bad",
            "accepting_new": "yes",
            "city": 10115,
            "gender": ["w"],
            "profile": { "photo_url": 1, "approach_text": "Ansatz", "about_me": false }
        }))
        .unwrap();

        let profile = record.to_profile();
        assert!(!profile.accepting_new);
        assert_eq!(profile.city, None);
        assert_eq!(profile.gender, None);
        assert!(!profile.profile.has_photo());
        assert_eq!(profile.profile.approach_text.as_deref(), Some("Ansatz"));
        assert_eq!(profile.profile.about_me, None);
    }

    #[test]
    fn numeric_ids_are_accepted_and_blank_ids_rejected() {
        let record: CandidateRecord = serde_json::from_value(json!({ "id": 42 })).unwrap();
        assert_eq!(record.id, "42");

        assert!(serde_json::from_value::<CandidateRecord>(json!({ "id": " " })).is_err());
        assert!(serde_json::from_value::<CandidateRecord>(json!({ "id": null })).is_err());
        assert!(serde_json::from_value::<CandidateRecord>(json!({ "city": "Berlin" })).is_err());
    }

    #[test]
    fn profile_that_is_not_an_object_is_empty() {
        let record: CandidateRecord =
            serde_json::from_value(json!({ "id": "t-3", "profile": "see website" })).unwrap();
        assert_eq!(record.profile, ProfileContent::default());
    }

    #[test]
    fn non_string_items_are_skipped() {
        let list = parse_string_list(Some(&json!(["narm", 7, null, "hakomi"])));
        assert_eq!(list, vec!["narm", "hakomi"]);
    }
}
