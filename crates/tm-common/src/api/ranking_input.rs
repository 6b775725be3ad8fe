use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use super::{CandidateRecord, PatientRequest};
use crate::{Availability, CandidateProfile};

/// Availability as reported by the scheduling side. Counts win over the slot list when both
/// are present.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityRecord {
    pub candidate_id: String,
    #[serde(default)]
    pub slots_within_7_days: Option<u32>,
    #[serde(default)]
    pub slots_within_14_days: Option<u32>,
    #[serde(default)]
    pub upcoming_slots: Vec<NaiveDateTime>,
}

impl AvailabilityRecord {
    pub fn to_availability(&self, now: NaiveDateTime) -> Availability {
        let derived = Availability::from_slots(self.upcoming_slots.clone(), now);
        Availability {
            slots_within_7_days: self
                .slots_within_7_days
                .unwrap_or(derived.slots_within_7_days),
            slots_within_14_days: self
                .slots_within_14_days
                .unwrap_or(derived.slots_within_14_days),
            upcoming_slots: derived.upcoming_slots,
        }
    }
}

/// One ranking request snapshot: an optional patient, the listable pool and its availability.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingInput {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub session_key: Option<String>,
    #[serde(default)]
    pub patient: Option<PatientRequest>,
    #[serde(deserialize_with = "candidate_rows")]
    pub candidates: Vec<CandidateRecord>,
    #[serde(default)]
    pub availability: Vec<AvailabilityRecord>,
    /// Reference time for slot windows; callers fall back to the current time.
    #[serde(default)]
    pub now: Option<NaiveDateTime>,
}

/// Rows that still fail to parse (no usable id, not an object) are logged and left out.
fn candidate_rows<'de, D>(deserializer: D) -> Result<Vec<CandidateRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Vec::<Value>::deserialize(deserializer)?;
    let total = rows.len();
    let records: Vec<CandidateRecord> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(row, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(row, error = %err, "candidate_row_skipped");
                None
            }
        })
        .collect();
    if records.len() < total {
        warn!(
            kept = records.len(),
            skipped = total - records.len(),
            "candidate_pool_partially_parsed"
        );
    }
    Ok(records)
}

impl RankingInput {
    pub fn candidate_profiles(&self) -> Vec<CandidateProfile> {
        self.candidates.iter().map(CandidateRecord::to_profile).collect()
    }

    /// Later records for the same candidate replace earlier ones.
    pub fn availability_map(&self, now: NaiveDateTime) -> HashMap<String, Availability> {
        self.availability
            .iter()
            .map(|record| (record.candidate_id.clone(), record.to_availability(now)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    fn monday_9am() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 3)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap()
    }

    #[test]
    fn parses_snapshot_with_defaults() {
        let input: RankingInput = serde_json::from_value(json!({
            "candidates": [{ "id": "t-1", "accepting_new": true }]
        }))
        .unwrap();

        assert!(input.patient.is_none());
        assert!(input.now.is_none());
        assert_eq!(input.candidate_profiles()[0].id, "t-1");
        assert!(input.availability_map(monday_9am()).is_empty());
    }

    #[test]
    fn one_bad_row_does_not_reject_the_pool() {
        let input: RankingInput = serde_json::from_value(json!({
            "candidates": [
                { "id": "ok", "accepting_new": true, "city": "Berlin" },
                { "id": "bad", "accepting_new": "yes", "city": 10115 },
                42,
                { "accepting_new": true }
            ]
        }))
        .unwrap();

        let ids: Vec<_> = input.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "bad"]);

        let profiles = input.candidate_profiles();
        assert!(profiles[0].accepting_new);
        assert!(!profiles[1].accepting_new);
        assert_eq!(profiles[1].city, None);
    }

    #[test]
    fn candidates_must_still_be_a_list() {
        let parsed = serde_json::from_value::<RankingInput>(json!({ "candidates": { "id": "t" } }));
        assert!(parsed.is_err());
    }

    #[test]
    fn explicit_counts_win_over_slot_list() {
        let input: RankingInput = serde_json::from_value(json!({
            "candidates": [],
            "availability": [
                {
                    "candidate_id": "t-1",
                    "upcoming_slots": ["2025-03-04T10:00:00", "2025-03-12T10:00:00"]
                },
                {
                    "candidate_id": "t-2",
                    "slots_within_7_days": 5,
                    "slots_within_14_days": 6,
                    "upcoming_slots": ["2025-03-04T10:00:00"]
                }
            ]
        }))
        .unwrap();

        let map = input.availability_map(monday_9am());
        let derived = &map["t-1"];
        assert_eq!(derived.slots_within_7_days, 1);
        assert_eq!(derived.slots_within_14_days, 2);

        let explicit = &map["t-2"];
        assert_eq!(explicit.slots_within_7_days, 5);
        assert_eq!(explicit.upcoming_slots.len(), 1);
    }
}
