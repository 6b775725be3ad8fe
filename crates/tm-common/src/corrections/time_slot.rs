use std::collections::BTreeSet;

use crate::{TimeOfDay, normalize::normalize_tag};

const FLEXIBLE: &[&str] = &["flexibel", "egal", "jederzeit", "any", "anytime", "flexible"];

/// Free-text time-slot label -> `TimeOfDay` bucket.
///
/// Keyword based: "Morgens (8-12 Uhr)" is a morning, "Wochenende" a weekend.
/// Flexible or unknown labels give `None`.
pub fn correct_time_slot(input: &str) -> Option<TimeOfDay> {
    let key = normalize_tag(input);
    if key.is_empty() || FLEXIBLE.iter().any(|f| key.contains(f)) {
        return None;
    }

    if key.contains("wochenende")
        || key.contains("weekend")
        || key.contains("samstag")
        || key.contains("sonntag")
    {
        return Some(TimeOfDay::Weekend);
    }
    // "vormittags" contains "mittag"; morning has to be checked first.
    if key.contains("vormittag")
        || key.contains("morgen")
        || key.contains("morning")
        || key.contains("fruh")
    {
        return Some(TimeOfDay::Morning);
    }
    if key.contains("nachmittag") || key.contains("afternoon") || key.contains("mittag") {
        return Some(TimeOfDay::Afternoon);
    }
    if key.contains("abend") || key.contains("evening") {
        return Some(TimeOfDay::Evening);
    }

    None
}

/// Set of buckets the patient named. An empty result means "any time".
pub fn correct_time_slots(inputs: &[String]) -> BTreeSet<TimeOfDay> {
    inputs.iter().filter_map(|s| correct_time_slot(s)).collect()
}
