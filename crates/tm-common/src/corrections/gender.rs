use crate::{Gender, GenderPreference, normalize::normalize_tag};

/// Therapist gender label -> `Gender`.
/// Accepts the stored enum values plus German/English form labels. Unknown labels map to `None`.
pub fn correct_gender(input: &str) -> Option<Gender> {
    let key = normalize_tag(input);
    match key.as_str() {
        "male" | "m" | "mann" | "mannlich" | "herr" | "man" => Some(Gender::Male),
        "female" | "f" | "w" | "frau" | "weiblich" | "woman" => Some(Gender::Female),
        "diverse" | "d" | "divers" | "non-binary" | "nonbinary" | "nicht-binar" => {
            Some(Gender::Diverse)
        }
        _ => None,
    }
}

/// German inclusive forms: "Therapeut:in", "Therapeut*innen" (normalized to `therapeut-in`,
/// `therapeut-innen`) and the capital-I form "TherapeutIn".
fn is_gender_inclusive(input: &str, key: &str) -> bool {
    let segments: Vec<&str> = key.split('-').collect();
    let suffixed = segments
        .windows(2)
        .any(|pair| !pair[0].is_empty() && matches!(pair[1], "in" | "innen"));

    let binnen_i = input
        .split(|c: char| !c.is_alphabetic())
        .any(|word| {
            ["In", "Innen"].iter().any(|suffix| {
                word.strip_suffix(suffix)
                    .and_then(|stem| stem.chars().last())
                    .is_some_and(char::is_lowercase)
            })
        });

    suffixed || binnen_i
}

/// Patient gender preference label -> `GenderPreference`.
///
/// Empty and unrecognized input is `None`, which the engine treats exactly like
/// `NoPreference`: it never excludes anyone.
pub fn correct_gender_preference(input: &str) -> Option<GenderPreference> {
    let key = normalize_tag(input);
    if key.is_empty() {
        return None;
    }

    match key.as_str() {
        "no-preference" | "egal" | "keine-praferenz" | "any" | "none" => {
            return Some(GenderPreference::NoPreference);
        }
        _ => {}
    }

    if is_gender_inclusive(input, &key) {
        return Some(GenderPreference::NoPreference);
    }

    // "Frau", "Therapeutin", "weiblich" before the male checks: "therapeutin" contains "therapeut".
    if key.contains("female")
        || key.contains("frau")
        || key.contains("weiblich")
        || key.contains("therapeutin")
    {
        return Some(GenderPreference::Female);
    }
    if key.contains("male") || key.contains("mann") || key.contains("therapeut") {
        return Some(GenderPreference::Male);
    }

    None
}
