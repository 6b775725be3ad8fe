use std::collections::HashSet;

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Normalize a modality / schwerpunkt identifier for comparison.
///
/// 1. NFKD decomposition, combining marks dropped ("Körper" -> "Korper")
/// 2. lowercase
/// 3. every run of non-alphanumeric characters becomes a single `-`, trimmed at both ends
///
/// "Somatic Experiencing", "somatic_experiencing" and " SOMATIC-experiencing " all map to
/// `somatic-experiencing`.
pub fn normalize_tag(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
    {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }

    out
}

/// Normalized set of tags; blank entries are dropped.
pub fn normalize_tag_set(tags: &[String]) -> HashSet<String> {
    tags.iter()
        .map(|t| normalize_tag(t))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Number of identifiers both sides share after normalization.
pub fn shared_tag_count(left: &[String], right: &[String]) -> usize {
    let left = normalize_tag_set(left);
    if left.is_empty() {
        return 0;
    }
    normalize_tag_set(right).intersection(&left).count()
}

/// City equality under the same normalization. Missing or blank on either side is never equal.
pub fn same_city(left: Option<&str>, right: Option<&str>) -> bool {
    match (left.map(normalize_tag), right.map(normalize_tag)) {
        (Some(l), Some(r)) => !l.is_empty() && l == r,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_accents() {
        assert_eq!(normalize_tag("NARM"), "narm");
        assert_eq!(normalize_tag("Körperpsychotherapie"), "korperpsychotherapie");
        assert_eq!(normalize_tag("Traumaarbeit (é)"), "traumaarbeit-e");
    }

    #[test]
    fn collapses_separators_to_single_hyphen() {
        assert_eq!(normalize_tag("Somatic Experiencing"), "somatic-experiencing");
        assert_eq!(normalize_tag("somatic_experiencing"), "somatic-experiencing");
        assert_eq!(normalize_tag("  Somatic -- Experiencing  "), "somatic-experiencing");
        assert_eq!(normalize_tag("core/energetics"), "core-energetics");
    }

    #[test]
    fn blank_tags_vanish_from_sets() {
        let set = normalize_tag_set(&["  ".into(), "Hakomi".into(), "hakomi ".into()]);
        assert_eq!(set.len(), 1);
        assert!(set.contains("hakomi"));
    }

    #[test]
    fn counts_shared_tags_after_normalization() {
        let patient = vec!["Angst".to_string(), "Depression".to_string()];
        let therapist = vec![
            "angst".to_string(),
            " DEPRESSION".to_string(),
            "trauma".to_string(),
        ];
        assert_eq!(shared_tag_count(&patient, &therapist), 2);
        assert_eq!(shared_tag_count(&[], &therapist), 0);
    }

    #[test]
    fn compares_cities_loosely() {
        assert!(same_city(Some("Berlin"), Some(" berlin ")));
        assert!(same_city(Some("Frankfurt am Main"), Some("frankfurt-am-main")));
        assert!(!same_city(Some("Berlin"), Some("Hamburg")));
        assert!(!same_city(Some("Berlin"), None));
        assert!(!same_city(Some(""), Some("")));
    }
}
