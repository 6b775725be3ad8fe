use std::collections::BTreeSet;

use crate::{SessionFormat, normalize::normalize_tag};

fn formats_for(key: &str) -> BTreeSet<SessionFormat> {
    let mut formats = BTreeSet::new();
    if key.is_empty() {
        return formats;
    }

    let both = ["both", "beides", "egal", "either", "online-oder-vor-ort"];
    if both.contains(&key) {
        formats.insert(SessionFormat::Online);
        formats.insert(SessionFormat::InPerson);
        return formats;
    }

    if key.contains("online") || key.contains("video") || key.contains("remote") {
        formats.insert(SessionFormat::Online);
    }
    if key.contains("in-person")
        || key.contains("vor-ort")
        || key.contains("prasenz")
        || key.contains("praxis")
        || key.contains("persoenlich")
        || key.contains("personlich")
    {
        formats.insert(SessionFormat::InPerson);
    }

    formats
}

/// Single session-format label -> `SessionFormat`.
/// "Beides"/"both" is ambiguous for a single value and yields `None`; use
/// [`correct_session_formats`] for those.
pub fn correct_session_format(input: &str) -> Option<SessionFormat> {
    let formats = formats_for(&normalize_tag(input));
    if formats.len() == 1 {
        formats.into_iter().next()
    } else {
        None
    }
}

/// Any number of format labels -> set of formats. Unknown labels are dropped.
pub fn correct_session_formats(inputs: &[String]) -> BTreeSet<SessionFormat> {
    inputs
        .iter()
        .flat_map(|input| formats_for(&normalize_tag(input)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_single_labels() {
        assert_eq!(correct_session_format("online"), Some(SessionFormat::Online));
        assert_eq!(
            correct_session_format("in_person"),
            Some(SessionFormat::InPerson)
        );
        assert_eq!(
            correct_session_format("Vor Ort"),
            Some(SessionFormat::InPerson)
        );
        assert_eq!(
            correct_session_format("In der Praxis"),
            Some(SessionFormat::InPerson)
        );
        assert_eq!(
            correct_session_format("Video-Sitzung"),
            Some(SessionFormat::Online)
        );
        assert_eq!(correct_session_format("Beides"), None);
        assert_eq!(correct_session_format(""), None);
    }

    #[test]
    fn expands_both_into_two_formats() {
        let formats = correct_session_formats(&["beides".into()]);
        assert_eq!(formats.len(), 2);

        let formats = correct_session_formats(&["Online".into(), "Präsenz".into(), "??".into()]);
        assert!(formats.contains(&SessionFormat::Online));
        assert!(formats.contains(&SessionFormat::InPerson));
    }
}
