/// Match points (patient-specific compatibility).
/// Rules only add points; hard incompatibilities are handled by the eligibility gate.
pub const MATCH_POINTS: MatchPoints = MatchPoints {
    gender: 10.0,
    modality: 15.0,
    schwerpunkt_per_overlap: 10.0,
    schwerpunkte_cap: 40.0,
    in_person_city: 20.0,
};

/// Platform points (patient-independent engagement).
pub const PLATFORM_POINTS: PlatformPoints = PlatformPoints {
    few_slots: 15.0,
    many_slots: 25.0,
    many_slots_threshold: 3,
    complete_profile: 15.0,
    incomplete_profile: 5.0,
};

/// total_score = match_score * MATCH_SCORE_WEIGHT + platform_score
pub const MATCH_SCORE_WEIGHT: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPoints {
    pub gender: f64,
    pub modality: f64,
    pub schwerpunkt_per_overlap: f64,
    pub schwerpunkte_cap: f64,
    pub in_person_city: f64,
}

impl MatchPoints {
    /// 1 shared -> 10, 2 -> 20, 3 -> 30, 4+ -> 40
    pub fn schwerpunkte(&self, shared: usize) -> f64 {
        (shared as f64 * self.schwerpunkt_per_overlap).min(self.schwerpunkte_cap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformPoints {
    pub few_slots: f64,
    pub many_slots: f64,
    pub many_slots_threshold: u32,
    pub complete_profile: f64,
    pub incomplete_profile: f64,
}

impl PlatformPoints {
    pub fn availability(&self, slots_within_7_days: u32) -> f64 {
        match slots_within_7_days {
            0 => 0.0,
            n if n >= self.many_slots_threshold => self.many_slots,
            _ => self.few_slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_points_cap_schwerpunkte() {
        assert_eq!(MATCH_POINTS.schwerpunkte(0), 0.0);
        assert_eq!(MATCH_POINTS.schwerpunkte(1), 10.0);
        assert_eq!(MATCH_POINTS.schwerpunkte(3), 30.0);
        assert_eq!(MATCH_POINTS.schwerpunkte(4), 40.0);
        assert_eq!(MATCH_POINTS.schwerpunkte(9), 40.0);
    }

    #[test]
    fn availability_tiers() {
        assert_eq!(PLATFORM_POINTS.availability(0), 0.0);
        assert_eq!(PLATFORM_POINTS.availability(1), 15.0);
        assert_eq!(PLATFORM_POINTS.availability(2), 15.0);
        assert_eq!(PLATFORM_POINTS.availability(3), 25.0);
        assert_eq!(PLATFORM_POINTS.availability(40), 25.0);
    }
}
