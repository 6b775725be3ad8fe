pub mod eligibility;
pub mod mismatch;
pub mod pipeline;
pub mod platform;
pub mod scoring;
pub mod slots;
pub mod weights;

pub use eligibility::{filter_eligible, is_eligible};
pub use mismatch::{MismatchKind, MismatchResult, compute_mismatches};
pub use pipeline::{MatchingEngine, MatchingEngineConfig, RankedCandidate, ScoreBreakdown};
pub use platform::{PlatformScore, calculate_platform_score};
pub use scoring::{MatchScore, ScoringResult, calculate_match_score};
