pub mod candidate_record;
pub mod patient_request;
pub mod ranking_input;
pub mod ranking_response;

pub use candidate_record::CandidateRecord;
pub use patient_request::PatientRequest;
pub use ranking_input::{AvailabilityRecord, RankingInput};
pub use ranking_response::{RankedCandidateResponse, RankingResponse, ShortlistResponse};
