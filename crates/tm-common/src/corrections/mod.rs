pub mod gender;
pub mod session_format;
pub mod time_slot;

pub use gender::{correct_gender, correct_gender_preference};
pub use session_format::{correct_session_format, correct_session_formats};
pub use time_slot::{correct_time_slot, correct_time_slots};
