//! Identifiers for ranking runs and stored shortlists.
//!
//! The process-level run id is a ULID minted on first use. Every shortlist
//! written by the process stores it as `match_run_id`, which ties a stored
//! shortlist back to the batch that produced it.
//!
//! ```
//! use tm_common::run_id;
//!
//! assert_eq!(run_id::get(), run_id::get());
//! ```

use once_cell::sync::Lazy;
use ulid::Ulid;

static RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// Run id of this process. 26 chars, sorts by creation time.
#[inline]
pub fn get() -> &'static str {
    &RUN_ID
}
