use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Weekday};

use crate::{Availability, TimeOfDay};

pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 21;
/// Upper bound accepted from configuration.
pub const MAX_LOOKAHEAD_DAYS: i64 = 365;

/// Hour ranges are half-open: morning 08-12, afternoon 12-17, evening 17-21.
/// Weekend is any hour on Saturday or Sunday.
pub fn slot_in_bucket(slot: NaiveDateTime, bucket: TimeOfDay) -> bool {
    let hour = slot.hour();
    match bucket {
        TimeOfDay::Morning => (8..12).contains(&hour),
        TimeOfDay::Afternoon => (12..17).contains(&hour),
        TimeOfDay::Evening => (17..21).contains(&hour),
        TimeOfDay::Weekend => matches!(slot.weekday(), Weekday::Sat | Weekday::Sun),
    }
}

fn within_window(slot: NaiveDateTime, now: NaiveDateTime, days: i64) -> bool {
    if slot < now {
        return false;
    }
    // An end past the representable range leaves the window open-ended.
    Duration::try_days(days)
        .and_then(|span| now.checked_add_signed(span))
        .is_none_or(|end| slot < end)
}

/// True when at least one slot inside `[now, now + lookahead_days)` fits the patient's buckets.
/// With no buckets any slot in the window fits.
pub fn has_compatible_slot(
    slots: &[NaiveDateTime],
    preferred: &BTreeSet<TimeOfDay>,
    now: NaiveDateTime,
    lookahead_days: i64,
) -> bool {
    slots
        .iter()
        .filter(|slot| within_window(**slot, now, lookahead_days))
        .any(|slot| preferred.is_empty() || preferred.iter().any(|b| slot_in_bucket(*slot, *b)))
}

pub fn count_slots_within(slots: &[NaiveDateTime], now: NaiveDateTime, days: i64) -> u32 {
    slots
        .iter()
        .filter(|slot| within_window(**slot, now, days))
        .count() as u32
}

impl Availability {
    /// Derive the 7/14-day counts from raw slot start times.
    pub fn from_slots(slots: Vec<NaiveDateTime>, now: NaiveDateTime) -> Self {
        Self {
            slots_within_7_days: count_slots_within(&slots, now, 7),
            slots_within_14_days: count_slots_within(&slots, now, 14),
            upcoming_slots: slots,
        }
    }
}
