//! Compute the next wall-clock instant matching a crontab(5) schedule.
//!
//! The evaluator walks the five cron fields coarse to fine over a civil
//! time that models daylight-saving transitions explicitly: wall times
//! skipped by a spring-forward change are slid past, and wall times
//! repeated by a fall-back change are admitted exactly once. An explicitly
//! enumerated field value such as `2` never matches the repeated pass of
//! an hour, while `*` matches both passes.
//!
//! Example:
//! ```
//! use chrono_tz::US::Pacific;
//! use crontime::Schedule;
//!
//! let schedule = Schedule::parse("*/5 * * * *").unwrap();
//! // Sat Jan  1 00:02:00 PST 2000
//! assert_eq!(schedule.next_from(&Pacific, 946_713_720).unwrap(), 946_713_900);
//!
//! // an instant already on the schedule is returned unchanged
//! assert_eq!(schedule.next_from(&Pacific, 946_713_900).unwrap(), 946_713_900);
//!
//! // the result can be perturbed by a bounded triangular jitter
//! let mut rng = rand::thread_rng();
//! let jittered = schedule
//!     .next_from_jittered(&Pacific, 946_713_720, 60, &mut rng)
//!     .unwrap();
//! assert!((jittered - 946_713_900).abs() <= 60);
//! ```

use core::fmt;

use chrono::TimeZone;

mod bitring;
mod civiltime;
mod jitter;
mod schedule;
mod transitions;

pub use bitring::BitRing;
pub use civiltime::{Calendar, CivilTime, Clock, FieldValue, WallCalendar, WallClock};
pub use schedule::Schedule;
pub use transitions::{Segment, Transition, segment_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Malformed expression, out-of-domain value, or an instant the zone
    /// cannot represent.
    Invalid,
    /// As [`Invalid`](Self::Invalid), naming the offending schedule field.
    InvalidField(&'static str),
    /// Advancement target not strictly beyond the current field value.
    OutOfRange,
    /// Advancement crossed a daylight-saving boundary; the civil time was
    /// rebuilt at the boundary and the query must be repeated. Consumed by
    /// the schedule search, never returned from it.
    Retry,
    /// No matching instant within the search horizon.
    NoMore,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "invalid expression"),
            Self::InvalidField(field) => write!(f, "invalid {field} field"),
            Self::OutOfRange => write!(f, "target does not advance the field"),
            Self::Retry => write!(f, "crossed a daylight-saving boundary, retry"),
            Self::NoMore => write!(f, "no matching instant within the search horizon"),
        }
    }
}

impl std::error::Error for Error {}

/// One-shot convenience: parse `expr` and return the next matching instant
/// at or after `now` under `tz`.
///
/// # Errors
/// [`Error`](enum.Error.html)
pub fn next<TZ: TimeZone>(expr: &str, tz: &TZ, now: i64) -> Result<i64, Error> {
    Schedule::parse(expr)?.next_from(tz, now)
}
