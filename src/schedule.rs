use core::str::FromStr;

use chrono::TimeZone;
use rand::Rng;

use crate::Error;
use crate::bitring::BitRing;
use crate::civiltime::{CivilTime, FieldValue};
use crate::jitter;

/// Years searched past the starting year before an unsatisfiable schedule
/// is reported, covering two leap cycles.
const HORIZON_YEARS: i32 = 8;

/// A parsed five-field cron schedule.
///
/// ```text
/// ┌───────────── minute (0 - 59)
/// │ ┌───────────── hour (0 - 23)
/// │ │ ┌───────────── day of the month (1 - 31)
/// │ │ │ ┌───────────── month (1 - 12)
/// │ │ │ │ ┌───────────── day of the week (0 - 7, both 0 and 7 are Sunday)
/// │ │ │ │ │
/// * * * * *
/// ```
///
/// Example
/// ```
/// use chrono_tz::US::Pacific;
/// use crontime::Schedule;
///
/// let schedule = Schedule::parse("0 2 * * *").unwrap();
/// // Sat Jan  1 00:00:00 PST 2000
/// let next = schedule.next_from(&Pacific, 946_713_600).unwrap();
/// assert_eq!(next, 946_720_800); // 02:00:00 PST the same morning
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    minutes: BitRing,
    hours: BitRing,
    days: BitRing,
    months: BitRing,
    weekdays: BitRing,
    horizon_years: i32,
}

impl Schedule {
    /// Parse `MIN HOUR DOM MONTH DOW`, one separator between fields and no
    /// surrounding whitespace.
    ///
    /// # Errors
    /// [`Error::Invalid`] when the expression does not split into five
    /// fields, [`Error::InvalidField`] naming the field whose
    /// sub-expression is malformed.
    pub fn parse(expr: &str) -> Result<Self, Error> {
        let mut fields = expr.split([' ', '\t']);
        let (Some(minute), Some(hour), Some(day), Some(month), Some(weekday), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Err(Error::Invalid);
        };

        Ok(Self {
            minutes: BitRing::new(0, 59, minute).map_err(|_| Error::InvalidField("minute"))?,
            hours: BitRing::new(0, 23, hour).map_err(|_| Error::InvalidField("hour"))?,
            days: BitRing::new(1, 31, day).map_err(|_| Error::InvalidField("day of month"))?,
            months: BitRing::new(1, 12, month).map_err(|_| Error::InvalidField("month"))?,
            weekdays: weekday_ring(weekday)?,
            horizon_years: HORIZON_YEARS,
        })
    }

    /// Replace the default search horizon.
    #[must_use]
    pub const fn with_horizon(mut self, years: i32) -> Self {
        self.horizon_years = years;
        self
    }

    /// The earliest UTC instant at or after `now` whose civil rendering
    /// under `tz` satisfies every field.
    ///
    /// For non-decreasing `now` values the results are non-decreasing, and
    /// a `now` that already satisfies the schedule is returned unchanged.
    ///
    /// # Errors
    /// [`Error::NoMore`] when no instant within the search horizon
    /// satisfies the schedule; [`Error::Invalid`] when `now` is not
    /// representable under the zone.
    pub fn next_from<TZ: TimeZone>(&self, tz: &TZ, now: i64) -> Result<i64, Error> {
        let mut civil = CivilTime::new(tz.clone(), now)?;
        self.solve(&mut civil)?;
        Ok(civil.utc())
    }

    /// As [`next_from`](Self::next_from), perturbed by a triangular jitter
    /// of at most `limit` seconds, further bounded by the durations to the
    /// reference instant and to the following schedule point.
    ///
    /// # Errors
    /// As [`next_from`](Self::next_from).
    pub fn next_from_jittered<TZ: TimeZone, R: Rng>(
        &self,
        tz: &TZ,
        now: i64,
        limit: i64,
        rng: &mut R,
    ) -> Result<i64, Error> {
        let reference = now.div_euclid(60) * 60;
        let scheduled = self.next_from(tz, now)?;
        if limit == 0 {
            return Ok(scheduled);
        }

        let following = self.next_from(tz, scheduled + 60)?;
        if following <= scheduled {
            return Err(Error::Invalid);
        }

        Ok(jitter::perturb(
            rng,
            scheduled,
            scheduled - reference,
            following - scheduled,
            limit,
        ))
    }

    fn solve<TZ: TimeZone>(&self, civil: &mut CivilTime<TZ>) -> Result<(), Error> {
        let start_year = civil.wall_calendar().year;
        loop {
            match self.solve_month(civil) {
                Ok(()) => return Ok(()),
                Err(Error::Retry) => {}
                Err(err) => return Err(err),
            }

            let year = civil.wall_calendar().year;
            if year - start_year >= self.horizon_years {
                return Err(Error::NoMore);
            }
            match civil.advance_year(year + 1) {
                Ok(()) | Err(Error::Retry) => {}
                Err(err) => return Err(err),
            }
        }
    }

    fn solve_month<TZ: TimeZone>(&self, civil: &mut CivilTime<TZ>) -> Result<(), Error> {
        loop {
            if admitted(&self.months, civil.calendar().month) {
                match self.solve_day(civil) {
                    Ok(()) => return Ok(()),
                    Err(Error::Retry) => {}
                    Err(err) => return Err(err),
                }
            }

            let month = next_member(&self.months, civil.wall_calendar().month)?;
            match civil.advance_month(month) {
                Ok(()) | Err(Error::Retry) => {}
                Err(err) => return Err(err),
            }
        }
    }

    fn solve_day<TZ: TimeZone>(&self, civil: &mut CivilTime<TZ>) -> Result<(), Error> {
        loop {
            let calendar = civil.calendar();

            // Day-of-week and day-of-month are a disjunction unless both
            // are wildcards. An empty ring matches nothing here; the
            // wildcard rule is carried by the both-empty test.
            let matched = if self.weekdays.population() == 0 && self.days.population() == 0 {
                true
            } else {
                self.weekdays.contains(calendar.weekday)
                    || (!calendar.day.masked && self.days.contains(calendar.day.value))
            };

            if matched {
                match self.solve_hour(civil) {
                    Ok(()) => return Ok(()),
                    Err(Error::Retry) => {}
                    Err(err) => return Err(err),
                }
            }

            let wall = civil.wall_calendar();
            let weekday_gap = self.weekdays.gap_after(wall.weekday)?;
            let day_gap = self.days.gap_after(wall.day)?;

            let delta = match (weekday_gap, day_gap) {
                (0, 0) => 1,
                (gap, 0) | (0, gap) => gap,
                (lhs, rhs) => lhs.min(rhs),
            };

            if delta > wall.last_day - wall.day {
                return Err(Error::Retry);
            }
            match civil.advance_day(wall.day + delta) {
                Ok(()) | Err(Error::Retry) => {}
                Err(err) => return Err(err),
            }
        }
    }

    fn solve_hour<TZ: TimeZone>(&self, civil: &mut CivilTime<TZ>) -> Result<(), Error> {
        loop {
            if admitted(&self.hours, civil.clock().hour) {
                match self.solve_minute(civil) {
                    Ok(()) => return Ok(()),
                    Err(Error::Retry) => {}
                    Err(err) => return Err(err),
                }
            }

            let hour = next_member(&self.hours, civil.wall_clock().hour)?;
            match civil.advance_hour(hour) {
                Ok(()) | Err(Error::Retry) => {}
                Err(err) => return Err(err),
            }
        }
    }

    fn solve_minute<TZ: TimeZone>(&self, civil: &mut CivilTime<TZ>) -> Result<(), Error> {
        loop {
            if admitted(&self.minutes, civil.clock().minute) {
                return Ok(());
            }

            let minute = next_member(&self.minutes, civil.wall_clock().minute)?;
            match civil.advance_minute(minute) {
                Ok(()) | Err(Error::Retry) => {}
                Err(err) => return Err(err),
            }
        }
    }
}

impl FromStr for Schedule {
    type Err = Error;

    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        Self::parse(expr)
    }
}

/// The weekday field parses over `[0, 7]`; fold every member onto the
/// canonical `[0, 6]` ring, aliasing 7 to Sunday.
fn weekday_ring(expr: &str) -> Result<BitRing, Error> {
    let invalid = |_| Error::InvalidField("day of week");

    let raw = BitRing::new(0, 7, expr).map_err(invalid)?;
    let mut ring = BitRing::new(0, 6, "*").map_err(invalid)?;
    for weekday in 0..=7 {
        if raw.contains(weekday) {
            ring.insert(weekday % 7).map_err(invalid)?;
        }
    }
    Ok(ring)
}

/// A wildcard ring matches any field value, masked or not; a populated
/// ring matches only unmasked members.
fn admitted(ring: &BitRing, field: FieldValue) -> bool {
    if ring.population() == 0 {
        return true;
    }
    !field.masked && ring.contains(field.value)
}

/// The next schedule value after `current`, stepping by one when the ring
/// is a wildcard.
///
/// # Errors
/// [`Error::Retry`] when the next value wraps past the domain, bumping the
/// search one level up.
fn next_member(ring: &BitRing, current: i32) -> Result<i32, Error> {
    let mut gap = ring.gap_after(current)?;
    if gap == 0 {
        gap = 1;
    }
    if gap > ring.max() - current {
        return Err(Error::Retry);
    }
    Ok(current + gap)
}
