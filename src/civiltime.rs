use chrono::{DateTime, Datelike, LocalResult, NaiveDate, TimeDelta, TimeZone, Timelike};

use crate::Error;
use crate::transitions::{Transition, segment_at};

/// Remaining days in the year from the start of each month, with a final
/// zero entry so `table[m - 1] - table[m]` is the length of month `m`.
type MonthTable = [i32; 13];

static LEAP_YEAR: MonthTable = [
    366,
    366 - 31,
    366 - (31 + 29),
    366 - (31 + 29 + 31),
    366 - (31 + 29 + 31 + 30),
    366 - (31 + 29 + 31 + 30 + 31),
    366 - (31 + 29 + 31 + 30 + 31 + 30),
    366 - (31 + 29 + 31 + 30 + 31 + 30 + 31),
    366 - (31 + 29 + 31 + 30 + 31 + 30 + 31 + 31),
    366 - (31 + 29 + 31 + 30 + 31 + 30 + 31 + 31 + 30),
    366 - (31 + 29 + 31 + 30 + 31 + 30 + 31 + 31 + 30 + 31),
    366 - (31 + 29 + 31 + 30 + 31 + 30 + 31 + 31 + 30 + 31 + 30),
    0,
];

static COMMON_YEAR: MonthTable = [
    365,
    365 - 31,
    365 - (31 + 28),
    365 - (31 + 28 + 31),
    365 - (31 + 28 + 31 + 30),
    365 - (31 + 28 + 31 + 30 + 31),
    365 - (31 + 28 + 31 + 30 + 31 + 30),
    365 - (31 + 28 + 31 + 30 + 31 + 30 + 31),
    365 - (31 + 28 + 31 + 30 + 31 + 30 + 31 + 31),
    365 - (31 + 28 + 31 + 30 + 31 + 30 + 31 + 31 + 30),
    365 - (31 + 28 + 31 + 30 + 31 + 30 + 31 + 31 + 30 + 31),
    365 - (31 + 28 + 31 + 30 + 31 + 30 + 31 + 31 + 30 + 31 + 30),
    0,
];

fn calendar_for(year: i32) -> &'static MonthTable {
    let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    if leap { &LEAP_YEAR } else { &COMMON_YEAR }
}

fn remaining(cal: &'static MonthTable, index: i32) -> i32 {
    usize::try_from(index)
        .ok()
        .and_then(|index| cal.get(index))
        .copied()
        .unwrap_or(0)
}

fn days_in_month(cal: &'static MonthTable, month: i32) -> i32 {
    remaining(cal, month - 1) - remaining(cal, month)
}

/// Broken-down wall fields at minute granularity. Weekday 0 is Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tm {
    year: i32,
    month: i32,
    day: i32,
    hour: i32,
    minute: i32,
    weekday: i32,
}

/// Fields whose value in a shadow interval differs from the rendering it
/// repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Mask(u8);

impl Mask {
    const MINUTES: Self = Self(0x01);
    const HOURS: Self = Self(0x02);
    const DAYS: Self = Self(0x04);
    const MONTHS: Self = Self(0x08);
    const YEARS: Self = Self(0x10);

    const fn has(self, field: Self) -> bool {
        self.0 & field.0 != 0
    }

    fn set(&mut self, field: Self) {
        self.0 |= field.0;
    }
}

/// A civil field as presented to the schedule matcher. A masked value lies
/// in the repeated pass of a fall-back transition: a wildcard matches it,
/// explicit enumeration does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldValue {
    pub value: i32,
    pub masked: bool,
}

/// Date half of the shadowed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    pub year: FieldValue,
    pub month: FieldValue,
    pub day: FieldValue,
    /// 0 is Sunday. Weekdays are never masked.
    pub weekday: i32,
    /// Length of the current month.
    pub last_day: i32,
}

/// Time-of-day half of the shadowed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub hour: FieldValue,
    pub minute: FieldValue,
}

/// Date half of the wall view, always the positive calendar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallCalendar {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub weekday: i32,
    pub last_day: i32,
}

/// Time-of-day half of the wall view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub hour: i32,
    pub minute: i32,
}

/// Civil-time state valid over one stretch of constant UTC offset.
#[derive(Clone, Copy)]
struct Interval {
    tm: Tm,
    utc: i64,
    mask: Mask,
    begin: Transition,
    end: Transition,
    cal: &'static MonthTable,
}

/// A wall-clock instant under a time zone, with monotonic field-setting
/// operations.
///
/// Around a daylight-saving transition the ordinary interval is accompanied
/// by a shadow: during a fall-back change the shadow carries the repeated
/// wall hour with the repeated fields masked, and during a spring-forward
/// change it carries the artificial wall times that the clock skipped. The
/// shadow, while present, is the active interval; advancing past its bounds
/// drops back to the ordinary interval.
///
/// [`advance_minute`](Self::advance_minute) and its coarser siblings set a
/// field to a strictly greater value and rewind the finer fields. When the
/// recomputed instant leaves the active interval the state is rebuilt at
/// the boundary and the operation reports [`Error::Retry`]; the caller
/// re-queries from the new position.
#[derive(Clone)]
pub struct CivilTime<TZ: TimeZone> {
    tz: TZ,
    base: Interval,
    shadow: Option<Interval>,
}

impl<TZ: TimeZone> CivilTime<TZ> {
    /// Capture the civil time at `t` (seconds since the epoch, floored to
    /// the minute) under `tz`.
    ///
    /// # Errors
    /// [`Error::Invalid`] when `t` is not representable under the zone.
    pub fn new(tz: TZ, t: i64) -> Result<Self, Error> {
        let utc = t.div_euclid(60) * 60;
        let tm = local_tm(&tz, utc)?;
        let segment = segment_at(&tz, utc)?;

        let base = Interval {
            tm,
            utc,
            mask: Mask::default(),
            begin: segment.begin,
            end: segment.end,
            cal: calendar_for(tm.year),
        };

        let mut civil = Self {
            tz,
            base,
            shadow: None,
        };
        civil.apply_dst_change(segment.begin.off - segment.prev.off)?;
        Ok(civil)
    }

    /// A negative change at the segment boundary repeats wall time, a
    /// positive change skips it. Either way the transition period is
    /// modelled by a shadow interval whose end matches the offset in force
    /// at the start of the zone rule, so that the following transition is
    /// smooth.
    fn apply_dst_change(&mut self, change: i64) -> Result<(), Error> {
        if change == 0 {
            return Ok(());
        }

        let interval = self.base;
        let shifted = utc_fields(wall_as_utc(&interval.tm)? - change)?;

        if change < 0 {
            if interval.utc + change < interval.begin.at {
                // Repetition is masked by the previous occurrence: masked
                // time is matched by *, but not by explicit enumeration.
                let mut mask = Mask::default();
                if interval.tm.year != shifted.year {
                    mask.set(Mask::YEARS);
                }
                if interval.tm.month != shifted.month {
                    mask.set(Mask::MONTHS);
                }
                if interval.tm.day != shifted.day {
                    mask.set(Mask::DAYS);
                }
                if interval.tm.hour != shifted.hour {
                    mask.set(Mask::HOURS);
                }
                if interval.tm.minute != shifted.minute {
                    mask.set(Mask::MINUTES);
                }

                let mut shadow = interval;
                shadow.mask = mask;
                shadow.end = Transition {
                    at: interval.begin.at - change,
                    off: interval.begin.off,
                };
                shadow.begin = Transition {
                    at: interval.utc,
                    off: interval.begin.off,
                };

                // the ordinary interval becomes the second pass
                self.base.begin.at -= change;
                self.shadow = Some(shadow);
            }
        } else if interval.utc - change < interval.begin.at {
            // Skipping is modelled as artificial time describing the
            // missing period; the artificial fields are admissible values,
            // so nothing is masked.
            let mut shadow = interval;
            shadow.tm = shifted;
            shadow.cal = calendar_for(shifted.year);
            shadow.end = Transition {
                at: interval.begin.at + change,
                off: interval.begin.off,
            };
            shadow.begin = Transition {
                at: interval.utc,
                off: interval.begin.off,
            };

            self.base.begin.at = interval.utc;
            self.shadow = Some(shadow);
        }

        Ok(())
    }

    fn active(&self) -> &Interval {
        self.shadow.as_ref().unwrap_or(&self.base)
    }

    fn active_mut(&mut self) -> &mut Interval {
        self.shadow.as_mut().unwrap_or(&mut self.base)
    }

    /// The UTC instant, always a minute multiple.
    #[must_use]
    pub fn utc(&self) -> i64 {
        self.active().utc
    }

    /// Date fields for the schedule matcher, masked where shadowed.
    #[must_use]
    pub fn calendar(&self) -> Calendar {
        let interval = self.active();
        Calendar {
            year: FieldValue {
                value: interval.tm.year,
                masked: interval.mask.has(Mask::YEARS),
            },
            month: FieldValue {
                value: interval.tm.month,
                masked: interval.mask.has(Mask::MONTHS),
            },
            day: FieldValue {
                value: interval.tm.day,
                masked: interval.mask.has(Mask::DAYS),
            },
            weekday: interval.tm.weekday,
            last_day: days_in_month(interval.cal, interval.tm.month),
        }
    }

    /// Time-of-day fields for the schedule matcher, masked where shadowed.
    #[must_use]
    pub fn clock(&self) -> Clock {
        let interval = self.active();
        Clock {
            hour: FieldValue {
                value: interval.tm.hour,
                masked: interval.mask.has(Mask::HOURS),
            },
            minute: FieldValue {
                value: interval.tm.minute,
                masked: interval.mask.has(Mask::MINUTES),
            },
        }
    }

    /// Date fields as the wall clock shows them.
    #[must_use]
    pub fn wall_calendar(&self) -> WallCalendar {
        let interval = self.active();
        WallCalendar {
            year: interval.tm.year,
            month: interval.tm.month,
            day: interval.tm.day,
            weekday: interval.tm.weekday,
            last_day: days_in_month(interval.cal, interval.tm.month),
        }
    }

    /// Time-of-day fields as the wall clock shows them.
    #[must_use]
    pub fn wall_clock(&self) -> WallClock {
        let interval = self.active();
        WallClock {
            hour: interval.tm.hour,
            minute: interval.tm.minute,
        }
    }

    /// Set the minute to a strictly later value within the hour.
    ///
    /// # Errors
    /// [`Error::Invalid`] outside `[0, 59]`, [`Error::OutOfRange`] when the
    /// target does not advance the field.
    pub fn advance_minute(&mut self, minute: i32) -> Result<(), Error> {
        if !(0..=59).contains(&minute) {
            return Err(Error::Invalid);
        }
        let interval = self.active_mut();
        if minute <= interval.tm.minute {
            return Err(Error::OutOfRange);
        }
        interval.utc += i64::from(minute - interval.tm.minute) * 60;
        interval.tm.minute = minute;
        Ok(())
    }

    /// Set the hour to a strictly later value within the day, rewinding the
    /// minute.
    ///
    /// # Errors
    /// As [`advance_minute`](Self::advance_minute), plus [`Error::Retry`]
    /// when the rewound instant leaves the active interval.
    pub fn advance_hour(&mut self, hour: i32) -> Result<(), Error> {
        if !(0..=23).contains(&hour) {
            return Err(Error::Invalid);
        }
        let since = {
            let interval = self.active_mut();
            if hour <= interval.tm.hour {
                return Err(Error::OutOfRange);
            }
            let since = interval.utc;
            interval.utc += i64::from(hour - interval.tm.hour) * 3600;
            interval.tm.hour = hour;
            since
        };
        self.rewind_minute(since)
    }

    /// Set the day to a strictly later value within the month, rewinding
    /// hour and minute.
    ///
    /// # Errors
    /// As [`advance_hour`](Self::advance_hour); the day domain is capped by
    /// the current month's length.
    pub fn advance_day(&mut self, day: i32) -> Result<(), Error> {
        let (last_day, current, since) = {
            let interval = self.active();
            (
                days_in_month(interval.cal, interval.tm.month),
                interval.tm.day,
                interval.utc,
            )
        };
        if day < 1 || day > last_day {
            return Err(Error::Invalid);
        }
        if day <= current {
            return Err(Error::OutOfRange);
        }
        self.shift_days(i64::from(day - current));
        self.active_mut().tm.day = day;
        self.rewind_hour(since)
    }

    /// Set the month to a strictly later value within the year, rewinding
    /// day, hour and minute.
    ///
    /// # Errors
    /// As [`advance_hour`](Self::advance_hour).
    pub fn advance_month(&mut self, month: i32) -> Result<(), Error> {
        if !(1..=12).contains(&month) {
            return Err(Error::Invalid);
        }
        let (since, days) = {
            let interval = self.active();
            if month <= interval.tm.month {
                return Err(Error::OutOfRange);
            }
            (
                interval.utc,
                i64::from(
                    remaining(interval.cal, interval.tm.month) - remaining(interval.cal, month - 1),
                ),
            )
        };
        self.shift_days(days);
        self.active_mut().tm.month = month;
        self.rewind_day(since)
    }

    /// Set the year to a strictly later value, rewinding to January 1st
    /// 00:00.
    ///
    /// # Errors
    /// As [`advance_hour`](Self::advance_hour); years before 1900 are out
    /// of domain.
    pub fn advance_year(&mut self, year: i32) -> Result<(), Error> {
        if year < 1900 {
            return Err(Error::Invalid);
        }
        let (current, since, cal) = {
            let interval = self.active();
            if year <= interval.tm.year {
                return Err(Error::OutOfRange);
            }
            (interval.tm.year, interval.utc, interval.cal)
        };

        // Count the leap days in the half-open interval [current, year):
        // the date advances through the former year but stops at the start
        // of the latter. Computed as the difference between leap days seen
        // before each endpoint.
        let leap_days = i64::from((year - 1) / 4 - (current - 1) / 4)
            - i64::from((year - 1) / 100 - (current - 1) / 100)
            + i64::from((year - 1) / 400 - (current - 1) / 400);
        let days = 365 * i64::from(year - current) + leap_days;

        self.shift_days(days);
        self.active_mut().tm.year = year;

        // rewind with the calendar latched before the year changed, so a
        // leap day in the present month is accounted for
        self.rewind_month(since, cal)
    }

    fn shift_days(&mut self, days: i64) {
        let interval = self.active_mut();
        interval.utc += days * 86_400;
        interval.tm.weekday = ((i64::from(interval.tm.weekday) + days).rem_euclid(7)) as i32;
    }

    fn rewind_month(&mut self, since: i64, cal: &'static MonthTable) -> Result<(), Error> {
        let month = self.active().tm.month;
        self.shift_days(-i64::from(remaining(cal, month - 1)));
        self.active_mut().tm.month = 1;
        self.rewind_day(since)
    }

    fn rewind_day(&mut self, since: i64) -> Result<(), Error> {
        let day = self.active().tm.day;
        self.shift_days(-i64::from(day - 1));
        self.active_mut().tm.day = 1;
        self.rewind_hour(since)
    }

    fn rewind_hour(&mut self, since: i64) -> Result<(), Error> {
        let interval = self.active_mut();
        interval.utc -= i64::from(interval.tm.hour) * 3600;
        interval.tm.hour = 0;
        self.rewind_minute(since)
    }

    /// Recompute the UTC instant from the rewound wall fields. Stepping
    /// outside the active interval pops the shadow, or rebuilds the whole
    /// state at the boundary, and reports [`Error::Retry`].
    fn rewind_minute(&mut self, since: i64) -> Result<(), Error> {
        {
            let interval = self.active_mut();
            interval.utc -= i64::from(interval.tm.minute) * 60;
            interval.tm.minute = 0;
        }

        let (tm, begin_at, end_at) = {
            let interval = self.active();
            (interval.tm, interval.begin.at, interval.end.at)
        };

        let (time, tm) = self.utc_time(since, &tm)?;

        if time < begin_at {
            let crossing = (begin_at - 1).div_euclid(60) * 60;
            self.pop_or_rebuild(crossing)?;
            return Err(Error::Retry);
        }

        if time >= end_at {
            let crossing = (end_at + 59).div_euclid(60) * 60;
            self.pop_or_rebuild(crossing)?;
            return Err(Error::Retry);
        }

        let interval = self.active_mut();
        interval.tm = tm;
        interval.utc = time;
        interval.cal = calendar_for(tm.year);
        Ok(())
    }

    fn pop_or_rebuild(&mut self, crossing: i64) -> Result<(), Error> {
        if self.shadow.take().is_some() {
            // back to the ordinary interval, refreshed at its own start
            let at = self.base.begin.at.div_euclid(60) * 60;
            self.base.tm = local_tm(&self.tz, at)?;
            self.base.utc = at;
            self.base.cal = calendar_for(self.base.tm.year);
        } else {
            let tz = self.tz.clone();
            *self = Self::new(tz, crossing)?;
        }
        Ok(())
    }

    /// Find the UTC instant for a wall time, taking into account that
    /// daylight savings causes wall time to be skipped or repeated.
    fn utc_time(&self, since: i64, tm: &Tm) -> Result<(i64, Tm), Error> {
        let naive = naive_of(tm)?;

        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Ok((dt.timestamp(), tm_of(&dt))),
            LocalResult::Ambiguous(first, second) => {
                // Of the two passes through a repeated hour, serve the
                // first to callers that have not yet advanced beyond it
                // and the second to everyone else.
                let dt = if since < first.timestamp() {
                    first
                } else {
                    second
                };
                Ok((dt.timestamp(), tm_of(&dt)))
            }
            LocalResult::None => {
                // The wall time was skipped; slide forward to the first
                // minute that exists, as mktime(3) normalisation would.
                let mut probe = naive;
                for _ in 0..26 * 60 {
                    probe += TimeDelta::minutes(1);
                    if let Some(dt) = self.tz.from_local_datetime(&probe).earliest() {
                        return Ok((dt.timestamp(), tm_of(&dt)));
                    }
                }
                Err(Error::Invalid)
            }
        }
    }
}

fn tm_of<TZ: TimeZone>(dt: &DateTime<TZ>) -> Tm {
    Tm {
        year: dt.year(),
        month: dt.month() as i32,
        day: dt.day() as i32,
        hour: dt.hour() as i32,
        minute: dt.minute() as i32,
        weekday: dt.weekday().num_days_from_sunday() as i32,
    }
}

fn local_tm<TZ: TimeZone>(tz: &TZ, utc: i64) -> Result<Tm, Error> {
    let dt = tz.timestamp_opt(utc, 0).single().ok_or(Error::Invalid)?;
    Ok(tm_of(&dt))
}

fn naive_of(tm: &Tm) -> Result<chrono::NaiveDateTime, Error> {
    NaiveDate::from_ymd_opt(tm.year, tm.month as u32, tm.day as u32)
        .and_then(|date| date.and_hms_opt(tm.hour as u32, tm.minute as u32, 0))
        .ok_or(Error::Invalid)
}

/// The wall fields read as if they were UTC; the basis for deriving the
/// other rendering of a transition period.
fn wall_as_utc(tm: &Tm) -> Result<i64, Error> {
    Ok(naive_of(tm)?.and_utc().timestamp())
}

fn utc_fields(secs: i64) -> Result<Tm, Error> {
    let dt = DateTime::from_timestamp(secs, 0).ok_or(Error::Invalid)?;
    Ok(tm_of(&dt))
}
