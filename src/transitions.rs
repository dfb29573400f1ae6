use chrono::{DateTime, Offset, TimeZone};

use crate::Error;

/// Probes are spaced well under the shortest stretch between real zone
/// transitions, and the scan gives up after roughly fourteen months, past
/// the longest stretch any zone with active DST rules exhibits.
const STEP: i64 = 7 * 86_400;
const HORIZON: i64 = 60 * STEP;

/// Stand-in for zones with no further transition on record.
const FOREVER: i64 = i64::MAX / 2;

/// One zone transition: the instant it takes effect and the UTC offset in
/// force from that instant, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub at: i64,
    pub off: i64,
}

/// The constant-offset segment `[begin.at, end.at)` containing an instant,
/// together with the transition bounding it from below. `prev.off` is the
/// offset in force immediately before `begin.at`, so
/// `begin.off - prev.off` is the signed daylight-saving change at the
/// segment boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub prev: Transition,
    pub begin: Transition,
    pub end: Transition,
}

/// Locate the DST segment containing `t` by probing the zone's offset and
/// bisecting each detected change to the second.
///
/// When no transition is on record at or before `t`, `prev` and `begin`
/// collapse to `(0, 0)`; when none lies ahead, `end` is a far-future
/// sentinel. Long-stable zones therefore behave as one unbounded segment.
///
/// # Errors
/// [`Error::Invalid`] when `t` is outside the instants the zone can
/// represent.
pub fn segment_at<TZ: TimeZone>(tz: &TZ, t: i64) -> Result<Segment, Error> {
    let end = match next_transition(tz, t)? {
        Some(transition) => transition,
        None => Transition {
            at: FOREVER,
            off: offset_at(tz, t)?,
        },
    };

    let Some(begin) = prior_transition(tz, t)? else {
        return Ok(Segment {
            prev: Transition { at: 0, off: 0 },
            begin: Transition { at: 0, off: 0 },
            end,
        });
    };

    let before = offset_at(tz, begin.at - 1)?;
    let prev = match prior_transition(tz, begin.at - 1)? {
        Some(transition) => transition,
        None => Transition { at: 0, off: before },
    };

    Ok(Segment { prev, begin, end })
}

fn offset_at<TZ: TimeZone>(tz: &TZ, t: i64) -> Result<i64, Error> {
    let utc = DateTime::from_timestamp(t, 0).ok_or(Error::Invalid)?;
    Ok(i64::from(
        tz.offset_from_utc_datetime(&utc.naive_utc())
            .fix()
            .local_minus_utc(),
    ))
}

/// The earliest transition strictly after `t` within the scan horizon.
fn next_transition<TZ: TimeZone>(tz: &TZ, t: i64) -> Result<Option<Transition>, Error> {
    let off = offset_at(tz, t)?;

    let mut inside = t;
    let mut outside = loop {
        let probe = inside + STEP;
        if probe - t > HORIZON {
            return Ok(None);
        }
        if offset_at(tz, probe)? == off {
            inside = probe;
        } else {
            break probe;
        }
    };

    while outside - inside > 1 {
        let mid = inside + (outside - inside) / 2;
        if offset_at(tz, mid)? == off {
            inside = mid;
        } else {
            outside = mid;
        }
    }

    Ok(Some(Transition {
        at: outside,
        off: offset_at(tz, outside)?,
    }))
}

/// The latest transition at or before `t` within the scan horizon.
fn prior_transition<TZ: TimeZone>(tz: &TZ, t: i64) -> Result<Option<Transition>, Error> {
    let off = offset_at(tz, t)?;

    let mut inside = t;
    let mut outside = loop {
        let probe = inside - STEP;
        if probe < 0 || t - probe > HORIZON {
            return Ok(None);
        }
        if offset_at(tz, probe)? == off {
            inside = probe;
        } else {
            break probe;
        }
    };

    while inside - outside > 1 {
        let mid = outside + (inside - outside) / 2;
        if offset_at(tz, mid)? == off {
            inside = mid;
        } else {
            outside = mid;
        }
    }

    Ok(Some(Transition { at: inside, off }))
}
