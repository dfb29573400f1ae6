use crate::Error;

/// Fixed-range set of small integers parsed from a single cron field.
///
/// The domain `[min, max]` is closed at both ends and spans fewer than 64
/// values, so membership fits one 64-bit word. A bare `*` leaves the ring
/// empty; the empty ring is the wildcard sentinel and is treated by the
/// schedule matcher as "matches everything".
///
/// Accepted field shapes:
/// * `*` any value (wildcard)
/// * `*/P` every `P`th value starting at `min`
/// * a comma-separated list of `V`, `L-R`, or `L-R/P` items
///
/// Example
/// ```
/// use crontime::BitRing;
///
/// let minutes = BitRing::new(0, 59, "*/15").unwrap();
/// assert_eq!(minutes.population(), 4);
/// assert!(minutes.contains(45));
///
/// // forward distance to the next member, wrapping once
/// assert_eq!(minutes.gap_after(45).unwrap(), 15);
/// assert_eq!(minutes.gap_after(50).unwrap(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRing {
    bits: u64,
    min: i32,
    max: i32,
}

impl BitRing {
    /// Parse `expr` into a ring over the closed domain `[min, max]`.
    ///
    /// # Errors
    /// [`Error::Invalid`] on a malformed expression, a value outside the
    /// domain, a reversed range, a zero stride, or a stride without a range.
    pub fn new(min: i32, max: i32, expr: &str) -> Result<Self, Error> {
        if max < min || max - min >= 64 {
            return Err(Error::Invalid);
        }

        let mut ring = Self { bits: 0, min, max };

        let leading_digit = expr.bytes().next().is_some_and(|byte| byte.is_ascii_digit());
        if !leading_digit {
            if expr == "*" {
                return Ok(ring);
            }
            let period = expr.strip_prefix("*/").ok_or(Error::Invalid)?;
            ring.fill(min, max, number(period)?)?;
            return Ok(ring);
        }

        for item in expr.split(',') {
            ring.item(item)?;
        }

        Ok(ring)
    }

    fn item(&mut self, item: &str) -> Result<(), Error> {
        let (range, step) = match item.split_once('/') {
            Some((range, period)) => (range, Some(period)),
            None => (item, None),
        };

        if let Some((lhs, rhs)) = range.split_once('-') {
            let period = match step {
                Some(period) => number(period)?,
                None => 1,
            };
            self.fill(number(lhs)?, number(rhs)?, period)
        } else {
            // a stride needs a range to run over
            if step.is_some() {
                return Err(Error::Invalid);
            }
            let member = number(range)?;
            self.fill(member, member, 1)
        }
    }

    fn fill(&mut self, lhs: i32, rhs: i32, period: i32) -> Result<(), Error> {
        if lhs > rhs || period < 1 || lhs < self.min || rhs > self.max {
            return Err(Error::Invalid);
        }

        let mut member = lhs;
        loop {
            self.insert(member)?;
            if period > rhs - member {
                break;
            }
            member += period;
        }

        Ok(())
    }

    /// Add one member to the ring.
    ///
    /// # Errors
    /// [`Error::Invalid`] when `member` lies outside the domain.
    pub fn insert(&mut self, member: i32) -> Result<(), Error> {
        if member < self.min || member > self.max {
            return Err(Error::Invalid);
        }
        self.bits |= 1_u64 << (member - self.min);
        Ok(())
    }

    #[must_use]
    pub const fn min(&self) -> i32 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> i32 {
        self.max
    }

    /// Number of members; zero for the wildcard sentinel.
    #[must_use]
    pub const fn population(&self) -> u32 {
        self.bits.count_ones()
    }

    /// Membership lookup; out-of-domain values are simply absent.
    #[must_use]
    pub const fn contains(&self, member: i32) -> bool {
        if member < self.min || member > self.max {
            return false;
        }
        self.bits & (1_u64 << (member - self.min)) != 0
    }

    /// Forward distance from `member` to the next member strictly after it,
    /// wrapping once past `max` to the first member. Zero when the ring is
    /// empty.
    ///
    /// # Errors
    /// [`Error::Invalid`] when `member` lies outside the domain.
    pub fn gap_after(&self, member: i32) -> Result<i32, Error> {
        if member < self.min || member > self.max {
            return Err(Error::Invalid);
        }

        let ahead = (self.bits >> (member - self.min)) >> 1_u32;
        if ahead != 0 {
            return Ok(ahead.trailing_zeros() as i32 + 1);
        }

        if self.bits == 0 {
            return Ok(0);
        }

        let first = self.bits.trailing_zeros() as i32;
        Ok(first + self.max - member + 1)
    }
}

fn number(token: &str) -> Result<i32, Error> {
    if token.is_empty() || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(Error::Invalid);
    }
    token.parse().map_err(|_| Error::Invalid)
}
