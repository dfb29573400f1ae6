#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use chrono::TimeZone;
use chrono_tz::Tz;
use chrono_tz::US::Pacific;
use crontime::{CivilTime, Error};

#[test]
fn init_1970() {
    let civil = CivilTime::new(Tz::UTC, 0).unwrap();
    assert_eq!(civil.utc(), 0);

    let calendar = civil.calendar();
    assert_eq!(calendar.year.value, 1970);
    assert!(!calendar.year.masked);
    assert_eq!(calendar.month.value, 1);
    assert_eq!(calendar.day.value, 1);
    assert_eq!(calendar.weekday, 4); // Thursday
    assert_eq!(calendar.last_day, 31);

    let clock = civil.clock();
    assert_eq!(clock.hour.value, 0);
    assert_eq!(clock.minute.value, 0);
    assert!(!clock.hour.masked);
    assert!(!clock.minute.masked);
}

#[test]
fn init_2000() {
    let civil = CivilTime::new(Tz::UTC, 946_684_800).unwrap();

    let calendar = civil.calendar();
    assert_eq!(calendar.year.value, 2000);
    assert_eq!(calendar.month.value, 1);
    assert_eq!(calendar.day.value, 1);
    assert_eq!(calendar.weekday, 6); // Saturday

    let clock = civil.clock();
    assert_eq!(clock.hour.value, 0);
    assert_eq!(clock.minute.value, 0);
}

#[test]
fn init_2100() {
    let civil = CivilTime::new(Tz::UTC, 4_102_444_800).unwrap();

    let calendar = civil.calendar();
    assert_eq!(calendar.year.value, 2100);
    assert_eq!(calendar.month.value, 1);
    assert_eq!(calendar.day.value, 1);
    assert_eq!(calendar.weekday, 5); // Friday
}

#[test]
fn month_lengths() {
    // a common year, a leap year, and a century common year
    let lengths = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    for (year, february) in [(1970, 28), (2000, 29), (2100, 28)] {
        for (index, length) in lengths.iter().enumerate() {
            let month = u32::try_from(index).unwrap() + 1;
            let t = Tz::UTC
                .with_ymd_and_hms(year, month, 1, 0, 0, 0)
                .unwrap()
                .timestamp();
            let civil = CivilTime::new(Tz::UTC, t).unwrap();
            let expected = if month == 2 { february } else { *length };
            assert_eq!(civil.calendar().last_day, expected, "{year}-{month}");
        }
    }
}

#[test]
fn init_floors_to_the_minute() {
    let civil = CivilTime::new(Pacific, 949_301_938).unwrap();
    assert_eq!(civil.utc(), 949_301_880);
}

#[test]
fn advance_time() {
    let mut civil = CivilTime::new(Pacific, 949_301_880).unwrap();
    // Sun Jan 30 22:58:00 PST 2000
    assert_eq!(civil.utc(), 949_301_880);
    assert_eq!(civil.calendar().year.value, 2000);
    assert_eq!(civil.calendar().month.value, 1);
    assert_eq!(civil.calendar().day.value, 30);
    assert_eq!(civil.calendar().weekday, 0);
    assert_eq!(civil.clock().hour.value, 22);
    assert_eq!(civil.clock().minute.value, 58);

    civil.advance_minute(59).unwrap();
    // Sun Jan 30 22:59:00 PST 2000
    assert_eq!(civil.utc(), 949_301_940);
    assert_eq!(civil.clock().minute.value, 59);

    civil.advance_hour(23).unwrap();
    // Sun Jan 30 23:00:00 PST 2000
    assert_eq!(civil.utc(), 949_302_000);
    assert_eq!(civil.clock().hour.value, 23);
    assert_eq!(civil.clock().minute.value, 0);

    civil.advance_day(31).unwrap();
    // Mon Jan 31 00:00:00 PST 2000
    assert_eq!(civil.utc(), 949_305_600);
    assert_eq!(civil.calendar().day.value, 31);
    assert_eq!(civil.calendar().weekday, 1);
    assert_eq!(civil.clock().hour.value, 0);

    civil.advance_month(2).unwrap();
    // Tue Feb  1 00:00:00 PST 2000
    assert_eq!(civil.utc(), 949_392_000);
    assert_eq!(civil.calendar().month.value, 2);
    assert_eq!(civil.calendar().day.value, 1);
    assert_eq!(civil.calendar().weekday, 2);

    // advancing the year crosses the spring transition; the rebuilt state
    // presents the skipped 02:00 as artificial wall time
    assert_eq!(civil.advance_year(2001).unwrap_err(), Error::Retry);
    // Sun Apr  2 03:00:00 PDT 2000
    assert_eq!(civil.utc(), 954_669_600);
    assert_eq!(civil.calendar().month.value, 4);
    assert_eq!(civil.calendar().day.value, 2);
    assert_eq!(civil.calendar().weekday, 0);
    assert_eq!(civil.clock().hour.value, 2);
    assert!(!civil.clock().hour.masked);

    // the artificial hour is popped, leaving the real 03:00
    assert_eq!(civil.advance_year(2001).unwrap_err(), Error::Retry);
    assert_eq!(civil.utc(), 954_669_600);
    assert_eq!(civil.clock().hour.value, 3);
    assert!(!civil.clock().hour.masked);

    // next crossing is the fall transition; the repeated hour is masked
    assert_eq!(civil.advance_year(2001).unwrap_err(), Error::Retry);
    // Sun Oct 29 01:00:00 PST 2000
    assert_eq!(civil.utc(), 972_810_000);
    assert_eq!(civil.calendar().month.value, 10);
    assert_eq!(civil.calendar().day.value, 29);
    assert_eq!(civil.calendar().weekday, 0);
    assert_eq!(civil.clock().hour.value, 1);
    assert!(civil.clock().hour.masked);

    // the repeated hour is popped onto its second pass
    assert_eq!(civil.advance_year(2001).unwrap_err(), Error::Retry);
    // Sun Oct 29 02:00:00 PST 2000
    assert_eq!(civil.utc(), 972_813_600);
    assert_eq!(civil.clock().hour.value, 2);
    assert!(!civil.clock().hour.masked);

    civil.advance_year(2001).unwrap();
    // Mon Jan  1 00:00:00 PST 2001
    assert_eq!(civil.utc(), 978_336_000);
    assert_eq!(civil.calendar().year.value, 2001);
    assert_eq!(civil.calendar().month.value, 1);
    assert_eq!(civil.calendar().day.value, 1);
    assert_eq!(civil.calendar().weekday, 1);
    assert_eq!(civil.clock().hour.value, 0);
    assert_eq!(civil.clock().minute.value, 0);
}

#[test]
fn advance_in_skipped_hour() {
    let mut civil = CivilTime::new(Pacific, 954_669_600).unwrap();
    // Sun Apr  2 03:00:00 PDT 2000, presented as the skipped 02:00
    assert_eq!(civil.utc(), 954_669_600);
    assert_eq!(civil.calendar().month.value, 4);
    assert_eq!(civil.calendar().day.value, 2);
    assert_eq!(civil.calendar().weekday, 0);
    assert_eq!(civil.clock().hour.value, 2);
    assert!(!civil.clock().hour.masked);
    assert_eq!(civil.clock().minute.value, 0);

    civil.advance_minute(1).unwrap();
    assert_eq!(civil.utc(), 954_669_660);
    assert_eq!(civil.clock().hour.value, 2);
    assert_eq!(civil.clock().minute.value, 1);
}

#[test]
fn advance_in_repeated_hour() {
    let mut civil = CivilTime::new(Pacific, 972_810_000).unwrap();
    // Sun Oct 29 01:00:00 PST 2000, the second pass through 01:00
    assert_eq!(civil.utc(), 972_810_000);
    assert_eq!(civil.calendar().month.value, 10);
    assert_eq!(civil.calendar().day.value, 29);
    assert_eq!(civil.calendar().weekday, 0);
    assert_eq!(civil.clock().hour.value, 1);
    assert!(civil.clock().hour.masked);
    // the minute agrees across both passes, so it is not masked
    assert!(!civil.clock().minute.masked);

    civil.advance_minute(1).unwrap();
    assert_eq!(civil.utc(), 972_810_060);
    assert_eq!(civil.clock().minute.value, 1);
    assert!(civil.clock().hour.masked);
}

#[test]
fn advance_domain_checks() {
    // Sat Jan  1 00:00:00 UTC 2000
    let mut civil = CivilTime::new(Tz::UTC, 946_684_800).unwrap();

    assert_eq!(civil.advance_minute(-1).unwrap_err(), Error::Invalid);
    assert_eq!(civil.advance_minute(60).unwrap_err(), Error::Invalid);
    assert_eq!(civil.advance_hour(24).unwrap_err(), Error::Invalid);
    assert_eq!(civil.advance_day(0).unwrap_err(), Error::Invalid);
    assert_eq!(civil.advance_day(32).unwrap_err(), Error::Invalid);
    assert_eq!(civil.advance_month(13).unwrap_err(), Error::Invalid);
    assert_eq!(civil.advance_year(1899).unwrap_err(), Error::Invalid);

    // equal targets do not advance
    assert_eq!(civil.advance_minute(0).unwrap_err(), Error::OutOfRange);
    assert_eq!(civil.advance_hour(0).unwrap_err(), Error::OutOfRange);
    assert_eq!(civil.advance_day(1).unwrap_err(), Error::OutOfRange);
    assert_eq!(civil.advance_month(1).unwrap_err(), Error::OutOfRange);
    assert_eq!(civil.advance_year(2000).unwrap_err(), Error::OutOfRange);
}

#[test]
fn day_domain_follows_the_month() {
    // Tue Feb  1 00:00:00 UTC 2000, a leap February
    let mut civil = CivilTime::new(Tz::UTC, 949_363_200).unwrap();
    assert_eq!(civil.advance_day(30).unwrap_err(), Error::Invalid);
    civil.advance_day(29).unwrap();
    assert_eq!(civil.calendar().day.value, 29);

    // Thu Feb  1 00:00:00 UTC 2001, a common February
    let mut civil = CivilTime::new(Tz::UTC, 980_985_600).unwrap();
    assert_eq!(civil.advance_day(29).unwrap_err(), Error::Invalid);
    civil.advance_day(28).unwrap();
}

#[test]
fn rewinds_touch_every_finer_field() {
    // Sun Jan 30 22:58:00 PST 2000; advancing the month rewinds day, hour
    // and minute
    let mut civil = CivilTime::new(Pacific, 949_301_880).unwrap();
    civil.advance_month(3).unwrap();
    // Wed Mar  1 00:00:00 PST 2000
    assert_eq!(civil.utc(), 951_897_600);
    assert_eq!(civil.calendar().month.value, 3);
    assert_eq!(civil.calendar().day.value, 1);
    assert_eq!(civil.calendar().weekday, 3);
    assert_eq!(civil.clock().hour.value, 0);
    assert_eq!(civil.clock().minute.value, 0);
}
