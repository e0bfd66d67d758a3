//! Calendar helpers for presenting windows to people.
//!
//! Everything here takes an explicit `now` so labels are reproducible; only
//! [`crate::scanner::GoodTimeWindow::label`] reaches for the wall clock.

use crate::scanner::GoodTimeWindow;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone};
use std::fmt::Display;

const DAY_FMT: &str = "%m/%d";
const TIME_FMT: &str = "%-I:%M %p";

/// `a` and `b` fall on the same calendar date in their zone.
pub fn same_day<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    a.date_naive() == b.date_naive()
}

pub fn is_today<Tz: TimeZone>(t: &DateTime<Tz>, now: &DateTime<Tz>) -> bool {
    same_day(t, now)
}

pub fn is_tomorrow<Tz: TimeZone>(t: &DateTime<Tz>, now: &DateTime<Tz>) -> bool {
    now.date_naive().succ_opt() == Some(t.date_naive())
}

/// `t` falls in the week starting at today's midnight.
///
/// Both ends get a minute of slack, so midnight seven days out still counts.
pub fn within_week<Tz: TimeZone>(t: &DateTime<Tz>, now: &DateTime<Tz>) -> bool {
    let today = trim_clock(now);
    let slack = Duration::minutes(1);
    let after_start = today
        .clone()
        .checked_sub_signed(slack)
        .map_or(true, |from| *t > from);
    let before_end = today
        .checked_add_signed(Duration::days(7) + slack)
        .map_or(true, |until| *t < until);
    after_start && before_end
}

/// Midnight at the start of `t`'s calendar day.
///
/// Falls back to `t` itself in zones where that midnight does not exist.
pub fn trim_clock<Tz: TimeZone>(t: &DateTime<Tz>) -> DateTime<Tz> {
    let midnight = t.date_naive().and_time(NaiveTime::default());
    t.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| t.clone())
}

/// Human label such as "Today at 4:27 PM" or "01/05 at 5:35 AM".
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use surf_dash_lib::time_tricks::pretty_time;
///
/// let now = Utc.with_ymd_and_hms(2021, 4, 3, 9, 0, 0).unwrap();
/// let later = Utc.with_ymd_and_hms(2021, 4, 3, 16, 27, 0).unwrap();
/// assert_eq!(pretty_time(&later, &now), "Today at 4:27 PM");
/// ```
pub fn pretty_time<Tz>(t: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let day = if is_today(t, now) {
        "Today".to_string()
    } else if is_tomorrow(t, now) {
        "Tomorrow".to_string()
    } else if within_week(t, now) {
        t.format("%A").to_string()
    } else {
        t.format(DAY_FMT).to_string()
    };
    format!("{} at {}", day, t.format(TIME_FMT))
}

/// Windows that start on the same calendar date.
#[derive(Clone, Debug, PartialEq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub windows: Vec<GoodTimeWindow>,
}

/// Fold an ordered window list into one group per calendar day in `tz`.
///
/// Consecutive windows on the same date share a group; the input order is
/// kept.
pub fn group_by_day<Tz: TimeZone>(windows: Vec<GoodTimeWindow>, tz: &Tz) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    for window in windows {
        let date = window.start().with_timezone(tz).date_naive();
        match groups.last_mut() {
            Some(group) if group.date == date => group.windows.push(window),
            _ => groups.push(DayGroup {
                date,
                windows: vec![window],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, Utc};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_pretty_time_variants() {
        // A Tuesday.
        let now = utc(1999, 1, 5, 8, 0);

        assert_eq!(pretty_time(&utc(1999, 1, 5, 16, 27), &now), "Today at 4:27 PM");
        assert_eq!(
            pretty_time(&utc(1999, 1, 6, 12, 55), &now),
            "Tomorrow at 12:55 PM"
        );
        assert_eq!(
            pretty_time(&utc(1999, 1, 8, 13, 0), &now),
            "Friday at 1:00 PM"
        );
        assert_eq!(pretty_time(&utc(1999, 1, 12, 5, 35), &now), "01/12 at 5:35 AM");
        assert_eq!(pretty_time(&utc(1998, 12, 31, 5, 35), &now), "12/31 at 5:35 AM");
    }

    #[test]
    fn test_within_week_boundaries() {
        let now = utc(2021, 4, 3, 23, 59);
        for days in 0..7 {
            let t = trim_clock(&now) + Duration::days(days);
            assert!(within_week(&t, &now), "day {days} should be within the week");
        }
        let midnight = trim_clock(&now);
        assert!(within_week(&(midnight + Duration::days(7)), &now));
        assert!(!within_week(&(midnight + Duration::days(7) + Duration::minutes(1)), &now));
        assert!(within_week(&(midnight - Duration::seconds(30)), &now));
        assert!(!within_week(&(midnight - Duration::minutes(1)), &now));
    }

    #[test]
    fn test_trim_clock_keeps_zone() {
        let pacific = FixedOffset::west_opt(7 * 3600).unwrap();
        let t = pacific.with_ymd_and_hms(2020, 10, 30, 18, 13, 0).unwrap();
        let trimmed = trim_clock(&t);
        assert_eq!(trimmed, pacific.with_ymd_and_hms(2020, 10, 30, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_same_day_depends_on_zone() {
        let a = utc(2020, 10, 31, 1, 0);
        let b = utc(2020, 10, 30, 20, 0);
        assert!(!same_day(&a, &b));

        let pacific = FixedOffset::west_opt(7 * 3600).unwrap();
        assert!(same_day(&a.with_timezone(&pacific), &b.with_timezone(&pacific)));
    }

    #[test]
    fn test_group_by_day_is_ordered_and_merged() {
        let w = |d, h| GoodTimeWindow::new(utc(2020, 10, d, h, 0), Duration::zero(), Vec::new());
        let windows = vec![w(30, 7), w(30, 15), w(31, 8), w(2, 9)];
        // Groups follow input order, not date order.
        let groups = group_by_day(windows, &Utc);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].windows.len(), 2);
        assert_eq!(groups[0].date, NaiveDate::from_ymd_opt(2020, 10, 30).unwrap());
        assert_eq!(groups[1].date, NaiveDate::from_ymd_opt(2020, 10, 31).unwrap());
        assert_eq!(groups[2].date, NaiveDate::from_ymd_opt(2020, 10, 2).unwrap());
    }

    #[test]
    fn test_group_by_day_empty() {
        assert!(group_by_day(Vec::new(), &Utc).is_empty());
    }
}
