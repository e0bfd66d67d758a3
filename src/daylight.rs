//! Daylight point queries over an ordered sunrise/sunset series.
//!
//! A time is "sun up" only when a sunrise and the sunset right after it
//! bracket it. Times the series does not cover are simply not daylight; the
//! index never errors.

use crate::search::bracket_index;
use crate::{SunEvent, SunKind};
use chrono::{DateTime, Duration, Utc};

/// Usable light before sunrise and after sunset.
pub const DEFAULT_TWILIGHT_MINUTES: i64 = 30;

/// Answers "is there light at `t`" for an ordered list of [`SunEvent`]s.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use surf_dash_lib::daylight::DaylightIndex;
/// use surf_dash_lib::{SunEvent, SunKind};
///
/// let day = |h| Utc.with_ymd_and_hms(2020, 10, 30, h, 0, 0).unwrap();
/// let index = DaylightIndex::new(vec![
///     SunEvent { time: day(7), kind: SunKind::Sunrise },
///     SunEvent { time: day(18), kind: SunKind::Sunset },
/// ]);
///
/// assert!(index.sun_up(day(12)));
/// assert!(!index.sun_up(day(22)));
/// ```
#[derive(Clone, Debug)]
pub struct DaylightIndex {
    events: Vec<SunEvent>,
    twilight: Duration,
}

impl DaylightIndex {
    /// Index `events`, which must be sorted ascending by time.
    pub fn new(events: Vec<SunEvent>) -> Self {
        DaylightIndex {
            events,
            twilight: Duration::minutes(DEFAULT_TWILIGHT_MINUTES),
        }
    }

    /// Replace the pre-dawn / post-dusk margin.
    pub fn with_twilight(mut self, twilight: Duration) -> Self {
        self.twilight = twilight;
        self
    }

    pub fn events(&self) -> &[SunEvent] {
        &self.events
    }

    pub fn twilight(&self) -> Duration {
        self.twilight
    }

    /// True iff `t` falls strictly between a sunrise and the sunset that
    /// immediately follows it.
    pub fn sun_up(&self, t: DateTime<Utc>) -> bool {
        let Some(i) = bracket_index(&self.events, t, |e| e.time) else {
            return false;
        };
        let Some(next) = self.events.get(i + 1) else {
            return false;
        };
        let here = &self.events[i];
        here.kind == SunKind::Sunrise
            && next.kind == SunKind::Sunset
            && here.time < t
            && t < next.time
    }

    /// The sun will be up within the twilight margin.
    pub fn dawn(&self, t: DateTime<Utc>) -> bool {
        self.sun_up(t + self.twilight)
    }

    /// The sun was up within the twilight margin.
    pub fn dusk(&self, t: DateTime<Utc>) -> bool {
        self.sun_up(t - self.twilight)
    }

    /// Sun up, or close enough to sunrise/sunset to see.
    pub fn usable_light(&self, t: DateTime<Utc>) -> bool {
        self.sun_up(t) || self.dawn(t) || self.dusk(t)
    }
}
