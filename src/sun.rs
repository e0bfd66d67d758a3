//! Sunrise and sunset times for a place.
//!
//! Each UTC calendar date is handed to the NREL Solar Position Algorithm from
//! the `solar-positioning` crate with the standard sunrise/sunset horizon
//! (refraction plus the solar disc). Polar days and polar nights have no
//! sunrise/sunset pair and are left out.

use crate::{SunEvent, SunKind};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use solar_positioning::{spa, Horizon, SunriseResult};
use tracing::{debug, warn};

/// A point on the Earth, degrees. West and south are negative.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub lat: f64,
    pub lon: f64,
}

pub const SANTA_CRUZ: Place = Place {
    lat: 36.9741,
    lon: -122.0308,
};

/// TT - UT1 in seconds, close enough for the 2020s.
const DELTA_T_SECONDS: f64 = 69.0;

/// Sunrise and the sunset that follows it, for the UTC date `date` at `place`.
///
/// Returns `None` during polar day or polar night, or when the date is outside
/// the algorithm's range.
pub fn solar_day(date: NaiveDate, place: &Place) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let result = spa::sunrise_sunset_utc_for_horizon(
        date.year(),
        date.month(),
        date.day(),
        place.lat,
        place.lon,
        DELTA_T_SECONDS,
        Horizon::SunriseSunset,
    );
    let (sunrise, sunset) = match result {
        Ok(SunriseResult::RegularDay {
            sunrise, sunset, ..
        }) => (sunrise.hours(), sunset.hours()),
        Ok(SunriseResult::AllDay { .. }) | Ok(SunriseResult::AllNight { .. }) => return None,
        Err(e) => {
            warn!(%date, error = %e, "sunrise calculation failed");
            return None;
        }
    };

    let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
    let rise = midnight + hours(sunrise)?;
    let mut set = midnight + hours(sunset)?;
    // Keep the pair in order when the sunset lands on the next UTC date.
    if set <= rise {
        set += Duration::days(1);
    }
    Some((rise, set))
}

/// Ordered sun events covering `[start, start + span)` at `place`.
///
/// The list begins with the sunrise of the first solar day whose sunset is at
/// or after `start`, so a `start` in the middle of the day still sees that
/// day's light. Solar days without a sunrise/sunset are skipped.
pub fn sun_events(start: DateTime<Utc>, span: Duration, place: &Place) -> Vec<SunEvent> {
    let end = start + span;
    let mut events = Vec::new();
    let Some(mut date) = start.date_naive().pred_opt() else {
        return events;
    };
    let last = end.date_naive().succ_opt().unwrap_or(NaiveDate::MAX);

    while date <= last {
        if let Some((rise, set)) = solar_day(date, place) {
            if rise >= end {
                break;
            }
            if set >= start {
                events.push(SunEvent {
                    time: rise,
                    kind: SunKind::Sunrise,
                });
                events.push(SunEvent {
                    time: set,
                    kind: SunKind::Sunset,
                });
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    debug!(events = events.len(), lat = place.lat, lon = place.lon, "computed sun events");
    events
}

fn hours(h: f64) -> Option<Duration> {
    if !h.is_finite() {
        return None;
    }
    Duration::try_milliseconds((h * 3_600_000.0).round() as i64)
}
