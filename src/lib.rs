//! # Surf Dash Core Library
//!
//! This library turns a sparse list of NOAA tide extrema and a list of
//! sunrise/sunset events into "good surf windows": maximal stretches of time
//! where the tide sits inside a caller-chosen band while there is enough light
//! to see the water.
//!
//! ## Design Philosophy
//!
//! ### Pure Core
//! - **No hidden state**: [`spline::Spline`], [`daylight::DaylightIndex`] and
//!   [`scanner::WindowScanner`] are plain values built per request and dropped
//!   afterwards. They never touch the network, the clock or a global.
//! - **Explicit missing data**: a tide height outside the known curve is `NaN`
//!   and a time without bracketing sun events is "not daylight". Neither is an
//!   error; only malformed input (duplicate anchor times) fails construction.
//!
//! ### Temporal Resolution
//! - Tide extrema arrive a few hours apart; the curve between two of them is a
//!   single cubic with zero slope at both ends.
//! - The scanner walks that curve in 5-minute steps.
//!
//! ### Data Flow
//! 1. **Boundary**: [`tide_data`] validates NOAA predictions, [`sun`] computes
//!    sun events for a place
//! 2. **Model**: anchors → [`spline::Spline`], sun events →
//!    [`daylight::DaylightIndex`]
//! 3. **Scan**: [`scanner::WindowScanner`] emits ordered [`scanner::GoodTimeWindow`]s
//! 4. **Present**: [`time_tricks`] labels and groups windows, [`renderer`]
//!    draws a diagnostic chart
//!
//! ## Core Types
//!
//! - [`TideAnchor`]: a predicted high or low water with exact time and height
//! - [`SunEvent`]: a sunrise or sunset instant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Module declarations
pub mod cache;
pub mod config;
pub mod daylight;
pub mod renderer;
pub mod scanner;
pub mod search;
pub mod spline;
pub mod sun;
pub mod tide_data;
pub mod time_tricks;

#[cfg(test)]
mod tests;

/// Whether a tide extremum is a high or a low water.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideKind {
    High,
    Low,
}

/// A discrete tide extremum predicted for a station.
///
/// Anchors handed to [`spline::Spline::build`] must be ordered by strictly
/// increasing `time`.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use surf_dash_lib::{TideAnchor, TideKind};
///
/// let low = TideAnchor {
///     time: Utc.with_ymd_and_hms(2020, 10, 30, 13, 0, 0).unwrap(),
///     height_ft: 0.5,
///     kind: TideKind::Low,
/// };
/// assert_eq!(low.kind, TideKind::Low);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideAnchor {
    /// Instant of the extremum
    pub time: DateTime<Utc>,
    /// Height in feet above the station datum (MLLW), may be negative
    pub height_ft: f64,
    /// High or low water
    pub kind: TideKind,
}

/// Whether the sun is rising or setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SunKind {
    Sunrise,
    Sunset,
}

/// A sunrise or sunset instant.
///
/// Sequences of sun events are ordered ascending and conventionally start with
/// a sunrise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunEvent {
    pub time: DateTime<Utc>,
    pub kind: SunKind,
}

impl std::fmt::Display for SunEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            SunKind::Sunrise => "Sunrise",
            SunKind::Sunset => "Sunset",
        };
        write!(f, "{} {}", self.time.format("%d %b %y %H:%M UTC"), kind)
    }
}
