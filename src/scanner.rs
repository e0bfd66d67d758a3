//! # Good Surf Window Scanner
//!
//! Walks a tide [`Spline`] in fixed steps and reports every maximal stretch
//! where the tide is inside the threshold band while there is usable light.
//!
//! ## Algorithm
//! 1. Resolve [`ThresholdOptions`] into concrete [`Thresholds`]
//! 2. Step a cursor through `[first anchor, last anchor)`, 5 minutes at a time
//! 3. At each cursor, the **tide band** test is `low ≤ height ≤ high`
//!    (inclusive, `NaN` never passes) and the **daylight** test is
//!    `sun_up ∨ dawn ∨ dusk`
//! 4. Passing cursors extend the open run; the first failing cursor closes it
//!    and emits a [`GoodTimeWindow`]. A run still open at the end of the
//!    domain is emitted as well.
//!
//! The pass never backtracks, so windows come out sorted by start time and
//! never overlap. A run of a single passing step is a window with zero
//! duration.
//!
//! ## Reasons
//! Each window states its lowest tide and when it happens, then the tide at
//! the window's start and end unless those coincide with the low.

use crate::daylight::DaylightIndex;
use crate::spline::Spline;
use crate::time_tricks::pretty_time;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Lower tide bound when none is configured, in feet. Effectively unbounded.
pub const DEFAULT_LOW_TIDE_FT: f64 = -1000.0;
/// Upper tide bound when none is configured, in feet.
pub const DEFAULT_HIGH_TIDE_FT: f64 = 1.0;
/// Distance between scan cursor positions.
pub const DEFAULT_STEP_MINUTES: i64 = 5;

const REASON_TIME_FMT: &str = "%-I:%M %p";

/// Tide bounds as supplied by a caller; unset bounds take the defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOptions {
    #[serde(default)]
    pub low_tide: Option<f64>,
    #[serde(default)]
    pub high_tide: Option<f64>,
}

impl ThresholdOptions {
    /// Fill unset bounds with [`DEFAULT_LOW_TIDE_FT`] / [`DEFAULT_HIGH_TIDE_FT`].
    pub fn resolve(self) -> Thresholds {
        Thresholds {
            low: self.low_tide.unwrap_or(DEFAULT_LOW_TIDE_FT),
            high: self.high_tide.unwrap_or(DEFAULT_HIGH_TIDE_FT),
        }
    }
}

/// Fully populated tide band, in feet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub low: f64,
    pub high: f64,
}

impl Thresholds {
    /// `low ≤ height ≤ high`. `NaN` (no known tide) is never admitted, and an
    /// inverted band admits nothing.
    pub fn admits(&self, height_ft: f64) -> bool {
        self.low <= height_ft && height_ft <= self.high
    }
}

/// A stretch of time worth paddling out for.
///
/// `start + duration` is the last passing scan sample. The human label is
/// computed on first use and then cached.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "WindowRecord", try_from = "WindowRecord")]
pub struct GoodTimeWindow {
    start: DateTime<Utc>,
    duration: Duration,
    reasons: Vec<String>,
    label: OnceLock<String>,
}

impl GoodTimeWindow {
    pub fn new(start: DateTime<Utc>, duration: Duration, reasons: Vec<String>) -> Self {
        GoodTimeWindow {
            start,
            duration,
            reasons,
            label: OnceLock::new(),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Last scan sample inside the window.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.duration
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// Label such as "Tomorrow at 6:05 AM" in the local zone, computed once.
    pub fn label(&self) -> &str {
        self.label
            .get_or_init(|| pretty_time(&self.start.with_timezone(&Local), &Local::now()))
    }

    /// Label as seen from `now` in `tz`, cached like [`GoodTimeWindow::label`].
    ///
    /// Has no effect on a window whose label was already computed.
    pub fn label_at<Tz>(&self, tz: &Tz, now: &DateTime<Tz>) -> &str
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.label.get_or_init(|| self.label_in(tz, now))
    }

    /// Label for the start time as seen from `now` in `tz`. Not cached.
    pub fn label_in<Tz>(&self, tz: &Tz, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        pretty_time(&self.start.with_timezone(tz), now)
    }
}

impl PartialEq for GoodTimeWindow {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.duration == other.duration && self.reasons == other.reasons
    }
}

impl fmt::Display for GoodTimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.label(), self.reasons.join(" and "))
    }
}

/// Wire form of [`GoodTimeWindow`].
#[derive(Serialize, Deserialize)]
struct WindowRecord {
    unix_time: i64,
    duration: i64,
    reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pretty_time: Option<String>,
}

impl From<GoodTimeWindow> for WindowRecord {
    fn from(window: GoodTimeWindow) -> Self {
        WindowRecord {
            unix_time: window.start.timestamp(),
            duration: window.duration.num_seconds(),
            reasons: window.reasons,
            pretty_time: window.label.into_inner(),
        }
    }
}

impl TryFrom<WindowRecord> for GoodTimeWindow {
    type Error = String;

    fn try_from(record: WindowRecord) -> Result<Self, Self::Error> {
        let start = Utc
            .timestamp_opt(record.unix_time, 0)
            .single()
            .ok_or_else(|| format!("unix_time {} is out of range", record.unix_time))?;
        let label = match record.pretty_time {
            Some(text) => OnceLock::from(text),
            None => OnceLock::new(),
        };
        let duration = Duration::try_seconds(record.duration)
            .ok_or_else(|| format!("duration {} is out of range", record.duration))?;
        Ok(GoodTimeWindow {
            start,
            duration,
            reasons: record.reasons,
            label,
        })
    }
}

/// Fixed-step scanner that phrases reasons in the time zone `Tz`.
#[derive(Clone, Debug)]
pub struct WindowScanner<Tz: TimeZone = Utc> {
    step: Duration,
    tz: Tz,
}

impl Default for WindowScanner<Utc> {
    fn default() -> Self {
        WindowScanner::new(Utc)
    }
}

/// The stretch of passing samples currently being extended.
struct Run {
    start: DateTime<Utc>,
    start_ft: f64,
    last: DateTime<Utc>,
    last_ft: f64,
    low_at: DateTime<Utc>,
    low_ft: f64,
}

impl Run {
    fn open(t: DateTime<Utc>, height_ft: f64) -> Self {
        Run {
            start: t,
            start_ft: height_ft,
            last: t,
            last_ft: height_ft,
            low_at: t,
            low_ft: height_ft,
        }
    }

    fn extend(&mut self, t: DateTime<Utc>, height_ft: f64) {
        self.last = t;
        self.last_ft = height_ft;
        if height_ft < self.low_ft {
            self.low_ft = height_ft;
            self.low_at = t;
        }
    }
}

impl<Tz> WindowScanner<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(tz: Tz) -> Self {
        WindowScanner {
            step: Duration::minutes(DEFAULT_STEP_MINUTES),
            tz,
        }
    }

    /// Use a different cursor step. Non-positive steps are ignored.
    pub fn with_step(mut self, step: Duration) -> Self {
        if step > Duration::zero() {
            self.step = step;
        } else {
            warn!(step_secs = step.num_seconds(), "ignoring non-positive scan step");
        }
        self
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Find every good surf window across the spline's domain.
    pub fn scan(
        &self,
        spline: &Spline,
        daylight: &DaylightIndex,
        options: ThresholdOptions,
    ) -> Vec<GoodTimeWindow> {
        let thresholds = options.resolve();
        let Some((first, last)) = spline.domain() else {
            return Vec::new();
        };

        let mut windows = Vec::new();
        let mut run: Option<Run> = None;
        let mut t = first;
        while t < last {
            let height_ft = spline.eval(t);
            if thresholds.admits(height_ft) && daylight.usable_light(t) {
                match run.as_mut() {
                    Some(open) => open.extend(t, height_ft),
                    None => run = Some(Run::open(t, height_ft)),
                }
            } else if let Some(done) = run.take() {
                windows.push(self.close(done));
            }
            t += self.step;
        }
        if let Some(done) = run.take() {
            windows.push(self.close(done));
        }

        debug!(
            windows = windows.len(),
            low = thresholds.low,
            high = thresholds.high,
            "scan complete"
        );
        windows
    }

    fn close(&self, run: Run) -> GoodTimeWindow {
        let mut reasons = vec![format!(
            "tide bottoms out at {:.2}ft at {}",
            run.low_ft,
            self.clock(run.low_at)
        )];
        if run.start != run.low_at {
            reasons.push(format!(
                "tide is {:.2}ft when the window opens at {}",
                run.start_ft,
                self.clock(run.start)
            ));
        }
        if run.last != run.low_at {
            reasons.push(format!(
                "tide is {:.2}ft when the window closes at {}",
                run.last_ft,
                self.clock(run.last)
            ));
        }
        GoodTimeWindow::new(run.start, run.last - run.start, reasons)
    }

    fn clock(&self, t: DateTime<Utc>) -> String {
        t.with_timezone(&self.tz).format(REASON_TIME_FMT).to_string()
    }
}

/// Scan with the default scanner (UTC reasons, 5-minute step).
pub fn scan(
    spline: &Spline,
    daylight: &DaylightIndex,
    options: ThresholdOptions,
) -> Vec<GoodTimeWindow> {
    WindowScanner::default().scan(spline, daylight, options)
}
