//! # Continuous Tide Curve
//!
//! NOAA publishes only the extrema of the tide: a time and height for each
//! high and low water. This module links consecutive extrema with one cubic
//! each, producing a curve that can be evaluated at any instant between the
//! first and last anchor.
//!
//! ## Segment Shape
//!
//! Between anchors `(0, h1)` and `(Δ, h2)` the cubic
//! `p(x) = a·x³ + b·x² + c·x + d` satisfies:
//! - `p(0) = h1`, `p(Δ) = h2`
//! - `p'(0) = 0`, `p'(Δ) = 0`
//!
//! Tide height has zero rate of change at an extremum, so the S-shaped
//! segments join with matching (zero) slope at every anchor without a global
//! spline solve. Solving the four conditions gives:
//! ```text
//! a = -2·(h2 - h1) / Δ³
//! b =  3·(h2 - h1) / Δ²
//! c =  0
//! d =  h1
//! ```
//!
//! ## Relative Coordinates
//! `x` is measured in seconds from the segment's own start, never from the
//! Unix epoch. With epoch seconds (~1.6e9) the cubic term would be ~4e27 and
//! the anchor heights would vanish in rounding.
//!
//! ## Undefined Regions
//! Outside `[first anchor, last anchor]` the curve has no value and
//! [`Spline::eval`] returns `NaN`. Callers treat that as "no known tide".

use crate::search::bracket_index;
use crate::TideAnchor;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors raised while building a [`Spline`] from anchors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplineError {
    /// Anchor `index` does not come strictly after anchor `index - 1`.
    #[error("degenerate segment: anchor {index} at {at} does not follow the previous anchor")]
    DegenerateSegment { index: usize, at: DateTime<Utc> },

    /// Anchor `index` has a NaN or infinite height.
    #[error("anchor {index} has a non-finite height")]
    NonFiniteHeight { index: usize },
}

/// One cubic piece of the tide curve, valid on `[start, end]`.
///
/// Serializes as `{start_unix, end_unix, a, b, c, d}` so a client can redraw
/// the curve without re-fetching the anchors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CurveSegment {
    #[serde(rename = "start_unix", with = "chrono::serde::ts_seconds")]
    start: DateTime<Utc>,
    #[serde(rename = "end_unix", with = "chrono::serde::ts_seconds")]
    end: DateTime<Utc>,
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl CurveSegment {
    /// Solve the zero-slope cubic through `(start, h1)` and `(end, h2)`.
    ///
    /// `end` must be strictly after `start`; [`Spline::build`] checks this
    /// before calling.
    fn between(start: DateTime<Utc>, h1: f64, end: DateTime<Utc>, h2: f64) -> Self {
        let span = xrel(start, end);
        let rise = h2 - h1;
        CurveSegment {
            start,
            end,
            a: -2.0 * rise / span.powi(3),
            b: 3.0 * rise / span.powi(2),
            c: 0.0,
            d: h1,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Cubic coefficients `(a, b, c, d)` in segment-relative seconds.
    pub fn coefficients(&self) -> (f64, f64, f64, f64) {
        (self.a, self.b, self.c, self.d)
    }

    /// Height at `t`, or `NaN` when `t` is outside `[start, end]`.
    pub fn eval(&self, t: DateTime<Utc>) -> f64 {
        if t < self.start || t > self.end {
            return f64::NAN;
        }
        let x = xrel(self.start, t);
        ((self.a * x + self.b) * x + self.c) * x + self.d
    }
}

/// Piecewise-cubic tide curve covering `[first anchor, last anchor]`.
///
/// Built once from an anchor list and immutable afterwards.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use surf_dash_lib::spline::Spline;
/// use surf_dash_lib::{TideAnchor, TideKind};
///
/// let t0 = Utc.with_ymd_and_hms(2021, 4, 3, 10, 30, 0).unwrap();
/// let anchors = [
///     TideAnchor { time: t0, height_ft: 4.0, kind: TideKind::High },
///     TideAnchor { time: t0 + Duration::hours(6), height_ft: 0.0, kind: TideKind::Low },
/// ];
/// let spline = Spline::build(&anchors).unwrap();
///
/// assert!((spline.eval(t0 + Duration::hours(3)) - 2.0).abs() < 1e-9);
/// assert!(spline.eval(t0 - Duration::hours(1)).is_nan());
/// ```
///
/// The JSON form is output only. Segments come from [`Spline::build`] and
/// nowhere else:
/// ```compile_fail
/// let _: surf_dash_lib::spline::Spline = serde_json::from_str("[]").unwrap();
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Spline {
    segments: Vec<CurveSegment>,
}

impl Spline {
    /// Link consecutive anchors with zero-slope cubics.
    ///
    /// Fewer than two anchors is not an error: the result is an empty spline
    /// that evaluates to `NaN` everywhere.
    ///
    /// # Errors
    /// - [`SplineError::DegenerateSegment`] when two consecutive anchors share
    ///   a timestamp or go backwards in time
    /// - [`SplineError::NonFiniteHeight`] when an anchor height is NaN/infinite
    pub fn build(anchors: &[TideAnchor]) -> Result<Self, SplineError> {
        if anchors.len() < 2 {
            debug!(anchors = anchors.len(), "too few anchors, spline is empty");
            return Ok(Spline::default());
        }
        if let Some(index) = anchors.iter().position(|a| !a.height_ft.is_finite()) {
            return Err(SplineError::NonFiniteHeight { index });
        }

        let mut segments = Vec::with_capacity(anchors.len() - 1);
        for (i, pair) in anchors.windows(2).enumerate() {
            let (from, to) = (&pair[0], &pair[1]);
            if to.time <= from.time {
                return Err(SplineError::DegenerateSegment {
                    index: i + 1,
                    at: to.time,
                });
            }
            segments.push(CurveSegment::between(
                from.time,
                from.height_ft,
                to.time,
                to.height_ft,
            ));
        }

        debug!(segments = segments.len(), "built tide spline");
        Ok(Spline { segments })
    }

    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First and last anchor times, or `None` for an empty spline.
    pub fn domain(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;
        Some((first.start, last.end))
    }

    /// Tide height at `t`, or `NaN` outside the spline's domain.
    pub fn eval(&self, t: DateTime<Utc>) -> f64 {
        match bracket_index(&self.segments, t, |s| s.start) {
            Some(i) => self.segments[i].eval(t),
            None => f64::NAN,
        }
    }

    /// `n` evenly spaced heights across the domain, endpoints included.
    ///
    /// Meant for charts and diagnostics. Returns an empty vector for an empty
    /// spline or `n == 0`.
    pub fn sample(&self, n: usize) -> Vec<f64> {
        let Some((start, end)) = self.domain() else {
            return Vec::new();
        };
        match n {
            0 => Vec::new(),
            1 => vec![self.eval(start)],
            _ => {
                let step_ms = (end - start).num_milliseconds() / (n as i64 - 1);
                (0..n)
                    .map(|i| {
                        // Pin the last sample so rounding never lands past `end`.
                        let t = if i == n - 1 {
                            end
                        } else {
                            start + Duration::milliseconds(step_ms * i as i64)
                        };
                        self.eval(t)
                    })
                    .collect()
            }
        }
    }
}

/// Seconds from `origin` to `t`, at millisecond resolution.
fn xrel(origin: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    (t - origin).num_milliseconds() as f64 / 1000.0
}
