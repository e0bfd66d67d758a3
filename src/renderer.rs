//! # Tide Chart Rendering
//!
//! Draws the tide curve, the good surf windows on it and a daylight strip as
//! plain text, for a terminal or a log file.
//!
//! ```text
//! +4.5│                                              •
//!     │•                                           ••
//!      ...
//! +0.5│                     ****
//!      ------=============================---
//!      |     |     |     |     |     |     |
//!      10/30 06:00                   10/30 18:00
//! ```
//!
//! Curve points inside a window are drawn as `*`, others as `•`. In the strip
//! below the chart `=` marks the sun being up, `-` the twilight margin around
//! it.

use crate::daylight::DaylightIndex;
use crate::scanner::GoodTimeWindow;
use crate::spline::Spline;
use chrono::{DateTime, Duration, Utc};

const ROWS: usize = 16;
const Y_AXIS_WIDTH: usize = 6; // Space for Y-axis labels
const TIME_LABEL_FMT: &str = "%m/%d %H:%M";

/// Format a tide height with appropriate precision and sign
fn format_tide_height(tide_ft: f64) -> String {
    if tide_ft == 0.0 {
        " 0".to_string()
    } else if tide_ft.fract() == 0.0 {
        format!("{:+.0}", tide_ft)
    } else {
        format!("{:+.1}", tide_ft)
    }
}

/// Finite (min, max) of the samples, widened when the curve is flat.
fn display_bounds(samples: &[f64]) -> Option<(f64, f64)> {
    let (min, max) = samples
        .iter()
        .filter(|h| h.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &h| {
            (min.min(h), max.max(h))
        });
    if !min.is_finite() {
        return None;
    }
    if max - min < f64::EPSILON {
        Some((min - 0.5, max + 0.5))
    } else {
        Some((min, max))
    }
}

/// The instant each chart column stands for; mirrors [`Spline::sample`].
fn column_times(start: DateTime<Utc>, end: DateTime<Utc>, n: usize) -> Vec<DateTime<Utc>> {
    if n < 2 {
        return vec![start; n];
    }
    let step_ms = (end - start).num_milliseconds() / (n as i64 - 1);
    (0..n)
        .map(|i| {
            if i == n - 1 {
                end
            } else {
                start + Duration::milliseconds(step_ms * i as i64)
            }
        })
        .collect()
}

fn in_window(windows: &[GoodTimeWindow], t: DateTime<Utc>) -> bool {
    windows.iter().any(|w| w.start() <= t && t <= w.end())
}

/// Render `spline` as a `columns`-wide text chart.
///
/// Returns an empty string when the spline has no finite heights to show.
pub fn render_ascii(
    spline: &Spline,
    daylight: &DaylightIndex,
    windows: &[GoodTimeWindow],
    columns: usize,
) -> String {
    let Some((start, end)) = spline.domain() else {
        return String::new();
    };
    let samples = spline.sample(columns);
    let Some((min_ft, max_ft)) = display_bounds(&samples) else {
        return String::new();
    };
    let times = column_times(start, end, samples.len());

    let tide_to_row = |tide_ft: f64| {
        let normalized = (tide_ft - min_ft) / (max_ft - min_ft);
        ((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize
    };

    let mut grid = vec![vec![' '; samples.len() + Y_AXIS_WIDTH]; ROWS];

    // Y-axis labels
    let tide_step = if max_ft - min_ft > 4.0 { 1.0 } else { 0.5 };
    let mut current = (min_ft / tide_step).ceil() * tide_step;
    while current <= max_ft {
        let row = tide_to_row(current);
        if row < ROWS {
            let label = format!("{:<width$}", format_tide_height(current), width = Y_AXIS_WIDTH - 1);
            for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
                grid[row][i] = ch;
            }
        }
        current += tide_step;
    }
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    for (column, (&tide_ft, &t)) in samples.iter().zip(&times).enumerate() {
        if !tide_ft.is_finite() {
            continue;
        }
        let row = tide_to_row(tide_ft);
        grid[row][column + Y_AXIS_WIDTH] = if in_window(windows, t) { '*' } else { '•' };
    }

    let mut out = String::new();
    for row in grid {
        out.extend(row);
        out.push('\n');
    }

    let padding = " ".repeat(Y_AXIS_WIDTH);
    let strip: String = times
        .iter()
        .map(|&t| {
            if daylight.sun_up(t) {
                '='
            } else if daylight.usable_light(t) {
                '-'
            } else {
                ' '
            }
        })
        .collect();
    out.push_str(&format!("{}{}\n", padding, strip.trim_end()));

    // Time markers below the chart
    let time_markers: String = (0..samples.len())
        .map(|i| if i % 6 == 0 { '|' } else { ' ' })
        .collect();
    out.push_str(&format!("{}{}\n", padding, time_markers.trim_end()));

    let left = start.format(TIME_LABEL_FMT).to_string();
    let right = end.format(TIME_LABEL_FMT).to_string();
    let gap = samples.len().saturating_sub(left.len() + right.len()).max(1);
    out.push_str(&format!("{}{}{}{}\n", padding, left, " ".repeat(gap), right));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SunEvent, SunKind, TideAnchor, TideKind};
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 10, 30, h, m, 0).unwrap()
    }

    fn dip() -> Spline {
        let anchor = |time, height_ft| TideAnchor {
            time,
            height_ft,
            kind: TideKind::Low,
        };
        Spline::build(&[anchor(at(6, 0), 4.0), anchor(at(12, 0), 0.5), anchor(at(18, 0), 4.5)])
            .unwrap()
    }

    fn daylight() -> DaylightIndex {
        DaylightIndex::new(vec![
            SunEvent {
                time: at(7, 0),
                kind: SunKind::Sunrise,
            },
            SunEvent {
                time: at(17, 0),
                kind: SunKind::Sunset,
            },
        ])
    }

    fn lines(chart: &str) -> Vec<Vec<char>> {
        chart.lines().map(|l| l.chars().collect()).collect()
    }

    #[test]
    fn test_format_tide_height() {
        assert_eq!(format_tide_height(0.0), " 0");
        assert_eq!(format_tide_height(1.0), "+1");
        assert_eq!(format_tide_height(1.5), "+1.5");
        assert_eq!(format_tide_height(-1.0), "-1");
        assert_eq!(format_tide_height(-1.5), "-1.5");
    }

    #[test]
    fn test_empty_spline_renders_nothing() {
        assert_eq!(render_ascii(&Spline::default(), &daylight(), &[], 40), "");
        assert_eq!(render_ascii(&dip(), &daylight(), &[], 0), "");
    }

    #[test]
    fn test_chart_layout() {
        let chart = render_ascii(&dip(), &daylight(), &[], 49);
        let rows = lines(&chart);

        assert_eq!(rows.len(), ROWS + 3);
        // Highest point is the 18:00 high, in the last column.
        assert_eq!(rows[0][Y_AXIS_WIDTH + 48], '•');
        // Lowest point is the 12:00 low, in the middle column.
        assert_eq!(rows[ROWS - 1][Y_AXIS_WIDTH + 24], '•');
        assert!(chart.contains("10/30 06:00"));
        assert!(chart.contains("10/30 18:00"));
        assert!(!chart.contains('*'));
    }

    #[test]
    fn test_window_points_are_starred() {
        let window = GoodTimeWindow::new(at(11, 0), Duration::hours(2), Vec::new());
        let chart = render_ascii(&dip(), &daylight(), &[window], 49);
        let rows = lines(&chart);

        assert_eq!(rows[ROWS - 1][Y_AXIS_WIDTH + 24], '*');
        assert_eq!(rows[0][Y_AXIS_WIDTH + 48], '•');
        // 11:00 through 13:00 in 15 minute columns.
        assert_eq!(chart.matches('*').count(), 9);
    }

    #[test]
    fn test_daylight_strip() {
        let chart = render_ascii(&dip(), &daylight(), &[], 49);
        let strip = &lines(&chart)[ROWS];

        // Columns are 15 minutes apart starting at 06:00.
        assert_eq!(strip[Y_AXIS_WIDTH], ' ');
        assert_eq!(strip[Y_AXIS_WIDTH + 3], '-'); // 06:45, dawn
        assert_eq!(strip[Y_AXIS_WIDTH + 4], '-'); // 07:00, sunrise itself
        assert_eq!(strip[Y_AXIS_WIDTH + 5], '='); // 07:15
        assert_eq!(strip[Y_AXIS_WIDTH + 45], '-'); // 17:15, dusk
        assert_eq!(strip[Y_AXIS_WIDTH + 44], '-'); // 17:00, sunset itself
        assert_eq!(strip.len(), Y_AXIS_WIDTH + 46); // 17:30 and later are dark
    }

    #[test]
    fn test_flat_curve_is_centered_band() {
        let anchor = |time| TideAnchor {
            time,
            height_ft: 2.0,
            kind: TideKind::High,
        };
        let flat = Spline::build(&[anchor(at(6, 0)), anchor(at(12, 0))]).unwrap();
        let chart = render_ascii(&flat, &daylight(), &[], 10);
        let rows = lines(&chart);
        let mid = (ROWS - 1) / 2;
        let plotted: Vec<usize> = (0..ROWS)
            .filter(|&r| rows[r][Y_AXIS_WIDTH..].contains(&'•'))
            .collect();
        assert_eq!(plotted.len(), 1);
        assert!(plotted[0] == mid || plotted[0] == mid + 1);
    }
}
