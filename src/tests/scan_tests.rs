//! # Window Scan Scenarios
//!
//! End-to-end checks of the scan over realistic multi-day inputs: a
//! semidiurnal tide pattern and computed Santa Cruz sun events.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::daylight::DaylightIndex;
use crate::scanner::{scan, GoodTimeWindow, ThresholdOptions};
use crate::spline::Spline;
use crate::sun::{sun_events, SANTA_CRUZ};
use crate::{SunEvent, SunKind, TideAnchor, TideKind};

fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 10, day, hour, min, 0).unwrap()
}

/// Four days of alternating highs and lows, roughly 6h12m apart, with
/// uneven heights like a mixed semidiurnal coast.
fn semidiurnal_anchors() -> Vec<TideAnchor> {
    let heights = [5.1, 0.4, 4.2, 1.9, 5.4, -0.2, 4.0, 2.1, 5.6, -0.5, 3.9, 2.3, 5.2, 0.1, 4.4, 1.7];
    let start = at(30, 2, 17);
    heights
        .iter()
        .enumerate()
        .map(|(i, &height_ft)| TideAnchor {
            time: start + Duration::minutes(372 * i as i64),
            height_ft,
            kind: if i % 2 == 0 { TideKind::High } else { TideKind::Low },
        })
        .collect()
}

fn santa_cruz_daylight() -> DaylightIndex {
    DaylightIndex::new(sun_events(at(30, 0, 0), Duration::days(5), &SANTA_CRUZ))
}

fn passes(spline: &Spline, daylight: &DaylightIndex, options: ThresholdOptions, t: DateTime<Utc>) -> bool {
    options.resolve().admits(spline.eval(t)) && daylight.usable_light(t)
}

fn assert_scan_invariants(
    spline: &Spline,
    daylight: &DaylightIndex,
    options: ThresholdOptions,
    windows: &[GoodTimeWindow],
) {
    let step = Duration::minutes(5);
    let (_, last) = spline.domain().unwrap();

    for pair in windows.windows(2) {
        assert!(pair[0].end() < pair[1].start(), "windows overlap or are unordered");
    }

    for window in windows {
        let mut t = window.start();
        while t <= window.end() {
            assert!(passes(spline, daylight, options, t), "sample {t} inside window fails");
            t += step;
        }
        let after = window.end() + step;
        if after < last {
            assert!(
                !passes(spline, daylight, options, after),
                "sample {after} after window still passes"
            );
        }
        assert!(!window.reasons().is_empty());
    }
}

#[test]
fn daytime_dip_yields_one_window() {
    let anchors = vec![
        TideAnchor { time: at(30, 6, 0), height_ft: 4.0, kind: TideKind::High },
        TideAnchor { time: at(30, 12, 0), height_ft: 0.5, kind: TideKind::Low },
        TideAnchor { time: at(30, 18, 0), height_ft: 4.5, kind: TideKind::High },
    ];
    let spline = Spline::build(&anchors).unwrap();
    let daylight = DaylightIndex::new(vec![
        SunEvent { time: at(30, 7, 0), kind: SunKind::Sunrise },
        SunEvent { time: at(30, 19, 0), kind: SunKind::Sunset },
    ]);

    let windows = scan(&spline, &daylight, ThresholdOptions::default());

    assert_eq!(windows.len(), 1);
    let window = &windows[0];
    assert!(window.start() < at(30, 12, 0));
    assert!(window.end() > at(30, 12, 0));
    assert!(window.reasons()[0].contains("0.50ft"));
    assert!(window.reasons()[0].contains("12:00 PM"));
    assert_scan_invariants(&spline, &daylight, ThresholdOptions::default(), &windows);
}

#[test]
fn night_time_low_is_not_reported() {
    let anchors = vec![
        TideAnchor { time: at(30, 20, 0), height_ft: 4.0, kind: TideKind::High },
        TideAnchor { time: at(31, 2, 0), height_ft: -0.8, kind: TideKind::Low },
        TideAnchor { time: at(31, 8, 0), height_ft: 4.5, kind: TideKind::High },
    ];
    let spline = Spline::build(&anchors).unwrap();
    let daylight = DaylightIndex::new(vec![
        SunEvent { time: at(30, 7, 0), kind: SunKind::Sunrise },
        SunEvent { time: at(30, 18, 0), kind: SunKind::Sunset },
        SunEvent { time: at(31, 7, 0), kind: SunKind::Sunrise },
        SunEvent { time: at(31, 18, 0), kind: SunKind::Sunset },
    ]);

    assert!(scan(&spline, &daylight, ThresholdOptions::default()).is_empty());
}

#[test]
fn multi_day_scan_holds_invariants() {
    let spline = Spline::build(&semidiurnal_anchors()).unwrap();
    let daylight = santa_cruz_daylight();

    let bands = [
        ThresholdOptions::default(),
        ThresholdOptions { low_tide: Some(0.0), high_tide: Some(2.0) },
        ThresholdOptions { low_tide: Some(-0.3), high_tide: Some(0.5) },
        ThresholdOptions { low_tide: None, high_tide: Some(6.0) },
    ];
    let mut total = 0;
    for options in bands {
        let windows = scan(&spline, &daylight, options);
        assert_scan_invariants(&spline, &daylight, options, &windows);
        total += windows.len();
    }
    assert!(total > 0, "expected at least one window across the bands");
}

#[test]
fn wide_band_follows_daylight() {
    let spline = Spline::build(&semidiurnal_anchors()).unwrap();
    let daylight = santa_cruz_daylight();
    let everything = ThresholdOptions { low_tide: Some(-10.0), high_tide: Some(10.0) };

    let windows = scan(&spline, &daylight, everything);
    let (_, last) = spline.domain().unwrap();
    let whole_days: Vec<_> = windows
        .iter()
        .filter(|w| w.end() + Duration::minutes(5) < last)
        .collect();

    // Every tide passes, so each window is one day of light plus twilight.
    assert!(whole_days.len() >= 3);
    for window in whole_days {
        assert!(window.duration() > Duration::hours(10));
        assert!(window.duration() < Duration::hours(13));
    }
}

#[test]
fn inverted_thresholds_never_produce_windows() {
    let spline = Spline::build(&semidiurnal_anchors()).unwrap();
    let daylight = santa_cruz_daylight();

    for (low, high) in [(2.0, 1.0), (0.5, -0.5), (10.0, 9.99), (1.0, -1000.0)] {
        let options = ThresholdOptions { low_tide: Some(low), high_tide: Some(high) };
        assert!(scan(&spline, &daylight, options).is_empty(), "band ({low}, {high})");
    }
}

#[test]
fn no_sun_data_means_no_windows() {
    let spline = Spline::build(&semidiurnal_anchors()).unwrap();
    let dark = DaylightIndex::new(Vec::new());
    let everything = ThresholdOptions { low_tide: Some(-10.0), high_tide: Some(10.0) };

    assert!(scan(&spline, &dark, everything).is_empty());
}
