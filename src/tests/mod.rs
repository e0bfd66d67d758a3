//! Crate-level scenarios that exercise the spline, daylight index and scanner
//! together.

mod scan_tests;
