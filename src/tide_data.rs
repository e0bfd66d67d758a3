//! # NOAA Tide Prediction Boundary
//!
//! This module is where raw NOAA data enters the crate. Nothing past it sees
//! strings: every prediction is checked and turned into a [`TideAnchor`] or
//! the whole response is rejected.
//!
//! ## Data Source
//!
//! ### NOAA CO-OPS Data API
//! - **URL**: https://api.tidesandcurrents.noaa.gov/api/prod/datagetter
//! - **Product**: `predictions` at `interval=hilo` (extrema only)
//! - **Datum**: MLLW, heights in feet, times in local standard/daylight time
//! - **Format**: `{"predictions":[{"t":"2020-10-20 02:17","v":"4.080","type":"H"}]}`
//!
//! ### Pipeline
//! 1. **Query**: [`PredictionQuery::url`] names the request and doubles as the
//!    cache key
//! 2. **Cache**: [`PredictionStore`] checks its injected [`TimedCache`]
//! 3. **Fetch**: on a miss the caller-supplied fetch closure produces the body
//! 4. **Parse**: [`parse_predictions`] validates every entry
//! 5. **Store**: only bodies that parsed are cached
//!
//! ## Error Handling
//! - **NOAA errors**: `{"error":{"message":...}}` bodies become [`TideError::Api`]
//! - **Malformed entries**: bad timestamp, height or type, reported with the
//!   entry index
//! - **Fetch failures**: whatever the fetch closure returns, unchanged

use crate::cache::TimedCache;
use crate::search::bracket_index;
use crate::{TideAnchor, TideKind};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

const NOAA_URL: &str = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";
const QUERY_DATE_FMT: &str = "%Y%m%d";
const PREDICTION_TIME_FMT: &str = "%Y-%m-%d %H:%M";

/// NOAA station 9413745, Santa Cruz, Monterey Bay.
pub const SANTA_CRUZ_STATION: &str = "9413745";

/// Errors that can occur while loading tide predictions.
#[derive(Error, Debug)]
pub enum TideError {
    /// Body is not the JSON shape NOAA documents
    #[error("NOAA response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// NOAA answered with an error object instead of predictions
    #[error("NOAA error: {0}")]
    Api(String),

    /// Neither predictions nor an error were present
    #[error("NOAA response has no predictions")]
    MissingPredictions,

    #[error("prediction {index}: unparseable timestamp {value:?}")]
    BadTimestamp { index: usize, value: String },

    #[error("prediction {index}: unparseable height {value:?}")]
    BadHeight { index: usize, value: String },

    #[error("prediction {index}: unknown tide type {value:?}")]
    BadKind { index: usize, value: String },

    /// Reading the response failed
    #[error("fetch failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Deserialize)]
struct RawPrediction {
    t: String,
    v: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct RawApiError {
    message: String,
}

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    predictions: Option<Vec<RawPrediction>>,
    #[serde(default)]
    error: Option<RawApiError>,
}

/// A request for high/low predictions at one station.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredictionQuery {
    /// First local calendar day requested
    pub begin: NaiveDate,
    /// Number of days after `begin` to cover
    pub days: u32,
    /// NOAA station id, e.g. "9413745"
    pub station: String,
}

impl PredictionQuery {
    /// Full datagetter URL with parameters in a stable order.
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use surf_dash_lib::tide_data::PredictionQuery;
    ///
    /// let query = PredictionQuery {
    ///     begin: NaiveDate::from_ymd_opt(2020, 1, 5).unwrap(),
    ///     days: 0,
    ///     station: "9413745".to_string(),
    /// };
    /// assert!(query.url().contains("begin_date=20200105&datum=MLLW&end_date=20200105"));
    /// ```
    pub fn url(&self) -> String {
        let end = self
            .begin
            .checked_add_days(Days::new(u64::from(self.days)))
            .unwrap_or(self.begin);
        format!(
            "{}?begin_date={}&datum=MLLW&end_date={}&format=json&interval=hilo\
             &product=predictions&station={}&time_zone=lst_ldt&units=english",
            NOAA_URL,
            self.begin.format(QUERY_DATE_FMT),
            end.format(QUERY_DATE_FMT),
            self.station
        )
    }
}

/// Decode a NOAA hilo response whose local times are in `tz`.
///
/// Times that fall in a daylight-saving gap are rejected; times in the
/// repeated hour resolve to the earlier instant.
pub fn parse_predictions<Tz: TimeZone>(body: &[u8], tz: &Tz) -> Result<Vec<TideAnchor>, TideError> {
    let response: RawResponse = serde_json::from_slice(body)?;
    if let Some(err) = response.error {
        return Err(TideError::Api(err.message));
    }
    let raw = response.predictions.ok_or(TideError::MissingPredictions)?;

    raw.into_iter()
        .enumerate()
        .map(|(index, p)| parse_one(index, p, tz))
        .collect()
}

fn parse_one<Tz: TimeZone>(index: usize, p: RawPrediction, tz: &Tz) -> Result<TideAnchor, TideError> {
    let time = NaiveDateTime::parse_from_str(p.t.trim(), PREDICTION_TIME_FMT)
        .ok()
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| TideError::BadTimestamp {
            index,
            value: p.t.clone(),
        })?;

    let height_ft = p
        .v
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|h| h.is_finite())
        .ok_or_else(|| TideError::BadHeight {
            index,
            value: p.v.clone(),
        })?;

    // NOAA marks higher-high / lower-low water as "HH" / "LL" at some stations.
    let kind = match p.kind.trim() {
        "H" | "HH" => TideKind::High,
        "L" | "LL" => TideKind::Low,
        _ => {
            return Err(TideError::BadKind {
                index,
                value: p.kind.clone(),
            })
        }
    };

    Ok(TideAnchor {
        time,
        height_ft,
        kind,
    })
}

/// Anchors up to and including the last one at or before `limit`.
pub fn truncate_to(anchors: &[TideAnchor], limit: DateTime<Utc>) -> &[TideAnchor] {
    match bracket_index(anchors, limit, |a| a.time) {
        Some(last) => &anchors[..=last],
        None => &[],
    }
}

/// Cache-first loader for predictions.
///
/// The cache is injected so several stores (or a server and a background job)
/// can share one.
#[derive(Clone)]
pub struct PredictionStore {
    cache: Arc<TimedCache<Vec<u8>>>,
}

impl PredictionStore {
    pub fn new(cache: Arc<TimedCache<Vec<u8>>>) -> Self {
        PredictionStore { cache }
    }

    /// Predictions for `query`, fetching the body with `fetch(url)` only when
    /// the cache has no live copy.
    ///
    /// # Errors
    /// Fetch errors and parse errors propagate unchanged. A body that fails to
    /// parse is not cached.
    pub fn load<Tz, F>(
        &self,
        query: &PredictionQuery,
        tz: &Tz,
        fetch: F,
    ) -> Result<Vec<TideAnchor>, TideError>
    where
        Tz: TimeZone,
        F: FnOnce(&str) -> Result<Vec<u8>, TideError>,
    {
        let url = query.url();
        if let Some(body) = self.cache.get(&url) {
            debug!(%url, "prediction cache hit");
            return parse_predictions(&body, tz);
        }

        let body = fetch(&url)?;
        let anchors = parse_predictions(&body, tz)?;
        info!(station = %query.station, anchors = anchors.len(), "loaded tide predictions");
        self.cache.set(&url, body);
        Ok(anchors)
    }
}
