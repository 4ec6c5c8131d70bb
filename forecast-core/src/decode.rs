//! Decoding of raw forecast JSON and derivation of flattened point lists.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::{
    error::DecodeError,
    model::{DailyPoint, DailySeries, ForecastResponse, HourlyPoint, HourlySeries},
};

/// Offset-less forms, most precise first.
const LOCAL_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a raw forecast payload.
///
/// `latitude`, `longitude` and `timezone` are required; `current`, `hourly`
/// and `daily` decode to `None` when missing.
pub fn decode(raw: &str) -> Result<ForecastResponse, DecodeError> {
    Ok(serde_json::from_str(raw)?)
}

impl ForecastResponse {
    /// Flattened hourly points, empty when the section is absent.
    pub fn hourly_points(&self) -> Vec<HourlyPoint> {
        self.hourly.as_ref().map(HourlySeries::points).unwrap_or_default()
    }

    /// Flattened daily points, empty when the section is absent.
    pub fn daily_points(&self) -> Vec<DailyPoint> {
        self.daily.as_ref().map(DailySeries::points).unwrap_or_default()
    }
}

impl HourlySeries {
    /// Pairs `time` with `temperature`; the longer array's excess is dropped.
    pub fn points(&self) -> Vec<HourlyPoint> {
        self.time
            .iter()
            .zip(&self.temperature)
            .map(|(time, temperature)| HourlyPoint::new(time.clone(), *temperature))
            .collect()
    }
}

impl DailySeries {
    /// One point per entry of `time`. Each optional array is bounds-checked on
    /// its own, so a short array only blanks its own field.
    pub fn points(&self) -> Vec<DailyPoint> {
        self.time
            .iter()
            .enumerate()
            .map(|(idx, date)| DailyPoint {
                id: Uuid::new_v4(),
                date_iso: date.clone(),
                sunrise_iso: get(&self.sunrise, idx),
                sunset_iso: get(&self.sunset, idx),
                precip_hours: get(&self.precipitation_hours, idx),
                t_max: get(&self.temperature_2m_max, idx),
                t_min: get(&self.temperature_2m_min, idx),
                wind_speed_max: get(&self.wind_speed_10m_max, idx),
                wind_gust_max: get(&self.wind_gusts_10m_max, idx),
                wind_dir_dominant: get(&self.wind_direction_10m_dominant, idx),
                radiation: get(&self.shortwave_radiation_sum, idx),
            })
            .collect()
    }
}

fn get<T: Clone>(values: &Option<Vec<T>>, idx: usize) -> Option<T> {
    values.as_ref().and_then(|v| v.get(idx)).cloned()
}

/// Parse an ISO-8601 timestamp with a time component.
///
/// RFC 3339 strings (with offset, optionally with fractional seconds) are
/// tried first, then the offset-less forms the forecast API emits, which are
/// read as UTC wall-clock. Returns `None` when nothing matches.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    LOCAL_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parse a `yyyy-mm-dd` date as midnight UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
