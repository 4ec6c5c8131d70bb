use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decode::{parse_date, parse_timestamp};

/// Decoded forecast payload. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub current: Option<CurrentSnapshot>,
    pub hourly: Option<HourlySeries>,
    pub daily: Option<DailySeries>,
}

/// Instantaneous reading from the `current` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSnapshot {
    pub time: String,
    pub interval: Option<u32>,
    pub is_day: Option<u8>,
    pub rain: Option<f64>,
    pub cloud_cover: Option<u8>,
    pub snowfall: Option<f64>,
    #[serde(rename = "temperature_2m")]
    pub temperature: Option<f64>,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed: Option<f64>,
    #[serde(rename = "wind_direction_10m")]
    pub wind_direction: Option<u16>,
    #[serde(rename = "wind_gusts_10m")]
    pub wind_gusts: Option<f64>,
}

impl CurrentSnapshot {
    pub fn is_daytime(&self) -> Option<bool> {
        self.is_day.map(|flag| flag != 0)
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.time)
    }
}

/// Raw `hourly` section: parallel arrays indexed by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m")]
    pub temperature: Vec<f64>,
}

/// Raw `daily` section. Only `time` is mandatory; the other arrays may be
/// missing or shorter than `time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    pub sunrise: Option<Vec<String>>,
    pub sunset: Option<Vec<String>>,
    pub precipitation_hours: Option<Vec<f64>>,
    pub temperature_2m_max: Option<Vec<f64>>,
    pub temperature_2m_min: Option<Vec<f64>>,
    pub wind_speed_10m_max: Option<Vec<f64>>,
    pub wind_gusts_10m_max: Option<Vec<f64>>,
    pub wind_direction_10m_dominant: Option<Vec<u16>>,
    pub shortwave_radiation_sum: Option<Vec<f64>>,
}

/// One flattened hour. Equality ignores `id`.
#[derive(Debug, Clone, Serialize)]
pub struct HourlyPoint {
    pub id: Uuid,
    pub time_iso: String,
    pub temperature: f64,
}

impl HourlyPoint {
    pub fn new(time_iso: impl Into<String>, temperature: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            time_iso: time_iso.into(),
            temperature,
        }
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.time_iso)
    }
}

impl PartialEq for HourlyPoint {
    fn eq(&self, other: &Self) -> bool {
        self.time_iso == other.time_iso && self.temperature == other.temperature
    }
}

/// One flattened day. Equality ignores `id`.
#[derive(Debug, Clone, Serialize)]
pub struct DailyPoint {
    pub id: Uuid,
    pub date_iso: String,
    pub sunrise_iso: Option<String>,
    pub sunset_iso: Option<String>,
    pub precip_hours: Option<f64>,
    pub t_max: Option<f64>,
    pub t_min: Option<f64>,
    pub wind_speed_max: Option<f64>,
    pub wind_gust_max: Option<f64>,
    pub wind_dir_dominant: Option<u16>,
    pub radiation: Option<f64>,
}

impl DailyPoint {
    /// Calendar date at midnight UTC.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        parse_date(&self.date_iso)
    }

    pub fn sunrise(&self) -> Option<DateTime<Utc>> {
        self.sunrise_iso.as_deref().and_then(parse_timestamp)
    }

    pub fn sunset(&self) -> Option<DateTime<Utc>> {
        self.sunset_iso.as_deref().and_then(parse_timestamp)
    }
}

impl PartialEq for DailyPoint {
    fn eq(&self, other: &Self) -> bool {
        self.date_iso == other.date_iso
            && self.sunrise_iso == other.sunrise_iso
            && self.sunset_iso == other.sunset_iso
            && self.precip_hours == other.precip_hours
            && self.t_max == other.t_max
            && self.t_min == other.t_min
            && self.wind_speed_max == other.wind_speed_max
            && self.wind_gust_max == other.wind_gust_max
            && self.wind_dir_dominant == other.wind_dir_dominant
            && self.radiation == other.radiation
    }
}
