use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

use crate::error::ForecastError;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

const DEFAULT_CURRENT_FIELDS: &[&str] = &[
    "is_day",
    "rain",
    "cloud_cover",
    "snowfall",
    "temperature_2m",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
];

const DEFAULT_HOURLY_FIELDS: &[&str] = &["temperature_2m"];

const DEFAULT_DAILY_FIELDS: &[&str] = &[
    "sunrise",
    "sunset",
    "precipitation_hours",
    "temperature_2m_max",
    "temperature_2m_min",
    "wind_speed_10m_max",
    "wind_gusts_10m_max",
    "wind_direction_10m_dominant",
    "shortwave_radiation_sum",
];

/// The fixed forecast request a client is built for.
///
/// Example TOML:
/// [endpoint]
/// latitude = 30.0626
/// longitude = 31.2497
/// timezone = "Africa/Cairo"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub current: Vec<String>,
    pub hourly: Vec<String>,
    pub daily: Vec<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            latitude: 30.0626,
            longitude: 31.2497,
            timezone: "Africa/Cairo".to_string(),
            current: to_owned_list(DEFAULT_CURRENT_FIELDS),
            hourly: to_owned_list(DEFAULT_HOURLY_FIELDS),
            daily: to_owned_list(DEFAULT_DAILY_FIELDS),
        }
    }
}

impl EndpointConfig {
    /// Build the full request URL with every query parameter baked in.
    pub fn forecast_url(&self) -> Result<Url, ForecastError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ForecastError::Configuration(format!(
                "latitude {} is outside -90..=90",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ForecastError::Configuration(format!(
                "longitude {} is outside -180..=180",
                self.longitude
            )));
        }

        let latitude = self.latitude.to_string();
        let longitude = self.longitude.to_string();
        let daily = self.daily.join(",");
        let hourly = self.hourly.join(",");
        let current = self.current.join(",");

        let mut params = vec![
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
        ];
        for (key, value) in [("daily", &daily), ("hourly", &hourly), ("current", &current)] {
            if !value.is_empty() {
                params.push((key, value.as_str()));
            }
        }
        params.push(("timezone", self.timezone.as_str()));

        let url = Url::parse_with_params(&self.base_url, &params).map_err(|e| {
            ForecastError::Configuration(format!("invalid base url '{}': {e}", self.base_url))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ForecastError::Configuration(format!(
                "unsupported scheme '{}' in '{}'",
                url.scheme(),
                self.base_url
            )));
        }

        Ok(url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub polling: PollingConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use the built-in endpoint.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "forecast", "forecast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Replace the fixed location used by future clients.
    pub fn set_location(&mut self, latitude: f64, longitude: f64, timezone: impl Into<String>) {
        self.endpoint.latitude = latitude;
        self.endpoint.longitude = longitude;
        self.endpoint.timezone = timezone.into();
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
