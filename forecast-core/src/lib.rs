//! Core library for the `forecast` app.
//!
//! This crate defines:
//! - Decoding of forecast payloads into typed responses and flattened points
//! - The HTTP forecast client, its update channels and polling
//! - The weather store that owns UI-facing state
//! - Configuration handling
//!
//! It is used by `forecast-cli`, but any other front end can drive the store
//! the same way.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod model;
pub mod store;

pub use client::{
    DailyBatch, ForecastApi, ForecastClient, HourlyBatch, MAX_POLL_INTERVAL, MIN_POLL_INTERVAL,
    PollingHandle,
};
pub use config::{Config, EndpointConfig, PollingConfig};
pub use decode::{decode, parse_date, parse_timestamp};
pub use error::{DecodeError, ForecastError, NetworkError};
pub use model::{CurrentSnapshot, DailyPoint, DailySeries, ForecastResponse, HourlyPoint, HourlySeries};
pub use store::{AppState, Intent, WeatherStore};
