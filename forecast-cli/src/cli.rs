use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use forecast_core::{
    AppState, Config, ForecastClient, Intent, MAX_POLL_INTERVAL, MIN_POLL_INTERVAL, WeatherStore,
};
use inquire::{CustomType, Text};

use crate::render::render_state;

/// Settle time before re-rendering, so hourly and daily updates from one
/// fetch land in the same frame.
const RENDER_DEBOUNCE: Duration = Duration::from_millis(50);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Weather forecast CLI")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the forecast once and print it.
    Show {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Fetch the forecast for a city (currently always the configured location).
    Location {
        city: String,

        #[arg(long)]
        json: bool,
    },

    /// Poll the forecast and re-render on every update until Ctrl-C.
    Watch {
        /// Seconds between polls; defaults to the configured interval.
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Interactively set the forecast location and polling interval.
    Configure,

    /// Print the config file location.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Show { json } => {
                let store = open_store(&config_path)?;
                fetch_once(&store, Intent::FetchCurrentWeather, json).await
            }
            Command::Location { city, json } => {
                let store = open_store(&config_path)?;
                fetch_once(&store, Intent::FetchWeatherInLocation { city }, json).await
            }
            Command::Watch { interval } => {
                let config = Config::load_from(&config_path)?;
                let interval = interval
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| config.polling.interval())
                    .clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);
                let store = store_from_config(&config)?;
                watch(&store, interval).await
            }
            Command::Configure => configure(&config_path),
            Command::ConfigPath => {
                println!("{}", config_path.display());
                Ok(())
            }
        }
    }
}

fn open_store(config_path: &Path) -> anyhow::Result<WeatherStore> {
    let config = Config::load_from(config_path)?;
    store_from_config(&config)
}

fn store_from_config(config: &Config) -> anyhow::Result<WeatherStore> {
    let client = ForecastClient::new(&config.endpoint)
        .context("Cannot build forecast client from configuration")?;
    tracing::debug!(url = %client.url(), "Forecast client ready");
    Ok(WeatherStore::new(Arc::new(client)))
}

async fn fetch_once(store: &WeatherStore, intent: Intent, json: bool) -> anyhow::Result<()> {
    let mut rx = store.subscribe();
    store.send(intent);

    let state = rx
        .wait_for(|s| !s.is_loading && (s.current_weather.is_some() || s.error.is_some()))
        .await
        .context("Weather store stopped unexpectedly")?
        .clone();

    if let Some(err) = &state.error {
        return Err(anyhow!("{}: {err}", err.user_message()));
    }

    if json {
        let out = serde_json::json!({
            "response": state.current_weather.as_deref(),
            "hourly": state.hourly_points.as_deref(),
            "daily": state.daily_points.as_deref(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", render_state(&state));
    }

    Ok(())
}

async fn watch(store: &WeatherStore, interval: Duration) -> anyhow::Result<()> {
    let mut rx = store.subscribe();

    store.send(Intent::StartPolling { interval });
    store.send(Intent::FetchCurrentWeather);
    println!("Polling every {interval:?}, press Ctrl-C to stop.");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                changed.context("Weather store stopped unexpectedly")?;
                tokio::time::sleep(RENDER_DEBOUNCE).await;
                let state = rx.borrow_and_update().clone();
                print_frame(&state);
            }
            res = &mut ctrl_c => {
                res.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    store.send(Intent::StopPolling);
    Ok(())
}

fn print_frame(state: &AppState) {
    println!("\n--- {} ---", chrono::Local::now().format("%H:%M:%S"));
    print!("{}", render_state(state));
}

fn configure(config_path: &Path) -> anyhow::Result<()> {
    let mut config = Config::load_from(config_path)?;

    let latitude = CustomType::<f64>::new("Latitude:")
        .with_default(config.endpoint.latitude)
        .with_error_message("Please enter a number")
        .prompt()?;
    let longitude = CustomType::<f64>::new("Longitude:")
        .with_default(config.endpoint.longitude)
        .with_error_message("Please enter a number")
        .prompt()?;
    let timezone = Text::new("Timezone:")
        .with_default(&config.endpoint.timezone)
        .prompt()?;
    let interval = CustomType::<u64>::new("Polling interval (seconds):")
        .with_default(config.polling.interval_secs)
        .prompt()?;

    config.set_location(latitude, longitude, timezone);
    config.polling.interval_secs = interval;

    // Refuse to save an endpoint the client would reject.
    config
        .endpoint
        .forecast_url()
        .context("Configuration not saved")?;

    config.save_to(config_path)?;
    println!("Saved configuration to {}", config_path.display());
    Ok(())
}
