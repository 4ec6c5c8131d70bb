use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use std::{fmt::Debug, sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use crate::{
    config::EndpointConfig,
    decode::decode,
    error::{ForecastError, NetworkError, truncate_body},
    model::{DailyPoint, ForecastResponse, HourlyPoint},
};

pub mod polling;

pub use polling::{MAX_POLL_INTERVAL, MIN_POLL_INTERVAL, PollingHandle};

/// Hourly points published after a successful fetch.
pub type HourlyBatch = Arc<[HourlyPoint]>;

/// Daily points published after a successful fetch.
pub type DailyBatch = Arc<[DailyPoint]>;

const CHANNEL_CAPACITY: usize = 16;

const USER_AGENT: &str = concat!("forecast-core/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait ForecastApi: Send + Sync + Debug {
    /// Fetch the configured forecast. Derived points are published on the
    /// update channels before this returns.
    async fn fetch(&self) -> Result<ForecastResponse, ForecastError>;

    /// Fetch for a named location.
    async fn fetch_for_location(&self, location: &str) -> Result<ForecastResponse, ForecastError>;

    fn hourly_updates(&self) -> broadcast::Receiver<HourlyBatch>;

    fn daily_updates(&self) -> broadcast::Receiver<DailyBatch>;

    /// Fetch every `every`, first tick one period from now. Replaces any
    /// polling loop this client already runs.
    fn start_polling(&self, every: Duration) -> PollingHandle;
}

/// HTTP client for a single fixed forecast endpoint.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    http: Client,
    url: Url,
    hourly_tx: broadcast::Sender<HourlyBatch>,
    daily_tx: broadcast::Sender<DailyBatch>,
    polling: Arc<Mutex<Option<CancellationToken>>>,
}

impl ForecastClient {
    /// Fails with [`ForecastError::Configuration`] when the endpoint is invalid.
    pub fn new(endpoint: &EndpointConfig) -> Result<Self, ForecastError> {
        let url = endpoint.forecast_url()?;
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ForecastError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let (hourly_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (daily_tx, _) = broadcast::channel(CHANNEL_CAPACITY);

        Ok(Self {
            http,
            url,
            hourly_tx,
            daily_tx,
            polling: Arc::new(Mutex::new(None)),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn request(&self) -> Result<ForecastResponse, ForecastError> {
        debug!("Requesting forecast");

        let res = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(NetworkError::Transport)?;

        let status = res.status();
        let body = res.text().await.map_err(NetworkError::Transport)?;

        if !status.is_success() {
            return Err(NetworkError::Status {
                status,
                body: truncate_body(&body),
            }
            .into());
        }

        let response = decode(&body)?;
        self.publish(&response);

        Ok(response)
    }

    fn publish(&self, response: &ForecastResponse) {
        let hourly = response.hourly_points();
        if !hourly.is_empty() {
            let count = hourly.len();
            // No subscribers is not an error.
            let delivered = self.hourly_tx.send(HourlyBatch::from(hourly)).unwrap_or(0);
            debug!(count, delivered, "Published hourly points");
        }

        let daily = response.daily_points();
        if !daily.is_empty() {
            let count = daily.len();
            let delivered = self.daily_tx.send(DailyBatch::from(daily)).unwrap_or(0);
            debug!(count, delivered, "Published daily points");
        }
    }
}

#[async_trait]
impl ForecastApi for ForecastClient {
    async fn fetch(&self) -> Result<ForecastResponse, ForecastError> {
        self.request().await
    }

    async fn fetch_for_location(&self, location: &str) -> Result<ForecastResponse, ForecastError> {
        // Location search is not wired into the request yet; the configured
        // coordinates are always used.
        debug!(location, "Location ignored, fetching configured location");
        self.request().await
    }

    fn hourly_updates(&self) -> broadcast::Receiver<HourlyBatch> {
        self.hourly_tx.subscribe()
    }

    fn daily_updates(&self) -> broadcast::Receiver<DailyBatch> {
        self.daily_tx.subscribe()
    }

    /// Must be called from within a Tokio runtime.
    fn start_polling(&self, every: Duration) -> PollingHandle {
        let token = CancellationToken::new();
        if let Some(previous) = self.polling.lock().replace(token.clone()) {
            debug!("Cancelling previous polling loop");
            previous.cancel();
        }

        tokio::spawn(polling::run(self.clone(), every, token.clone()));
        PollingHandle::new(token)
    }
}
