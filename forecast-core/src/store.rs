//! UI-facing state container.
//!
//! A single actor task owns [`AppState`]. Intents, fetch completions and
//! broadcast emissions all reach that task as messages, so every mutation is
//! applied in one place and one at a time. Consumers read the latest snapshot
//! through a `watch` channel.

use std::{sync::Arc, time::Duration};

use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc, watch,
};
use tracing::{debug, info, warn};

use crate::{
    client::{DailyBatch, ForecastApi, HourlyBatch, PollingHandle},
    error::ForecastError,
    model::ForecastResponse,
};

/// Snapshot published to the presentation layer.
///
/// Starting a fetch sets `is_loading` and clears `error`; the previous points
/// stay in place until new ones arrive, and a failure keeps them.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub current_weather: Option<Arc<ForecastResponse>>,
    pub hourly_points: Option<HourlyBatch>,
    pub daily_points: Option<DailyBatch>,
    pub is_loading: bool,
    pub error: Option<Arc<ForecastError>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    FetchCurrentWeather,
    FetchWeatherInLocation { city: String },
    StartPolling { interval: Duration },
    StopPolling,
}

type FetchOutcome = Result<ForecastResponse, ForecastError>;

/// Handle to the store actor. Cheap to clone; the actor stops once every
/// handle is dropped.
#[derive(Debug, Clone)]
pub struct WeatherStore {
    intents: mpsc::UnboundedSender<Intent>,
    state: watch::Receiver<AppState>,
}

impl WeatherStore {
    /// Subscribe to `api`'s update channels and spawn the actor.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(api: Arc<dyn ForecastApi>) -> Self {
        let hourly = api.hourly_updates();
        let daily = api.daily_updates();

        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(AppState::default());

        let actor = StoreActor {
            api,
            state: state_tx,
            polling: None,
            done_tx,
        };
        tokio::spawn(actor.run(intent_rx, done_rx, hourly, daily));

        Self {
            intents: intent_tx,
            state: state_rx,
        }
    }

    /// Submit an intent. Ignored if the actor has already stopped.
    pub fn send(&self, intent: Intent) {
        if self.intents.send(intent).is_err() {
            warn!("Weather store is no longer running; intent dropped");
        }
    }

    /// Latest published snapshot.
    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.clone()
    }
}

struct StoreActor {
    api: Arc<dyn ForecastApi>,
    state: watch::Sender<AppState>,
    polling: Option<PollingHandle>,
    done_tx: mpsc::UnboundedSender<FetchOutcome>,
}

impl StoreActor {
    async fn run(
        mut self,
        mut intents: mpsc::UnboundedReceiver<Intent>,
        mut done: mpsc::UnboundedReceiver<FetchOutcome>,
        mut hourly: broadcast::Receiver<HourlyBatch>,
        mut daily: broadcast::Receiver<DailyBatch>,
    ) {
        let mut hourly_open = true;
        let mut daily_open = true;

        loop {
            // Emissions first: a fetch publishes before it completes, so its
            // points land no later than its completion.
            tokio::select! {
                biased;
                res = hourly.recv(), if hourly_open => match res {
                    Ok(points) => self.update(|s| s.hourly_points = Some(points)),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Store lagged behind hourly updates"),
                    Err(RecvError::Closed) => hourly_open = false,
                },
                res = daily.recv(), if daily_open => match res {
                    Ok(points) => self.update(|s| s.daily_points = Some(points)),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Store lagged behind daily updates"),
                    Err(RecvError::Closed) => daily_open = false,
                },
                Some(outcome) = done.recv() => self.finish_fetch(outcome),
                intent = intents.recv() => match intent {
                    Some(intent) => self.handle(intent),
                    None => break,
                },
            }
        }

        debug!("Weather store stopped");
    }

    fn handle(&mut self, intent: Intent) {
        debug!(?intent, "Handling intent");

        match intent {
            Intent::FetchCurrentWeather => {
                self.begin_fetch();
                let api = Arc::clone(&self.api);
                let done = self.done_tx.clone();
                tokio::spawn(async move {
                    let _ = done.send(api.fetch().await);
                });
            }
            Intent::FetchWeatherInLocation { city } => {
                self.begin_fetch();
                let api = Arc::clone(&self.api);
                let done = self.done_tx.clone();
                tokio::spawn(async move {
                    let _ = done.send(api.fetch_for_location(&city).await);
                });
            }
            Intent::StartPolling { interval } => {
                info!(?interval, "Starting polling");
                self.polling = Some(self.api.start_polling(interval));
            }
            Intent::StopPolling => {
                if let Some(handle) = self.polling.take() {
                    info!("Stopping polling");
                    handle.cancel();
                }
            }
        }
    }

    fn begin_fetch(&self) {
        self.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn finish_fetch(&self, outcome: FetchOutcome) {
        match outcome {
            Ok(response) => self.update(|s| {
                s.current_weather = Some(Arc::new(response));
                s.is_loading = false;
            }),
            Err(err) => {
                warn!(error = %err, "Forecast fetch failed");
                self.update(|s| {
                    s.error = Some(Arc::new(err));
                    s.is_loading = false;
                });
            }
        }
    }

    fn update(&self, f: impl FnOnce(&mut AppState)) {
        self.state.send_modify(f);
    }
}
