use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ForecastApi, ForecastClient};

/// Shortest accepted polling period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Longest accepted polling period. Keeps the first deadline representable.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Stops a polling loop. Cancelling (or dropping) the handle stops future
/// ticks; a fetch already in flight still completes and still emits.
#[derive(Debug)]
#[must_use = "dropping the handle stops polling"]
pub struct PollingHandle {
    token: CancellationToken,
}

impl PollingHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Bound a requested period to `MIN_POLL_INTERVAL..=MAX_POLL_INTERVAL`.
pub(crate) fn clamp_period(requested: Duration) -> Duration {
    let period = requested.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);
    if period != requested {
        warn!(?requested, ?period, "Polling interval out of range, clamping");
    }
    period
}

/// Fetch once per `period`, starting one period from now, until `token` is cancelled.
pub(crate) async fn run(client: ForecastClient, period: Duration, token: CancellationToken) {
    let period = clamp_period(period);
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(?period, "Polling started");

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // Not raced against the token: a tick that started finishes.
        match client.fetch().await {
            Ok(_) => debug!("Polling tick succeeded"),
            Err(err) => warn!(error = %err, "Polling tick failed; waiting for next tick"),
        }
    }

    info!("Polling stopped");
}
