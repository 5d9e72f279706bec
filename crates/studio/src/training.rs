//! Retraining job start and status polling.
//!
//! [`TrainingJobMonitor`] drives `Idle -> Starting -> Running ->
//! Completed | Failed`. Once the start call succeeds it spawns one polling
//! task that fetches `/retrain/status` every `poll_interval` until the
//! service reports completion or the monitor is torn down. Poll failures
//! are logged and polling continues at the same cadence.
//!
//! Teardown is synchronous: it cancels the polling task, and every state
//! write made on behalf of a poll or start response is checked against the
//! teardown flag under the same lock, so a response that lands after
//! teardown is discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dreamcanvas_client::models::{TrainingJobSnapshot, TrainingStatusReport};
use dreamcanvas_client::{ApiError, ImageApi};
use dreamcanvas_core::training::{Hyperparameters, TrainingProgress, TrainingStatus};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::StudioError;
use crate::notify::{Notification, Notifier};

const START_FALLBACK: &str = "Failed to start training";
const POLL_FALLBACK: &str = "Failed to fetch training status";
const POLLER_DIED: &str = "Training status polling stopped unexpectedly";

/// Used in place of a zero poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Snapshot published by [`TrainingJobMonitor`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingState {
    pub status: TrainingStatus,
    pub progress: TrainingProgress,
    /// Parameters of the current (or last) run.
    pub hyperparameters: Option<Hyperparameters>,
    /// Response of the start call.
    pub job: Option<TrainingJobSnapshot>,
    /// Most recent successful poll.
    pub last_report: Option<TrainingStatusReport>,
    /// Message of the last start failure.
    pub error: Option<String>,
}

impl TrainingState {
    /// `true` while a run is starting or running.
    pub fn is_training(&self) -> bool {
        self.status.is_active()
    }
}

// ---------------------------------------------------------------------------
// Shared internals
// ---------------------------------------------------------------------------

struct Poller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Lifecycle {
    /// Incremented on every start; polls from an older run are ignored.
    run_id: u64,
    poller: Option<Poller>,
    torn_down: bool,
}

struct Shared {
    api: Arc<dyn ImageApi>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<TrainingState>,
    lifecycle: Mutex<Lifecycle>,
    poll_interval: Duration,
}

impl Shared {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn teardown(&self) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.torn_down {
            return;
        }
        lifecycle.torn_down = true;
        if let Some(poller) = lifecycle.poller.take() {
            poller.cancel.cancel();
            poller.handle.abort();
            tracing::info!(run_id = lifecycle.run_id, "Training status polling cancelled");
        }
    }

    /// Drop a polling task that exited without reaching a terminal state
    /// (it panicked) and fail the run it was tracking.
    fn reap_dead_poller(&self, lifecycle: &mut Lifecycle) {
        lifecycle.poller = None;
        let mut failed = false;
        self.state.send_if_modified(|s| {
            failed = s.status.is_active();
            if failed {
                s.status = TrainingStatus::Failed;
                s.error = Some(POLLER_DIED.to_string());
            }
            failed
        });
        if failed {
            tracing::error!(run_id = lifecycle.run_id, "{POLLER_DIED}");
        }
    }

    /// Apply one poll result. Returns `true` when polling should stop.
    fn apply_poll(
        &self,
        run_id: u64,
        cancel: &CancellationToken,
        result: Result<TrainingStatusReport, ApiError>,
    ) -> bool {
        let mut lifecycle = self.lifecycle();
        if cancel.is_cancelled() || lifecycle.torn_down || lifecycle.run_id != run_id {
            tracing::debug!(run_id, "Discarding training status received after cancellation");
            return true;
        }

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    run_id,
                    error = %e.display_message(POLL_FALLBACK),
                    "Training status poll failed, will retry",
                );
                return false;
            }
        };

        let completed = report.completed;
        tracing::debug!(
            run_id,
            progress = ?report.progress,
            epoch = ?report.current_epoch,
            loss = ?report.current_loss,
            completed,
            "Training status polled",
        );
        self.state.send_modify(|s| {
            s.progress
                .merge(report.current_epoch, report.current_loss, report.progress);
            if completed {
                s.progress.complete();
                s.status = TrainingStatus::Completed;
            }
            s.last_report = Some(report);
        });

        if completed {
            lifecycle.poller = None;
            drop(lifecycle);
            tracing::info!(run_id, "Training completed");
            self.notifier.notify(Notification::success(
                "Training Complete",
                "The model has been successfully retrained",
            ));
        }
        completed
    }
}

/// Poll until completion or cancellation.
async fn poll_loop(shared: Arc<Shared>, run_id: u64, cancel: CancellationToken) {
    let interval = shared.poll_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        run_id,
        interval_ms = interval.as_millis() as u64,
        "Training status polling started",
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = shared.api.training_status() => result,
        };

        if shared.apply_poll(run_id, &cancel, result) {
            break;
        }
    }

    tracing::debug!(run_id, "Training status polling loop exited");
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

pub struct TrainingJobMonitor {
    shared: Arc<Shared>,
}

impl TrainingJobMonitor {
    /// A zero `poll_interval` is replaced by [`DEFAULT_POLL_INTERVAL`].
    pub fn new(
        api: Arc<dyn ImageApi>,
        notifier: Arc<dyn Notifier>,
        poll_interval: Duration,
    ) -> Self {
        let poll_interval = if poll_interval.is_zero() {
            tracing::warn!(
                default_secs = DEFAULT_POLL_INTERVAL.as_secs(),
                "Zero training poll interval, using default",
            );
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };
        Self {
            shared: Arc::new(Shared {
                api,
                notifier,
                state: watch::Sender::new(TrainingState::default()),
                lifecycle: Mutex::new(Lifecycle::default()),
                poll_interval,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TrainingState> {
        self.shared.state.subscribe()
    }

    pub fn state(&self) -> TrainingState {
        self.shared.state.borrow().clone()
    }

    pub fn poll_interval(&self) -> Duration {
        self.shared.poll_interval
    }

    /// Whether a polling task is currently alive.
    pub fn is_polling(&self) -> bool {
        self.shared
            .lifecycle()
            .poller
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }

    /// Start a retraining run.
    ///
    /// Only valid from `Idle`, `Completed` or `Failed`; otherwise returns
    /// [`StudioError::Busy`] without a network call. Progress is reset and
    /// the status moves to `Starting` before the call is dispatched.
    pub async fn start(&self, params: Hyperparameters) -> Result<TrainingJobSnapshot, StudioError> {
        let run_id = {
            let mut lifecycle = self.shared.lifecycle();
            if lifecycle.torn_down {
                return Err(StudioError::Disposed);
            }
            if lifecycle.poller.as_ref().is_some_and(|p| p.handle.is_finished()) {
                self.shared.reap_dead_poller(&mut lifecycle);
            }
            let status = self.shared.state.borrow().status;
            if !status.can_start() || lifecycle.poller.is_some() {
                tracing::debug!(?status, "Training already in progress, ignoring start");
                return Err(StudioError::Busy);
            }
            lifecycle.run_id += 1;
            self.shared.state.send_modify(|s| {
                *s = TrainingState {
                    status: TrainingStatus::Starting,
                    progress: TrainingProgress::for_run(params.num_epochs),
                    hyperparameters: Some(params),
                    ..TrainingState::default()
                };
            });
            lifecycle.run_id
        };

        tracing::info!(
            run_id,
            learning_rate = params.learning_rate,
            num_epochs = params.num_epochs,
            batch_size = params.batch_size,
            "Starting model retraining",
        );

        let result = self.shared.api.start_retraining(&params).await;

        let mut lifecycle = self.shared.lifecycle();
        if lifecycle.torn_down || lifecycle.run_id != run_id {
            tracing::debug!(run_id, "Discarding retraining start response after teardown");
            return Err(StudioError::Disposed);
        }

        match result {
            Ok(job) => {
                self.shared.state.send_modify(|s| {
                    s.status = TrainingStatus::Running;
                    s.job = Some(job.clone());
                });
                let cancel = CancellationToken::new();
                let handle = tokio::spawn(poll_loop(
                    Arc::clone(&self.shared),
                    run_id,
                    cancel.clone(),
                ));
                lifecycle.poller = Some(Poller { cancel, handle });
                drop(lifecycle);

                self.shared.notifier.notify(Notification::info(
                    "Training Started",
                    "The model retraining process has begun. This may take a while.",
                ));
                Ok(job)
            }
            Err(e) => {
                let message = e.display_message(START_FALLBACK);
                tracing::error!(run_id, error = %e, "Failed to start retraining");
                self.shared.state.send_modify(|s| {
                    s.status = TrainingStatus::Failed;
                    s.error = Some(message.clone());
                });
                drop(lifecycle);

                self.shared
                    .notifier
                    .notify(Notification::error("Error", message.clone()));
                Err(StudioError::Training(message))
            }
        }
    }

    /// Cancel polling and stop all further state updates.
    ///
    /// After teardown `start` returns [`StudioError::Disposed`].
    pub fn teardown(&self) {
        self.shared.teardown();
    }

    /// A handle that tears the monitor down when disposed.
    pub fn disposer(&self) -> PollingDisposer {
        PollingDisposer {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for TrainingJobMonitor {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

/// Tears down the [`TrainingJobMonitor`] it was taken from.
///
/// Handed to the presentation layer so its teardown path can stop polling
/// synchronously.
#[derive(Clone)]
pub struct PollingDisposer {
    shared: Arc<Shared>,
}

impl PollingDisposer {
    pub fn dispose(&self) {
        self.shared.teardown();
    }
}
