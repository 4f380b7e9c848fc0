//! Background refresh loop for an [`AlertBoard`].
//!
//! The loop refreshes once on start, then on every interval tick and on
//! every externally delivered [`RefreshSignal`]. Shutdown cancels any fetch
//! in flight so nothing is published afterwards.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::board::{AlertBoard, RefreshOutcome};
use crate::realtime::{signal_from_frame, RefreshSignal};

/// Pending signals beyond this are coalesced into the refresh already queued.
const SIGNAL_BUFFER: usize = 16;

/// Periodic refresher for an alert board.
pub struct AlertMonitor {
    board: Arc<AlertBoard>,
    interval: Duration,
}

impl AlertMonitor {
    #[must_use]
    pub fn new(board: Arc<AlertBoard>, interval: Duration) -> Self {
        Self { board, interval }
    }

    /// Start the refresh loop on the current runtime.
    #[must_use]
    pub fn spawn(self) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let (signals, receiver) = mpsc::channel(SIGNAL_BUFFER);

        info!(
            interval_secs = self.interval.as_secs(),
            "Starting alert monitor"
        );
        let task = tokio::spawn(run(self.board, self.interval, receiver, cancel.clone()));

        MonitorHandle {
            cancel,
            signals,
            task,
        }
    }
}

async fn run(
    board: Arc<AlertBoard>,
    period: Duration,
    mut signals: mpsc::Receiver<RefreshSignal>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut signals_open = true;

    loop {
        let signal = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = signals.recv(), if signals_open => match received {
                Some(signal) => signal,
                None => {
                    signals_open = false;
                    continue;
                }
            },
            _ = ticker.tick() => RefreshSignal::Timer,
        };

        // One refresh covers everything queued so far.
        while signals.try_recv().is_ok() {}

        debug!(signal = ?signal, "Refreshing alerts");
        if board.refresh_unless_cancelled(&cancel).await == RefreshOutcome::Cancelled {
            break;
        }
    }

    info!("Alert monitor stopped");
}

/// Control handle for a running [`AlertMonitor`].
#[derive(Debug)]
pub struct MonitorHandle {
    cancel: CancellationToken,
    signals: mpsc::Sender<RefreshSignal>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Request a refresh. Returns `false` once the monitor has stopped.
    pub fn signal(&self, signal: RefreshSignal) -> bool {
        match self.signals.try_send(signal) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Sender for wiring other producers, e.g. a realtime socket reader.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<RefreshSignal> {
        self.signals.clone()
    }

    /// Feed a raw realtime frame; refresh if it carries a refresh signal.
    pub fn handle_realtime(&self, raw: &str) -> Option<RefreshSignal> {
        let signal = signal_from_frame(raw)?;
        self.signal(signal);
        Some(signal)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Alert monitor task ended abnormally");
        }
    }
}
