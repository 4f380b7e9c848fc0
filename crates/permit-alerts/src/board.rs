//! Shared alert board.
//!
//! Holds the latest project snapshot, the alerts derived from it and the
//! session's dismissed ids behind one lock. Readers get clones; refreshes and
//! dismissals take the write lock only while swapping state.

use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator::{aggregate, AlertSummary, DismissedSet};
use crate::alert::{AlertId, AlertRecord};
use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::error::ConfigError;
use crate::evaluator::Evaluator;
use crate::model::ProjectSnapshot;
use crate::source::ProjectSource;

/// Result of one refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New alerts were published
    Updated { total: usize, high: usize },
    /// The fetch failed; previous alerts are still shown
    Failed(String),
    /// A newer refresh started before this one finished
    Superseded,
    /// Shutdown was requested while fetching
    Cancelled,
}

#[derive(Debug, Default)]
struct BoardState {
    projects: Vec<ProjectSnapshot>,
    evaluated_at: Option<DateTime<FixedOffset>>,
    summary: AlertSummary,
    dismissed: DismissedSet,
    loading: bool,
    last_error: Option<String>,
    /// Bumped by every refresh; only the latest may publish
    generation: u64,
}

impl BoardState {
    fn rebuild(&mut self, evaluator: &Evaluator) {
        if let Some(now) = self.evaluated_at {
            self.summary = aggregate(evaluator, &self.projects, now, &self.dismissed);
        }
    }
}

/// Alerts for the whole portfolio, refreshed from a [`ProjectSource`].
pub struct AlertBoard {
    source: Arc<dyn ProjectSource>,
    clock: Arc<dyn Clock>,
    evaluator: Evaluator,
    state: RwLock<BoardState>,
}

impl AlertBoard {
    #[must_use]
    pub fn new(source: Arc<dyn ProjectSource>, clock: Arc<dyn Clock>, evaluator: Evaluator) -> Self {
        Self {
            source,
            clock,
            evaluator,
            state: RwLock::new(BoardState::default()),
        }
    }

    /// Board wired to the configured source, clock and thresholds.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            config.build_source(),
            Arc::new(config.clock()?),
            Evaluator::new(config.thresholds.clone()),
        ))
    }

    #[must_use]
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Visible alerts, highest severity first.
    pub async fn alerts(&self) -> Vec<AlertRecord> {
        self.state.read().await.summary.alerts.clone()
    }

    pub async fn summary(&self) -> AlertSummary {
        self.state.read().await.summary.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Message of the most recent failed refresh, cleared on success.
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    /// When the visible alerts were computed.
    pub async fn last_refreshed(&self) -> Option<DateTime<FixedOffset>> {
        self.state.read().await.evaluated_at
    }

    /// Hide an alert for the rest of the session.
    ///
    /// Returns `false` if the id was already dismissed.
    pub async fn dismiss(&self, id: impl Into<AlertId>) -> bool {
        let id = id.into();
        let mut state = self.state.write().await;
        let fresh = state.dismissed.dismiss(id.clone());
        if fresh {
            debug!(alert_id = %id, "Alert dismissed");
            state.rebuild(&self.evaluator);
        }
        fresh
    }

    /// Dismiss every visible alert and return how many were hidden.
    pub async fn dismiss_all(&self) -> usize {
        let mut state = self.state.write().await;
        let ids: Vec<AlertId> = state.summary.alerts.iter().map(|a| a.id.clone()).collect();
        let count = ids.len();
        state.dismissed.dismiss_all(ids);
        state.rebuild(&self.evaluator);
        info!(count, "Dismissed all visible alerts");
        count
    }

    /// Forget every dismissal; hidden alerts reappear immediately.
    pub async fn clear_dismissed(&self) {
        let mut state = self.state.write().await;
        state.dismissed.clear();
        state.rebuild(&self.evaluator);
    }

    pub async fn dismissed_count(&self) -> usize {
        self.state.read().await.dismissed.len()
    }

    /// Fetch projects and recompute the alerts.
    ///
    /// A failed fetch keeps the previous alerts and records the error.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.refresh_unless_cancelled(&CancellationToken::new()).await
    }

    pub(crate) async fn refresh_unless_cancelled(
        &self,
        cancel: &CancellationToken,
    ) -> RefreshOutcome {
        let ticket = {
            let mut state = self.state.write().await;
            state.loading = true;
            state.generation += 1;
            state.generation
        };

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = self.source.fetch_projects() => Some(result),
        };

        let mut state = self.state.write().await;
        let latest = state.generation == ticket;
        if latest {
            state.loading = false;
        }

        let Some(fetched) = fetched.filter(|_| !cancel.is_cancelled()) else {
            debug!(source = self.source.name(), "Refresh cancelled");
            return RefreshOutcome::Cancelled;
        };
        if !latest {
            debug!(ticket, "Discarding superseded refresh");
            return RefreshOutcome::Superseded;
        }

        match fetched {
            Ok(projects) => {
                let now = self.clock.now();
                state.projects = projects;
                state.evaluated_at = Some(now);
                state.last_error = None;
                state.rebuild(&self.evaluator);

                let summary = &state.summary;
                info!(
                    source = self.source.name(),
                    projects = state.projects.len(),
                    total = summary.total,
                    high = summary.high,
                    medium = summary.medium,
                    low = summary.low,
                    "Alerts refreshed"
                );
                RefreshOutcome::Updated {
                    total: summary.total,
                    high: summary.high,
                }
            }
            Err(e) => {
                warn!(
                    source = self.source.name(),
                    error = %e,
                    "Project refresh failed, keeping previous alerts"
                );
                let message = e.to_string();
                state.last_error = Some(message.clone());
                RefreshOutcome::Failed(message)
            }
        }
    }
}
