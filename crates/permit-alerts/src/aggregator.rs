//! Alert aggregation across the full project list.
//!
//! Evaluates every project, drops dismissed ids, removes duplicate ids and
//! orders the result by severity. The dismissed set is owned by the caller
//! and passed in on every call.

use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::alert::{AlertId, AlertRecord, Severity};
use crate::evaluator::Evaluator;
use crate::model::ProjectSnapshot;

/// Alert ids the user has dismissed this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DismissedSet(HashSet<AlertId>);

impl DismissedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id was not already dismissed.
    pub fn dismiss(&mut self, id: AlertId) -> bool {
        self.0.insert(id)
    }

    pub fn dismiss_all<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = AlertId>,
    {
        self.0.extend(ids);
    }

    #[must_use]
    pub fn contains(&self, id: &AlertId) -> bool {
        self.0.contains(id)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<AlertId> for DismissedSet {
    fn from_iter<T: IntoIterator<Item = AlertId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ordered alerts plus per-severity counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub alerts: Vec<AlertRecord>,
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl AlertSummary {
    /// Summarize `alerts`, which must already be ordered.
    #[must_use]
    pub fn from_alerts(alerts: Vec<AlertRecord>) -> Self {
        let count = |severity: Severity| alerts.iter().filter(|a| a.severity == severity).count();
        Self {
            total: alerts.len(),
            high: count(Severity::High),
            medium: count(Severity::Medium),
            low: count(Severity::Low),
            alerts,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

/// Stable sort, highest severity first.
pub fn sort_by_severity(alerts: &mut [AlertRecord]) {
    alerts.sort_by_key(|alert| Reverse(alert.severity));
}

/// Evaluate `projects` at `now` and return the visible, ordered alerts.
#[must_use]
pub fn aggregate(
    evaluator: &Evaluator,
    projects: &[ProjectSnapshot],
    now: DateTime<FixedOffset>,
    dismissed: &DismissedSet,
) -> AlertSummary {
    let mut seen = HashSet::new();
    let mut alerts: Vec<AlertRecord> = projects
        .iter()
        .flat_map(|project| evaluator.evaluate(project, now))
        .filter(|alert| !dismissed.contains(&alert.id))
        .filter(|alert| {
            let fresh = seen.insert(alert.id.clone());
            if !fresh {
                debug!(alert_id = %alert.id, "Dropping duplicate alert");
            }
            fresh
        })
        .collect();

    sort_by_severity(&mut alerts);
    AlertSummary::from_alerts(alerts)
}
