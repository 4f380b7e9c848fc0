//! Deadline rules.
//!
//! Each rule inspects one project snapshot and returns the alerts that apply
//! right now. Rules are independent: a project may trip any number of them,
//! and a rule that cannot read the data it needs simply returns nothing.

pub mod approval;
pub mod contract;
pub mod documents;
pub mod inspection;
pub mod pending;
pub mod settlement;
pub mod staleness;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alert::{AlertCategory, AlertRecord};
use crate::dates;
use crate::error::ConfigError;
use crate::model::ProjectSnapshot;

pub use approval::ApprovalRule;
pub use contract::ContractPriceRule;
pub use documents::MissingDocumentsRule;
pub use inspection::InspectionRule;
pub use pending::ApplicationWorkPendingRule;
pub use settlement::SettlementRule;
pub use staleness::StaleRecordRule;

/// A single deadline policy.
pub trait DeadlineRule: Send + Sync {
    /// Stable rule name, used in logs and the rule listing.
    fn name(&self) -> &'static str;

    /// Category of every alert this rule emits.
    fn category(&self) -> AlertCategory;

    /// One-line description of the policy under `thresholds`.
    fn describe(&self, thresholds: &RuleThresholds) -> String;

    /// Alerts that apply to `project` at `ctx.now()`.
    fn evaluate(&self, project: &ProjectSnapshot, ctx: &RuleContext<'_>) -> Vec<AlertRecord>;
}

/// The standard rule set in evaluation order.
#[must_use]
pub fn default_rules() -> Vec<Box<dyn DeadlineRule>> {
    vec![
        Box::new(InspectionRule::new()),
        Box::new(ApprovalRule::new()),
        Box::new(SettlementRule::new()),
        Box::new(MissingDocumentsRule::new()),
        Box::new(StaleRecordRule::new()),
        Box::new(ApplicationWorkPendingRule::new()),
        Box::new(ContractPriceRule::new()),
    ]
}

/// Day thresholds for the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// Inspections this close are high priority
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: i64,
    /// Inspections this close are medium priority
    #[serde(default = "default_approaching_days")]
    pub approaching_days: i64,
    #[serde(default = "default_approval_delayed_days")]
    pub approval_delayed_days: i64,
    #[serde(default = "default_approval_overdue_days")]
    pub approval_overdue_days: i64,
    #[serde(default = "default_settlement_delayed_days")]
    pub settlement_delayed_days: i64,
    #[serde(default = "default_settlement_overdue_days")]
    pub settlement_overdue_days: i64,
    /// Records untouched for longer than this are stale
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,
    /// Application work older than this is flagged
    #[serde(default = "default_pending_after_days")]
    pub pending_after_days: i64,
}

fn default_due_soon_days() -> i64 {
    3
}
fn default_approaching_days() -> i64 {
    7
}
fn default_approval_delayed_days() -> i64 {
    25
}
fn default_approval_overdue_days() -> i64 {
    30
}
fn default_settlement_delayed_days() -> i64 {
    80
}
fn default_settlement_overdue_days() -> i64 {
    90
}
fn default_stale_after_days() -> i64 {
    30
}
fn default_pending_after_days() -> i64 {
    7
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            due_soon_days: default_due_soon_days(),
            approaching_days: default_approaching_days(),
            approval_delayed_days: default_approval_delayed_days(),
            approval_overdue_days: default_approval_overdue_days(),
            settlement_delayed_days: default_settlement_delayed_days(),
            settlement_overdue_days: default_settlement_overdue_days(),
            stale_after_days: default_stale_after_days(),
            pending_after_days: default_pending_after_days(),
        }
    }
}

impl RuleThresholds {
    /// Reject threshold sets whose buckets would overlap or invert.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pairs = [
            ("due_soon_days", self.due_soon_days, "approaching_days", self.approaching_days),
            (
                "approval_delayed_days",
                self.approval_delayed_days,
                "approval_overdue_days",
                self.approval_overdue_days,
            ),
            (
                "settlement_delayed_days",
                self.settlement_delayed_days,
                "settlement_overdue_days",
                self.settlement_overdue_days,
            ),
        ];
        for (lower_name, lower, upper_name, upper) in pairs {
            if lower < 1 || lower > upper {
                return Err(ConfigError::Invalid {
                    field: lower_name.to_string(),
                    reason: format!("must be between 1 and {upper_name} ({upper}), got {lower}"),
                });
            }
        }
        for (name, value) in [
            ("stale_after_days", self.stale_after_days),
            ("pending_after_days", self.pending_after_days),
        ] {
            if value < 0 {
                return Err(ConfigError::Invalid {
                    field: name.to_string(),
                    reason: format!("must not be negative, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Evaluation inputs shared by every rule: the current instant and the
/// thresholds in force.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    now: DateTime<FixedOffset>,
    thresholds: &'a RuleThresholds,
}

impl<'a> RuleContext<'a> {
    #[must_use]
    pub fn new(now: DateTime<FixedOffset>, thresholds: &'a RuleThresholds) -> Self {
        Self { now, thresholds }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }

    #[must_use]
    pub fn thresholds(&self) -> &'a RuleThresholds {
        self.thresholds
    }

    /// Resolve a stored date into local wall-clock time.
    ///
    /// Missing values and values that fail to parse yield `None`; the latter
    /// are logged so a broken record can be traced.
    pub fn resolve(
        &self,
        project: &ProjectSnapshot,
        field: &str,
        raw: Option<&str>,
    ) -> Option<NaiveDateTime> {
        let raw = raw?;
        match dates::parse_local(raw, *self.now.offset()) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(
                    project_id = project.id,
                    field,
                    error = %e,
                    "Skipping rule input with unusable date"
                );
                None
            }
        }
    }

    /// Whole days until `target`, rounded up.
    #[must_use]
    pub fn days_until(&self, target: NaiveDateTime) -> i64 {
        dates::days_until(target, self.now.naive_local())
    }

    /// Whole days since `earlier`, rounded down.
    #[must_use]
    pub fn days_since(&self, earlier: NaiveDateTime) -> i64 {
        dates::days_since(earlier, self.now.naive_local())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_are_valid() {
        assert!(RuleThresholds::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let thresholds = RuleThresholds {
            approval_delayed_days: 40,
            ..RuleThresholds::default()
        };
        let err = thresholds.validate().unwrap_err();
        assert!(err.to_string().contains("approval_delayed_days"));
    }

    #[test]
    fn test_thresholds_deserialize_with_defaults() {
        let thresholds: RuleThresholds = toml::from_str("stale_after_days = 60").unwrap();
        assert_eq!(thresholds.stale_after_days, 60);
        assert_eq!(thresholds.due_soon_days, 3);
    }

    #[test]
    fn test_default_rule_names_are_unique() {
        let rules = default_rules();
        let mut names: Vec<_> = rules.iter().map(|r| r.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn test_resolve_skips_bad_dates() {
        let thresholds = RuleThresholds::default();
        let ctx = RuleContext::new(test_support::now(), &thresholds);
        let project = ProjectSnapshot::new(1, "P", "p");
        assert!(ctx.resolve(&project, "created_at", None).is_none());
        assert!(ctx.resolve(&project, "created_at", Some("not a date")).is_none());
        assert!(ctx.resolve(&project, "created_at", Some("2025-03-01")).is_some());
    }
}
