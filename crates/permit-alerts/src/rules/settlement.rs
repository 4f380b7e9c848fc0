//! Contracted projects that have not been settled.
//!
//! The store has no contract date yet, so the project's creation time stands
//! in for it.

use super::{DeadlineRule, RuleContext, RuleThresholds};
use crate::alert::{AlertCategory, AlertKind, AlertRecord};
use crate::model::ProjectSnapshot;

pub struct SettlementRule;

impl SettlementRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SettlementRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadlineRule for SettlementRule {
    fn name(&self) -> &'static str {
        "settlement"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::Financial
    }

    fn describe(&self, thresholds: &RuleThresholds) -> String {
        format!(
            "Contract price set but unsettled: {}d medium, {}d high (from project creation)",
            thresholds.settlement_delayed_days, thresholds.settlement_overdue_days
        )
    }

    fn evaluate(&self, project: &ProjectSnapshot, ctx: &RuleContext<'_>) -> Vec<AlertRecord> {
        let Some(financial) = &project.financial else {
            return Vec::new();
        };
        if financial.contract_price().is_none() || financial.is_settled() {
            return Vec::new();
        }
        // TODO: switch to a dedicated contract date once the financial record carries one.
        let Some(contracted) = ctx.resolve(project, "created_at", project.created_at.as_deref())
        else {
            return Vec::new();
        };

        let thresholds = ctx.thresholds();
        let elapsed = ctx.days_since(contracted);
        let (kind, title) = if elapsed >= thresholds.settlement_overdue_days {
            (AlertKind::SettlementOverdue, "決済期限超過")
        } else if elapsed >= thresholds.settlement_delayed_days {
            (AlertKind::SettlementDelayed, "決済が遅れています")
        } else {
            return Vec::new();
        };

        vec![AlertRecord::new(
            project,
            kind,
            title,
            format!(
                "{} は契約から{elapsed}日経過していますが、まだ決済されていません",
                project.project_name
            ),
        )
        .with_day_offset(-elapsed)]
    }
}
