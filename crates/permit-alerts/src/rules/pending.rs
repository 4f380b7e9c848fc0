//! Projects stuck in application work.

use super::{DeadlineRule, RuleContext, RuleThresholds};
use crate::alert::{AlertCategory, AlertKind, AlertRecord};
use crate::model::{ProjectSnapshot, ProjectStatus};

pub struct ApplicationWorkPendingRule;

impl ApplicationWorkPendingRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ApplicationWorkPendingRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadlineRule for ApplicationWorkPendingRule {
    fn name(&self) -> &'static str {
        "application-work-pending"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::Application
    }

    fn describe(&self, thresholds: &RuleThresholds) -> String {
        format!(
            "Application work open for more than {}d since creation: medium",
            thresholds.pending_after_days
        )
    }

    fn evaluate(&self, project: &ProjectSnapshot, ctx: &RuleContext<'_>) -> Vec<AlertRecord> {
        if project.status != ProjectStatus::ApplicationWork {
            return Vec::new();
        }
        let Some(created) = ctx.resolve(project, "created_at", project.created_at.as_deref())
        else {
            return Vec::new();
        };

        let elapsed = ctx.days_since(created);
        if elapsed <= ctx.thresholds().pending_after_days {
            return Vec::new();
        }

        vec![AlertRecord::new(
            project,
            AlertKind::ApplicationWorkPending,
            "申請作業長期化",
            format!("{} - {elapsed}日経過", project.project_name),
        )
        .with_day_offset(-elapsed)]
    }
}
