//! Active projects nobody has touched in a while.

use super::{DeadlineRule, RuleContext, RuleThresholds};
use crate::alert::{AlertCategory, AlertKind, AlertRecord};
use crate::model::ProjectSnapshot;

pub struct StaleRecordRule;

impl StaleRecordRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StaleRecordRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadlineRule for StaleRecordRule {
    fn name(&self) -> &'static str {
        "stale-record"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::Staleness
    }

    fn describe(&self, thresholds: &RuleThresholds) -> String {
        format!(
            "Non-terminal projects not updated for more than {}d: low",
            thresholds.stale_after_days
        )
    }

    fn evaluate(&self, project: &ProjectSnapshot, ctx: &RuleContext<'_>) -> Vec<AlertRecord> {
        if project.status.is_terminal() {
            return Vec::new();
        }
        let Some(updated) = ctx.resolve(project, "updated_at", project.updated_at.as_deref())
        else {
            return Vec::new();
        };

        let elapsed = ctx.days_since(updated);
        if elapsed <= ctx.thresholds().stale_after_days {
            return Vec::new();
        }

        vec![AlertRecord::new(
            project,
            AlertKind::RecordStale,
            "長期間未更新",
            format!("{} が{elapsed}日間更新されていません", project.project_name),
        )
        .with_day_offset(-elapsed)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Severity;
    use crate::model::ProjectStatus;
    use crate::rules::test_support::{now, timestamp};

    fn evaluate(status: ProjectStatus, updated_days_ago: i64) -> Vec<AlertRecord> {
        let thresholds = RuleThresholds::default();
        let ctx = RuleContext::new(now(), &thresholds);
        let project = ProjectSnapshot::new(8, "PRJ-008", "H邸")
            .with_status(status)
            .with_updated_at(timestamp(-updated_days_ago));
        StaleRecordRule::new().evaluate(&project, &ctx)
    }

    #[test]
    fn test_stale_active_project() {
        let alerts = evaluate(ProjectStatus::UnderReview, 45);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Low);
        assert_eq!(alerts[0].category, AlertCategory::Staleness);
        assert_eq!(alerts[0].day_offset, Some(-45));
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(evaluate(ProjectStatus::OrderReceived, 30).is_empty());
        assert_eq!(evaluate(ProjectStatus::OrderReceived, 31).len(), 1);
    }

    #[test]
    fn test_terminal_projects_exempt() {
        assert!(evaluate(ProjectStatus::Completed, 45).is_empty());
        assert!(evaluate(ProjectStatus::Lost, 200).is_empty());
    }
}
