//! Inspection checkpoint deadlines.
//!
//! For every checkpoint that is scheduled but not yet carried out, raises
//! exactly one alert from the most urgent matching bucket:
//! overdue, due today, due soon, approaching.

use super::{DeadlineRule, RuleContext, RuleThresholds};
use crate::alert::{AlertCategory, AlertKind, AlertRecord};
use crate::model::{Checkpoint, ProjectSnapshot};

pub struct InspectionRule;

impl InspectionRule {
    pub fn new() -> Self {
        Self
    }

    fn bucket(checkpoint: Checkpoint, days: i64, thresholds: &RuleThresholds) -> Option<AlertKind> {
        match days {
            d if d < 0 => Some(AlertKind::InspectionOverdue { checkpoint }),
            0 => Some(AlertKind::InspectionDueToday { checkpoint }),
            d if d <= thresholds.due_soon_days => Some(AlertKind::InspectionDueSoon { checkpoint }),
            d if d <= thresholds.approaching_days => {
                Some(AlertKind::InspectionApproaching { checkpoint })
            }
            _ => None,
        }
    }

    fn title(kind: &AlertKind, checkpoint: Checkpoint, days: i64) -> String {
        let label = checkpoint.label();
        match kind {
            AlertKind::InspectionOverdue { .. } => format!("{label}期限超過"),
            AlertKind::InspectionDueToday { .. } => format!("{label}期限当日"),
            AlertKind::InspectionDueSoon { .. } => format!("{label}期限間近"),
            _ => format!("{label}まで{days}日"),
        }
    }

    fn message(project: &ProjectSnapshot, checkpoint: Checkpoint, days: i64) -> String {
        let label = checkpoint.label();
        let who = format!("{} ({})", project.project_name, project.project_code);
        if days < 0 {
            format!("{who} の{label}予定日を{}日過ぎています", -days)
        } else if days == 0 {
            format!("{who} の{label}は本日予定です")
        } else {
            format!("{who} の{label}予定日まであと{days}日です")
        }
    }
}

impl Default for InspectionRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadlineRule for InspectionRule {
    fn name(&self) -> &'static str {
        "inspection"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::Inspection
    }

    fn describe(&self, thresholds: &RuleThresholds) -> String {
        format!(
            "Unperformed inspections: overdue/today/within {}d high, within {}d medium",
            thresholds.due_soon_days, thresholds.approaching_days
        )
    }

    fn evaluate(&self, project: &ProjectSnapshot, ctx: &RuleContext<'_>) -> Vec<AlertRecord> {
        let Some(schedule) = &project.schedule else {
            return Vec::new();
        };

        Checkpoint::ALL
            .into_iter()
            .filter_map(|checkpoint| {
                let dates = schedule.checkpoint(checkpoint);
                if dates.actual.is_some() {
                    return None;
                }
                let field = format!("{}_scheduled", checkpoint.key());
                let scheduled = ctx.resolve(project, &field, dates.scheduled)?;
                let days = ctx.days_until(scheduled);
                let kind = Self::bucket(checkpoint, days, ctx.thresholds())?;

                Some(
                    AlertRecord::new(
                        project,
                        kind,
                        Self::title(&kind, checkpoint, days),
                        Self::message(project, checkpoint, days),
                    )
                    .with_day_offset(days),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Severity;
    use crate::model::Schedule;
    use crate::rules::test_support::{date, now};

    fn evaluate(schedule: Schedule) -> Vec<AlertRecord> {
        let thresholds = RuleThresholds::default();
        let ctx = RuleContext::new(now(), &thresholds);
        let project = ProjectSnapshot::new(1, "PRJ-001", "A棟新築").with_schedule(schedule);
        InspectionRule::new().evaluate(&project, &ctx)
    }

    fn reinforcement_in(days: i64) -> Vec<AlertRecord> {
        evaluate(Schedule {
            reinforcement_scheduled: Some(date(days)),
            ..Schedule::default()
        })
    }

    #[test]
    fn test_overdue_checkpoint() {
        let alerts = reinforcement_in(-2);
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.category, AlertCategory::Inspection);
        assert_eq!(alert.day_offset, Some(-2));
        assert_eq!(
            alert.kind,
            AlertKind::InspectionOverdue {
                checkpoint: Checkpoint::Reinforcement
            }
        );
        assert!(alert.message.contains("配筋検査"));
        assert!(alert.message.contains("PRJ-001"));
    }

    #[test]
    fn test_bucket_boundaries() {
        let cases = [
            (0, Some(Severity::High)),
            (1, Some(Severity::High)),
            (3, Some(Severity::High)),
            (4, Some(Severity::Medium)),
            (7, Some(Severity::Medium)),
            (8, None),
            (10, None),
        ];
        for (days, expected) in cases {
            let alerts = reinforcement_in(days);
            assert_eq!(
                alerts.first().map(|a| a.severity),
                expected,
                "days = {days}"
            );
            assert!(alerts.len() <= 1);
        }
    }

    #[test]
    fn test_due_today_kind() {
        let alerts = reinforcement_in(0);
        assert_eq!(
            alerts[0].kind,
            AlertKind::InspectionDueToday {
                checkpoint: Checkpoint::Reinforcement
            }
        );
        assert_eq!(alerts[0].day_offset, Some(0));
    }

    #[test]
    fn test_completed_checkpoint_is_ignored() {
        let alerts = evaluate(Schedule {
            interim_scheduled: Some(date(-5)),
            interim_actual: Some(date(-5)),
            ..Schedule::default()
        });
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_each_checkpoint_evaluated_independently() {
        let alerts = evaluate(Schedule {
            reinforcement_scheduled: Some("garbage".to_string()),
            interim_scheduled: Some(date(2)),
            completion_scheduled: Some(date(6)),
            ..Schedule::default()
        });
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].id.as_str(), "1-inspection-interim");
        assert_eq!(alerts[1].id.as_str(), "1-inspection-completion");
        assert_eq!(alerts[1].severity, Severity::Medium);
    }

    #[test]
    fn test_no_schedule_no_alerts() {
        let thresholds = RuleThresholds::default();
        let ctx = RuleContext::new(now(), &thresholds);
        let project = ProjectSnapshot::new(1, "PRJ-001", "A棟新築");
        assert!(InspectionRule::new().evaluate(&project, &ctx).is_empty());
    }
}
