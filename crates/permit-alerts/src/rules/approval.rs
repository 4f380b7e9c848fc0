//! Submitted applications waiting too long for approval.

use super::{DeadlineRule, RuleContext, RuleThresholds};
use crate::alert::{AlertCategory, AlertKind, AlertRecord};
use crate::model::{ApplicationStatus, ProjectSnapshot};

pub struct ApprovalRule;

impl ApprovalRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ApprovalRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadlineRule for ApprovalRule {
    fn name(&self) -> &'static str {
        "approval"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::Application
    }

    fn describe(&self, thresholds: &RuleThresholds) -> String {
        format!(
            "Submitted applications without approval: {}d medium, {}d high",
            thresholds.approval_delayed_days, thresholds.approval_overdue_days
        )
    }

    fn evaluate(&self, project: &ProjectSnapshot, ctx: &RuleContext<'_>) -> Vec<AlertRecord> {
        let thresholds = ctx.thresholds();

        project
            .applications
            .iter()
            .enumerate()
            .filter(|(_, app)| app.status == ApplicationStatus::Submitted && !app.is_approved())
            .filter_map(|(index, app)| {
                // Records without an id fall back to their position in the list.
                let application_id = app.id.unwrap_or(index as i64);
                let submitted = ctx.resolve(project, "submitted_date", app.submitted_date.as_deref())?;
                let elapsed = ctx.days_since(submitted);

                let (kind, title) = if elapsed >= thresholds.approval_overdue_days {
                    (
                        AlertKind::ApprovalOverdue {
                            application_id,
                        },
                        "申請の承認期限超過",
                    )
                } else if elapsed >= thresholds.approval_delayed_days {
                    (
                        AlertKind::ApprovalDelayed {
                            application_id,
                        },
                        "申請の承認が遅れています",
                    )
                } else {
                    return None;
                };

                Some(
                    AlertRecord::new(
                        project,
                        kind,
                        title,
                        format!(
                            "{} の{}は申請から{elapsed}日経過しています",
                            project.project_name,
                            app.display_name()
                        ),
                    )
                    .with_day_offset(-elapsed),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Severity;
    use crate::model::{Application, ApplicationType};
    use crate::rules::test_support::{date, now};

    fn application(id: i64, status: ApplicationStatus, submitted: i64) -> Application {
        Application {
            id: Some(id),
            status,
            submitted_date: Some(date(submitted)),
            approved_date: None,
            application_type: Some(ApplicationType {
                id: Some(1),
                code: "KAKUNIN".to_string(),
                name: "確認申請".to_string(),
            }),
        }
    }

    fn evaluate(project: &ProjectSnapshot) -> Vec<AlertRecord> {
        let thresholds = RuleThresholds::default();
        let ctx = RuleContext::new(now(), &thresholds);
        ApprovalRule::new().evaluate(project, &ctx)
    }

    #[test]
    fn test_delayed_then_overdue() {
        let project = ProjectSnapshot::new(3, "PRJ-003", "C邸")
            .with_application(application(30, ApplicationStatus::Submitted, -26));
        let alerts = evaluate(&project);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Medium);
        assert_eq!(alerts[0].kind, AlertKind::ApprovalDelayed { application_id: 30 });
        assert_eq!(alerts[0].day_offset, Some(-26));
        assert!(alerts[0].message.contains("確認申請"));

        let project = ProjectSnapshot::new(3, "PRJ-003", "C邸")
            .with_application(application(30, ApplicationStatus::Submitted, -31));
        let alerts = evaluate(&project);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::High);
        assert_eq!(alerts[0].kind, AlertKind::ApprovalOverdue { application_id: 30 });
    }

    #[test]
    fn test_boundaries() {
        for (days, expected) in [
            (-24, None),
            (-25, Some(Severity::Medium)),
            (-29, Some(Severity::Medium)),
            (-30, Some(Severity::High)),
        ] {
            let project = ProjectSnapshot::new(3, "PRJ-003", "C邸")
                .with_application(application(1, ApplicationStatus::Submitted, days));
            assert_eq!(
                evaluate(&project).first().map(|a| a.severity),
                expected,
                "submitted {days}"
            );
        }
    }

    #[test]
    fn test_approved_or_other_status_ignored() {
        let mut approved = application(1, ApplicationStatus::Submitted, -40);
        approved.approved_date = Some(date(-2));
        let project = ProjectSnapshot::new(3, "PRJ-003", "C邸")
            .with_application(approved)
            .with_application(application(2, ApplicationStatus::Undecided, -40))
            .with_application(application(3, ApplicationStatus::Approved, -40));
        assert!(evaluate(&project).is_empty());
    }

    #[test]
    fn test_missing_submission_date_skips_application() {
        let mut undated = application(1, ApplicationStatus::Submitted, 0);
        undated.submitted_date = None;
        let project = ProjectSnapshot::new(3, "PRJ-003", "C邸")
            .with_application(undated)
            .with_application(application(2, ApplicationStatus::Submitted, -35));
        let alerts = evaluate(&project);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id.as_str(), "3-approval-2");
    }

    #[test]
    fn test_application_without_id_uses_position() {
        let mut unnumbered = application(0, ApplicationStatus::Submitted, -27);
        unnumbered.id = None;
        let project = ProjectSnapshot::new(3, "PRJ-003", "C邸")
            .with_application(application(40, ApplicationStatus::Undecided, -5))
            .with_application(unnumbered);
        let alerts = evaluate(&project);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id.as_str(), "3-approval-1");
        assert_eq!(alerts[0].kind, AlertKind::ApprovalDelayed { application_id: 1 });
    }
}
