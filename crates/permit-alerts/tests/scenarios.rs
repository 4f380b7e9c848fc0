//! End-to-end alert scenarios through the public API.

use chrono::{DateTime, Duration, FixedOffset};
use permit_alerts::{
    aggregate, AlertBoard, AlertCategory, AlertKind, Application, ApplicationStatus, Checkpoint,
    DismissedSet, Evaluator, FixedClock, Financial, ProjectSnapshot, ProjectStatus,
    RefreshOutcome, Schedule, Severity, StaticProjectSource,
};
use std::sync::Arc;

fn now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2025-06-02T09:30:00+09:00").unwrap()
}

fn date(offset_days: i64) -> String {
    (now() + Duration::days(offset_days))
        .format("%Y-%m-%d")
        .to_string()
}

fn timestamp(offset_days: i64) -> String {
    (now() + Duration::days(offset_days)).to_rfc3339()
}

fn submitted_application(days_ago: i64) -> Application {
    Application {
        id: Some(11),
        status: ApplicationStatus::Submitted,
        submitted_date: Some(date(-days_ago)),
        approved_date: None,
        application_type: None,
    }
}

#[test]
fn test_overdue_reinforcement_inspection() {
    let project = ProjectSnapshot::new(1, "PRJ-001", "A邸").with_schedule(Schedule {
        reinforcement_scheduled: Some(date(-2)),
        ..Schedule::default()
    });

    let alerts = Evaluator::default().evaluate(&project, now());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::High);
    assert_eq!(alerts[0].category, AlertCategory::Inspection);
    assert_eq!(alerts[0].day_offset, Some(-2));
    assert_eq!(
        alerts[0].kind,
        AlertKind::InspectionOverdue {
            checkpoint: Checkpoint::Reinforcement
        }
    );
}

#[test]
fn test_order_received_without_contract_price() {
    let project = ProjectSnapshot::new(2, "PRJ-002", "B邸")
        .with_status(ProjectStatus::OrderReceived)
        .with_financial(Financial {
            contract_price: None,
            ..Financial::default()
        });

    let alerts = Evaluator::default().evaluate(&project, now());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Medium);
    assert_eq!(alerts[0].category, AlertCategory::Financial);
    assert_eq!(alerts[0].day_offset, None);
}

#[test]
fn test_approval_escalates_without_duplicating() {
    let evaluator = Evaluator::default();

    let delayed = ProjectSnapshot::new(3, "PRJ-003", "C邸")
        .with_status(ProjectStatus::UnderReview)
        .with_application(submitted_application(26));
    let alerts = evaluator.evaluate(&delayed, now());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Medium);
    assert!(matches!(alerts[0].kind, AlertKind::ApprovalDelayed { .. }));

    let overdue = ProjectSnapshot::new(3, "PRJ-003", "C邸")
        .with_status(ProjectStatus::UnderReview)
        .with_application(submitted_application(31));
    let alerts = evaluator.evaluate(&overdue, now());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::High);
    assert!(matches!(alerts[0].kind, AlertKind::ApprovalOverdue { .. }));
}

#[test]
fn test_completed_project_is_never_stale() {
    let project = ProjectSnapshot::new(4, "PRJ-004", "D邸")
        .with_status(ProjectStatus::Completed)
        .with_updated_at(timestamp(-45));

    assert!(Evaluator::default().evaluate(&project, now()).is_empty());
}

#[test]
fn test_inspection_ten_days_out_is_quiet() {
    let project = ProjectSnapshot::new(5, "PRJ-005", "E邸").with_schedule(Schedule {
        completion_scheduled: Some(date(10)),
        ..Schedule::default()
    });

    assert!(Evaluator::default().evaluate(&project, now()).is_empty());
}

#[test]
fn test_dismissal_survives_reaggregation() {
    let evaluator = Evaluator::default();
    let projects = vec![
        ProjectSnapshot::new(1, "PRJ-001", "A邸").with_schedule(Schedule {
            interim_scheduled: Some(date(-2)),
            ..Schedule::default()
        }),
        ProjectSnapshot::new(2, "PRJ-002", "B邸")
            .with_status(ProjectStatus::OrderReceived)
            .with_financial(Financial::default()),
    ];

    let mut dismissed = DismissedSet::new();
    let first = aggregate(&evaluator, &projects, now(), &dismissed);
    assert_eq!(first.total, 2);

    dismissed.dismiss(first.alerts[0].id.clone());

    // Worsening to five days overdue keeps the same id.
    let later = now() + Duration::days(3);
    let second = aggregate(&evaluator, &projects, later, &dismissed);
    assert_eq!(second.total, 1);
    assert_eq!(second.alerts[0].id.as_str(), "2-missing-contract");
}

#[test]
fn test_equal_severities_keep_project_order() {
    let projects: Vec<_> = (1..=4)
        .map(|id| {
            ProjectSnapshot::new(id, format!("PRJ-00{id}"), format!("邸{id}"))
                .with_status(ProjectStatus::OrderReceived)
                .with_financial(Financial::default())
        })
        .collect();

    let summary = aggregate(&Evaluator::default(), &projects, now(), &DismissedSet::new());
    let ids: Vec<_> = summary.alerts.iter().map(|a| a.id.to_string()).collect();
    assert_eq!(
        ids,
        vec![
            "1-missing-contract",
            "2-missing-contract",
            "3-missing-contract",
            "4-missing-contract"
        ]
    );
    assert_eq!(summary.medium, 4);
}

#[tokio::test]
async fn test_board_refresh_and_dismiss() {
    let projects = vec![
        ProjectSnapshot::new(1, "PRJ-001", "A邸").with_schedule(Schedule {
            reinforcement_scheduled: Some(date(-2)),
            ..Schedule::default()
        }),
        ProjectSnapshot::new(6, "PRJ-006", "F邸")
            .with_status(ProjectStatus::UnderReview)
            .with_updated_at(timestamp(-40)),
    ];
    let board = AlertBoard::new(
        Arc::new(StaticProjectSource::new(projects)),
        Arc::new(FixedClock(now())),
        Evaluator::default(),
    );

    assert_eq!(
        board.refresh().await,
        RefreshOutcome::Updated { total: 2, high: 1 }
    );
    assert!(board.dismiss("1-inspection-reinforcement").await);

    let summary = board.summary().await;
    assert_eq!(summary.total, 1);
    assert_eq!(summary.alerts[0].id.as_str(), "6-stale");
}
