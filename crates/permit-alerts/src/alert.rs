//! Alert records produced by the deadline rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Checkpoint, ProjectSnapshot};

/// Priority tier. Ordering is `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What area of the project an alert concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Inspection,
    Application,
    Financial,
    Staleness,
}

impl AlertCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inspection => "inspection",
            Self::Application => "application",
            Self::Financial => "financial",
            Self::Staleness => "staleness",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule bucket that produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum AlertKind {
    InspectionOverdue { checkpoint: Checkpoint },
    InspectionDueToday { checkpoint: Checkpoint },
    InspectionDueSoon { checkpoint: Checkpoint },
    InspectionApproaching { checkpoint: Checkpoint },
    ApprovalOverdue { application_id: i64 },
    ApprovalDelayed { application_id: i64 },
    SettlementOverdue,
    SettlementDelayed,
    MissingDocuments,
    RecordStale,
    ApplicationWorkPending,
    ContractPriceMissing,
}

impl AlertKind {
    #[must_use]
    pub const fn category(&self) -> AlertCategory {
        match self {
            Self::InspectionOverdue { .. }
            | Self::InspectionDueToday { .. }
            | Self::InspectionDueSoon { .. }
            | Self::InspectionApproaching { .. } => AlertCategory::Inspection,
            Self::ApprovalOverdue { .. }
            | Self::ApprovalDelayed { .. }
            | Self::MissingDocuments
            | Self::ApplicationWorkPending => AlertCategory::Application,
            Self::SettlementOverdue | Self::SettlementDelayed | Self::ContractPriceMissing => {
                AlertCategory::Financial
            }
            Self::RecordStale => AlertCategory::Staleness,
        }
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::InspectionOverdue { .. }
            | Self::InspectionDueToday { .. }
            | Self::InspectionDueSoon { .. }
            | Self::ApprovalOverdue { .. }
            | Self::SettlementOverdue => Severity::High,
            Self::InspectionApproaching { .. }
            | Self::ApprovalDelayed { .. }
            | Self::SettlementDelayed
            | Self::MissingDocuments
            | Self::ApplicationWorkPending
            | Self::ContractPriceMissing => Severity::Medium,
            Self::RecordStale => Severity::Low,
        }
    }

    /// Id suffix for this kind. Buckets of the same rule share a suffix, so
    /// an alert keeps its id while it moves between severities.
    fn id_suffix(&self) -> String {
        match self {
            Self::InspectionOverdue { checkpoint }
            | Self::InspectionDueToday { checkpoint }
            | Self::InspectionDueSoon { checkpoint }
            | Self::InspectionApproaching { checkpoint } => {
                format!("inspection-{}", checkpoint.key())
            }
            Self::ApprovalOverdue { application_id } | Self::ApprovalDelayed { application_id } => {
                format!("approval-{application_id}")
            }
            Self::SettlementOverdue | Self::SettlementDelayed => "settlement".to_string(),
            Self::MissingDocuments => "missing-documents".to_string(),
            Self::RecordStale => "stale".to_string(),
            Self::ApplicationWorkPending => "long-pending".to_string(),
            Self::ContractPriceMissing => "missing-contract".to_string(),
        }
    }
}

/// Deterministic alert identifier: `{project_id}-{rule}[-{checkpoint}]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(String);

impl AlertId {
    #[must_use]
    pub fn for_kind(project_id: i64, kind: &AlertKind) -> Self {
        Self(format!("{project_id}-{}", kind.id_suffix()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlertId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AlertId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Back-reference to the project an alert was raised for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: i64,
    pub code: String,
    pub name: String,
}

impl From<&ProjectSnapshot> for ProjectRef {
    fn from(project: &ProjectSnapshot) -> Self {
        Self {
            id: project.id,
            code: project.project_code.clone(),
            name: project.project_name.clone(),
        }
    }
}

/// A derived, ephemeral notice about an at-risk deadline or missing data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: AlertId,
    pub category: AlertCategory,
    pub severity: Severity,
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub project: ProjectRef,
    /// Days relative to now: negative when overdue or elapsed, positive
    /// when remaining.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_offset: Option<i64>,
}

impl AlertRecord {
    /// Build a record for `project`; id, category and severity follow from
    /// `kind`.
    pub fn new(
        project: &ProjectSnapshot,
        kind: AlertKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: AlertId::for_kind(project.id, &kind),
            category: kind.category(),
            severity: kind.severity(),
            kind,
            title: title.into(),
            message: message.into(),
            project: ProjectRef::from(project),
            day_offset: None,
        }
    }

    #[must_use]
    pub fn with_day_offset(mut self, days: i64) -> Self {
        self.day_offset = Some(days);
        self
    }
}
