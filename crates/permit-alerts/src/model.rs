//! Project snapshot types as delivered by the project data store.
//!
//! The store speaks Japanese status labels and is loose about nulls and
//! embedded relations, so every field here deserializes leniently. Dates are
//! kept as raw strings; the rules parse them on demand so that one bad value
//! only disables the rule that needs it.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "事前相談")]
    PreConsultation,
    #[serde(rename = "受注")]
    OrderReceived,
    #[serde(rename = "申請作業")]
    ApplicationWork,
    #[serde(rename = "審査中")]
    UnderReview,
    #[serde(rename = "配筋検査待ち")]
    AwaitingReinforcementInspection,
    #[serde(rename = "中間検査待ち")]
    AwaitingInterimInspection,
    #[serde(rename = "完了検査待ち")]
    AwaitingCompletionInspection,
    #[serde(rename = "完了")]
    Completed,
    #[serde(rename = "失注")]
    Lost,
    #[serde(rename = "その他")]
    Other,
    /// Any label the store sends that this crate does not know.
    #[default]
    #[serde(other)]
    Unknown,
}

impl ProjectStatus {
    /// Wire label of this status.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PreConsultation => "事前相談",
            Self::OrderReceived => "受注",
            Self::ApplicationWork => "申請作業",
            Self::UnderReview => "審査中",
            Self::AwaitingReinforcementInspection => "配筋検査待ち",
            Self::AwaitingInterimInspection => "中間検査待ち",
            Self::AwaitingCompletionInspection => "完了検査待ち",
            Self::Completed => "完了",
            Self::Lost => "失注",
            Self::Other => "その他",
            Self::Unknown => "不明",
        }
    }

    /// Completed and lost projects no longer need attention.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Lost)
    }

    /// Statuses in which the permit application paperwork is being prepared
    /// or reviewed.
    #[must_use]
    pub const fn is_application_in_progress(&self) -> bool {
        matches!(self, Self::ApplicationWork | Self::UnderReview)
    }
}

/// Status of a regulatory application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[serde(rename = "未定")]
    Undecided,
    /// Submitted and waiting for the authority.
    #[serde(rename = "申請")]
    Submitted,
    #[serde(rename = "承認")]
    Approved,
    #[serde(rename = "却下")]
    Rejected,
    #[serde(rename = "完了")]
    Completed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One of the three scheduled regulatory inspections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    /// Rebar (配筋) inspection
    Reinforcement,
    /// Interim (中間) inspection
    Interim,
    /// Completion (完了) inspection
    Completion,
}

impl Checkpoint {
    /// All checkpoints in schedule order.
    pub const ALL: [Self; 3] = [Self::Reinforcement, Self::Interim, Self::Completion];

    /// Stable key used in alert ids.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Reinforcement => "reinforcement",
            Self::Interim => "interim",
            Self::Completion => "completion",
        }
    }

    /// Display name of the inspection.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Reinforcement => "配筋検査",
            Self::Interim => "中間検査",
            Self::Completion => "完了検査",
        }
    }
}

/// Documents that must be on file while an application is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredDocument {
    PermitApplication,
    InspectionSchedule,
    FoundationPlan,
}

impl RequiredDocument {
    pub const ALL: [Self; 3] = [
        Self::PermitApplication,
        Self::InspectionSchedule,
        Self::FoundationPlan,
    ];

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PermitApplication => "交付申請書",
            Self::InspectionSchedule => "検査予定表",
            Self::FoundationPlan => "基礎伏図",
        }
    }
}

/// Scheduled and actual dates of one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointDates<'a> {
    pub scheduled: Option<&'a str>,
    pub actual: Option<&'a str>,
}

/// Inspection schedule of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub reinforcement_scheduled: Option<String>,
    #[serde(default)]
    pub reinforcement_actual: Option<String>,
    #[serde(default)]
    pub interim_scheduled: Option<String>,
    #[serde(default)]
    pub interim_actual: Option<String>,
    #[serde(default)]
    pub completion_scheduled: Option<String>,
    #[serde(default)]
    pub completion_actual: Option<String>,
}

impl Schedule {
    /// Dates recorded for `checkpoint`. Blank strings count as absent.
    #[must_use]
    pub fn checkpoint(&self, checkpoint: Checkpoint) -> CheckpointDates<'_> {
        let (scheduled, actual) = match checkpoint {
            Checkpoint::Reinforcement => (&self.reinforcement_scheduled, &self.reinforcement_actual),
            Checkpoint::Interim => (&self.interim_scheduled, &self.interim_actual),
            Checkpoint::Completion => (&self.completion_scheduled, &self.completion_actual),
        };
        CheckpointDates {
            scheduled: non_blank(scheduled.as_deref()),
            actual: non_blank(actual.as_deref()),
        }
    }
}

/// Financial record of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Financial {
    #[serde(default, deserialize_with = "lenient_number")]
    pub contract_price: Option<f64>,
    #[serde(default)]
    pub settlement_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_permit_application: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_inspection_schedule: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_foundation_plan: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_hardware_plan: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_invoice: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_energy_calculation: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_settlement_data: bool,
}

impl Financial {
    /// Contract price, treating zero as "not entered".
    #[must_use]
    pub fn contract_price(&self) -> Option<f64> {
        self.contract_price.filter(|price| price.abs() > f64::EPSILON)
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        non_blank(self.settlement_date.as_deref()).is_some()
    }

    /// Whether `document` is on file.
    #[must_use]
    pub const fn has_document(&self, document: RequiredDocument) -> bool {
        match document {
            RequiredDocument::PermitApplication => self.has_permit_application,
            RequiredDocument::InspectionSchedule => self.has_inspection_schedule,
            RequiredDocument::FoundationPlan => self.has_foundation_plan,
        }
    }

    /// Required documents not yet on file, in canonical order.
    #[must_use]
    pub fn missing_documents(&self) -> Vec<RequiredDocument> {
        RequiredDocument::ALL
            .into_iter()
            .filter(|doc| !self.has_document(*doc))
            .collect()
    }
}

/// Kind of regulatory application (確認申請, BELS, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationType {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// A regulatory application filed for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    /// Missing on records created before ids were exposed
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub submitted_date: Option<String>,
    #[serde(default)]
    pub approved_date: Option<String>,
    #[serde(default, deserialize_with = "one_or_first")]
    pub application_type: Option<ApplicationType>,
}

impl Application {
    /// Human-readable name, falling back to a generic label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.application_type
            .as_ref()
            .map(|t| t.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("申請")
    }

    #[must_use]
    pub fn is_approved(&self) -> bool {
        non_blank(self.approved_date.as_deref()).is_some()
    }
}

/// Read-only view of one project as fetched from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ProjectStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "one_or_first")]
    pub schedule: Option<Schedule>,
    #[serde(default, deserialize_with = "one_or_first")]
    pub financial: Option<Financial>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub applications: Vec<Application>,
}

impl ProjectSnapshot {
    /// Minimal snapshot with no nested records.
    #[must_use]
    pub fn new(id: i64, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            project_code: code.into(),
            project_name: name.into(),
            status: ProjectStatus::Unknown,
            created_at: None,
            updated_at: None,
            schedule: None,
            financial: None,
            applications: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    #[must_use]
    pub fn with_updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = Some(updated_at.into());
        self
    }

    #[must_use]
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    #[must_use]
    pub fn with_financial(mut self, financial: Financial) -> Self {
        self.financial = Some(financial);
        self
    }

    #[must_use]
    pub fn with_application(mut self, application: Application) -> Self {
        self.applications.push(application);
        self
    }
}

/// Paged project list returned by the REST API.
///
/// Projects stay raw here; [`ProjectPayload::into_projects`] decodes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<Value>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Either a bare project array or a [`ProjectListResponse`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProjectPayload {
    List(Vec<Value>),
    Page(ProjectListResponse),
}

impl ProjectPayload {
    /// Decode every project on its own. Records that do not decode are
    /// logged and skipped; the rest of the list is kept.
    #[must_use]
    pub fn into_projects(self) -> Vec<ProjectSnapshot> {
        let records = match self {
            Self::List(records) => records,
            Self::Page(page) => page.projects,
        };

        records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let project_id = record.get("id").cloned();
                match serde_json::from_value::<ProjectSnapshot>(record) {
                    Ok(project) => Some(project),
                    Err(e) => {
                        warn!(
                            index,
                            project_id = ?project_id,
                            error = %e,
                            "Skipping undecodable project record"
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decimal columns arrive as JSON numbers or as numeric strings. Anything
/// else reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    let value = match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(number)) => Some(number),
        Some(NumberOrText::Text(text)) => text.trim().replace(',', "").parse::<f64>().ok(),
        Some(NumberOrText::Other(_)) | None => None,
    };
    Ok(value.filter(|number| number.is_finite()))
}

/// PostgREST embeds one-to-one relations as either an object or a
/// single-element array depending on how the foreign key is declared.
fn one_or_first<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::Many(items)) => items.into_iter().next(),
        Some(OneOrMany::One(item)) => Some(item),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_labels_round_trip() {
        let status: ProjectStatus = serde_json::from_value(json!("受注")).unwrap();
        assert_eq!(status, ProjectStatus::OrderReceived);
        assert_eq!(status.label(), "受注");
        assert_eq!(
            serde_json::to_value(ProjectStatus::Completed).unwrap(),
            json!("完了")
        );
    }

    #[test]
    fn test_unknown_status_does_not_fail() {
        let status: ProjectStatus = serde_json::from_value(json!("保留")).unwrap();
        assert_eq!(status, ProjectStatus::Unknown);
        let status: ApplicationStatus = serde_json::from_value(json!("取下げ")).unwrap();
        assert_eq!(status, ApplicationStatus::Unknown);
    }

    #[test]
    fn test_terminal_and_in_progress_statuses() {
        assert!(ProjectStatus::Completed.is_terminal());
        assert!(ProjectStatus::Lost.is_terminal());
        assert!(!ProjectStatus::UnderReview.is_terminal());
        assert!(ProjectStatus::ApplicationWork.is_application_in_progress());
        assert!(ProjectStatus::UnderReview.is_application_in_progress());
        assert!(!ProjectStatus::OrderReceived.is_application_in_progress());
    }

    #[test]
    fn test_snapshot_tolerates_nulls_and_embedded_arrays() {
        let project: ProjectSnapshot = serde_json::from_value(json!({
            "id": 7,
            "project_code": null,
            "project_name": "サンプル住宅",
            "status": null,
            "created_at": "2024-12-01T09:00:00Z",
            "schedule": [{ "reinforcement_scheduled": "2025-01-10" }],
            "financial": { "contract_price": 1200000, "has_permit_application": null },
            "applications": null
        }))
        .unwrap();

        assert_eq!(project.project_code, "");
        assert_eq!(project.status, ProjectStatus::Unknown);
        assert!(project.applications.is_empty());
        let schedule = project.schedule.unwrap();
        assert_eq!(
            schedule.checkpoint(Checkpoint::Reinforcement).scheduled,
            Some("2025-01-10")
        );
        let financial = project.financial.unwrap();
        assert!(!financial.has_permit_application);
        assert_eq!(financial.contract_price(), Some(1_200_000.0));
    }

    #[test]
    fn test_empty_embedded_array_is_none() {
        let project: ProjectSnapshot =
            serde_json::from_value(json!({ "id": 1, "financial": [] })).unwrap();
        assert!(project.financial.is_none());
    }

    #[test]
    fn test_blank_dates_count_as_absent() {
        let schedule = Schedule {
            interim_scheduled: Some("  ".to_string()),
            interim_actual: Some(String::new()),
            ..Schedule::default()
        };
        let dates = schedule.checkpoint(Checkpoint::Interim);
        assert_eq!(dates.scheduled, None);
        assert_eq!(dates.actual, None);
    }

    #[test]
    fn test_zero_contract_price_is_unset() {
        let financial = Financial {
            contract_price: Some(0.0),
            ..Financial::default()
        };
        assert_eq!(financial.contract_price(), None);
    }

    #[test]
    fn test_missing_documents_in_canonical_order() {
        let financial = Financial {
            has_inspection_schedule: true,
            ..Financial::default()
        };
        assert_eq!(
            financial.missing_documents(),
            vec![
                RequiredDocument::PermitApplication,
                RequiredDocument::FoundationPlan
            ]
        );
    }

    #[test]
    fn test_payload_accepts_both_shapes() {
        let list: ProjectPayload = serde_json::from_value(json!([{ "id": 1 }])).unwrap();
        assert_eq!(list.into_projects().len(), 1);

        let page: ProjectPayload =
            serde_json::from_value(json!({ "projects": [{ "id": 1 }, { "id": 2 }], "total": 2 }))
                .unwrap();
        assert_eq!(page.into_projects().len(), 2);
    }

    #[test]
    fn test_application_display_name_fallback() {
        let app: Application = serde_json::from_value(json!({
            "id": 3,
            "status": "申請",
            "application_type": { "name": "確認申請" }
        }))
        .unwrap();
        assert_eq!(app.status, ApplicationStatus::Submitted);
        assert_eq!(app.display_name(), "確認申請");

        let bare: Application = serde_json::from_value(json!({ "id": 4 })).unwrap();
        assert_eq!(bare.display_name(), "申請");
        assert!(!bare.is_approved());
    }

    #[test]
    fn test_contract_price_accepts_decimal_strings() {
        let price = |value: serde_json::Value| {
            serde_json::from_value::<Financial>(json!({ "contract_price": value }))
                .unwrap()
                .contract_price()
        };
        assert_eq!(price(json!("25000000")), Some(25_000_000.0));
        assert_eq!(price(json!("1,200,000.50")), Some(1_200_000.5));
        assert_eq!(price(json!(3_300_000)), Some(3_300_000.0));
        assert_eq!(price(json!("0.00")), None);
        assert_eq!(price(json!("")), None);
        assert_eq!(price(json!("未定")), None);
        assert_eq!(price(json!(true)), None);
        assert_eq!(price(json!(null)), None);
    }

    #[test]
    fn test_application_without_id_decodes() {
        let project: ProjectSnapshot = serde_json::from_value(json!({
            "id": 5,
            "applications": [{ "status": "申請", "submitted_date": "2025-01-10" }]
        }))
        .unwrap();
        assert_eq!(project.applications.len(), 1);
        assert_eq!(project.applications[0].id, None);
        assert_eq!(project.applications[0].status, ApplicationStatus::Submitted);
    }

    #[test]
    fn test_bad_record_does_not_drop_the_list() {
        let page: ProjectPayload = serde_json::from_value(json!({
            "projects": [
                { "id": 1, "status": "受注", "financial": { "contract_price": "25000000" } },
                { "id": "not-a-number", "project_name": "壊れた行" },
                { "project_name": "no id" },
                { "id": 2, "status": "完了" }
            ],
            "total": 4
        }))
        .unwrap();

        let projects = page.into_projects();
        let ids: Vec<_> = projects.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(
            projects[0].financial.as_ref().and_then(Financial::contract_price),
            Some(25_000_000.0)
        );
    }

    #[test]
    fn test_bare_array_skips_bad_records() {
        let list: ProjectPayload =
            serde_json::from_value(json!([{ "id": 1, "applications": "oops" }, { "id": 2 }]))
                .unwrap();
        let projects = list.into_projects();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, 2);
    }
}
