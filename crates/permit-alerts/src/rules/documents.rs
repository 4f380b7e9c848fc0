//! Required documents missing while the permit application is in progress.

use super::{DeadlineRule, RuleContext, RuleThresholds};
use crate::alert::{AlertCategory, AlertKind, AlertRecord};
use crate::model::ProjectSnapshot;

const SEPARATOR: &str = "、";

pub struct MissingDocumentsRule;

impl MissingDocumentsRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MissingDocumentsRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadlineRule for MissingDocumentsRule {
    fn name(&self) -> &'static str {
        "missing-documents"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::Application
    }

    fn describe(&self, _thresholds: &RuleThresholds) -> String {
        "Application in progress with required documents not on file: medium".to_string()
    }

    fn evaluate(&self, project: &ProjectSnapshot, _ctx: &RuleContext<'_>) -> Vec<AlertRecord> {
        if !project.status.is_application_in_progress() {
            return Vec::new();
        }
        let Some(financial) = &project.financial else {
            return Vec::new();
        };

        let missing = financial.missing_documents();
        if missing.is_empty() {
            return Vec::new();
        }

        let names: Vec<&str> = missing.iter().map(|doc| doc.label()).collect();
        vec![AlertRecord::new(
            project,
            AlertKind::MissingDocuments,
            "必要書類未提出",
            format!(
                "{}: {}が未提出です",
                project.project_name,
                names.join(SEPARATOR)
            ),
        )]
    }
}
