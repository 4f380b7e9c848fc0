//! Orders received without a contract amount.

use super::{DeadlineRule, RuleContext, RuleThresholds};
use crate::alert::{AlertCategory, AlertKind, AlertRecord};
use crate::model::{ProjectSnapshot, ProjectStatus};

pub struct ContractPriceRule;

impl ContractPriceRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContractPriceRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadlineRule for ContractPriceRule {
    fn name(&self) -> &'static str {
        "contract-price"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::Financial
    }

    fn describe(&self, _thresholds: &RuleThresholds) -> String {
        "Order received without a contract price: medium".to_string()
    }

    fn evaluate(&self, project: &ProjectSnapshot, _ctx: &RuleContext<'_>) -> Vec<AlertRecord> {
        if project.status != ProjectStatus::OrderReceived {
            return Vec::new();
        }
        match &project.financial {
            Some(financial) if financial.contract_price().is_none() => {
                vec![AlertRecord::new(
                    project,
                    AlertKind::ContractPriceMissing,
                    "契約金額未設定",
                    format!("{} の契約金額が未設定です", project.project_name),
                )]
            }
            _ => Vec::new(),
        }
    }
}
