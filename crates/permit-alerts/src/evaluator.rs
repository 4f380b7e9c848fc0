//! Deadline policy evaluator.
//!
//! Runs every configured [`DeadlineRule`] against one project snapshot.
//! Evaluation is pure: the same snapshot and instant always yield the same
//! records in the same order.

use chrono::{DateTime, FixedOffset};

use crate::alert::AlertRecord;
use crate::model::ProjectSnapshot;
use crate::rules::{default_rules, DeadlineRule, RuleContext, RuleThresholds};

pub struct Evaluator {
    rules: Vec<Box<dyn DeadlineRule>>,
    thresholds: RuleThresholds,
}

impl Evaluator {
    /// Evaluator with the standard rule set.
    #[must_use]
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self::with_rules(default_rules(), thresholds)
    }

    /// Evaluator with a custom rule list, applied in the given order.
    #[must_use]
    pub fn with_rules(rules: Vec<Box<dyn DeadlineRule>>, thresholds: RuleThresholds) -> Self {
        Self { rules, thresholds }
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn DeadlineRule> {
        self.rules.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// All alerts that apply to `project` at `now`, in rule order.
    #[must_use]
    pub fn evaluate(&self, project: &ProjectSnapshot, now: DateTime<FixedOffset>) -> Vec<AlertRecord> {
        let ctx = RuleContext::new(now, &self.thresholds);
        self.rules
            .iter()
            .flat_map(|rule| rule.evaluate(project, &ctx))
            .collect()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(RuleThresholds::default())
    }
}
