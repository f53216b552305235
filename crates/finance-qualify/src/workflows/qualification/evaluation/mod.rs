mod config;
mod policy;
mod rules;

pub use config::EvaluationConfig;
pub use policy::{DisqualificationReason, QualificationVerdict};

use chrono::{DateTime, Utc};

use super::answers::AnswerRecord;
use super::plan::FinancingPlan;
use policy::decide;

/// Stateless evaluator applying the disqualifier list and affordability check.
#[derive(Debug, Clone, Default)]
pub struct QualificationEvaluator {
    config: EvaluationConfig,
}

impl QualificationEvaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn evaluate(&self, record: &AnswerRecord, plan: &FinancingPlan) -> QualificationVerdict {
        self.evaluate_at(record, plan, Utc::now())
    }

    pub fn evaluate_at(
        &self,
        record: &AnswerRecord,
        plan: &FinancingPlan,
        evaluated_at: DateTime<Utc>,
    ) -> QualificationVerdict {
        decide(record, plan, &self.config, evaluated_at)
    }
}
