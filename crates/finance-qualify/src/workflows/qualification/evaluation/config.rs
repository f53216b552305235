use serde::{Deserialize, Serialize};

/// Tunable thresholds for the qualification decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Smallest accepted down payment as a share of the property price.
    pub minimum_down_payment_ratio: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            minimum_down_payment_ratio: 0.10,
        }
    }
}
