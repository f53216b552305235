use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::super::answers::AnswerRecord;
use super::super::plan::FinancingPlan;
use super::config::EvaluationConfig;
use super::rules::{affordability, DISQUALIFIERS};

/// Outcome of one evaluation. Equality ignores the evaluation timestamp.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationVerdict {
    qualified: bool,
    disqualification_reason: Option<DisqualificationReason>,
    evaluated_at: DateTime<Utc>,
}

impl QualificationVerdict {
    pub fn qualified_at(evaluated_at: DateTime<Utc>) -> Self {
        Self {
            qualified: true,
            disqualification_reason: None,
            evaluated_at,
        }
    }

    pub fn disqualified_at(reason: DisqualificationReason, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            qualified: false,
            disqualification_reason: Some(reason),
            evaluated_at,
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.qualified
    }

    pub fn disqualification_reason(&self) -> Option<&DisqualificationReason> {
        self.disqualification_reason.as_ref()
    }

    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }

    pub fn summary(&self) -> String {
        match &self.disqualification_reason {
            None => "qualified".to_string(),
            Some(reason) => format!("not qualified: {}", reason.summary()),
        }
    }
}

impl PartialEq for QualificationVerdict {
    fn eq(&self, other: &Self) -> bool {
        self.qualified == other.qualified
            && self.disqualification_reason == other.disqualification_reason
    }
}

/// Why a buyer did not qualify.
#[derive(Debug, Clone, PartialEq)]
pub enum DisqualificationReason {
    CreditScore,
    DelinquentPayments,
    InsufficientIncome,
    AdverseCreditHistory,
    UnverifiableIncome,
    InsufficientIncomeHistory,
    DownPaymentBelowMinimum {
        minimum_ratio: f64,
        required: f64,
        provided: f64,
    },
    PropertyPriceUnavailable {
        minimum_ratio: f64,
    },
}

impl DisqualificationReason {
    pub fn code(&self) -> &'static str {
        match self {
            DisqualificationReason::CreditScore => "credit_score",
            DisqualificationReason::DelinquentPayments => "delinquent_payments",
            DisqualificationReason::InsufficientIncome => "insufficient_income",
            DisqualificationReason::AdverseCreditHistory => "adverse_credit_history",
            DisqualificationReason::UnverifiableIncome => "unverifiable_income",
            DisqualificationReason::InsufficientIncomeHistory => "insufficient_income_history",
            DisqualificationReason::DownPaymentBelowMinimum { .. }
            | DisqualificationReason::PropertyPriceUnavailable { .. } => {
                "down_payment_below_minimum"
            }
        }
    }

    /// Reason text stored with the qualification record.
    pub fn summary(&self) -> String {
        match self {
            DisqualificationReason::CreditScore => "credit score".to_string(),
            DisqualificationReason::DelinquentPayments => "delinquent payments".to_string(),
            DisqualificationReason::InsufficientIncome => "insufficient income".to_string(),
            DisqualificationReason::AdverseCreditHistory => "adverse credit history".to_string(),
            DisqualificationReason::UnverifiableIncome => "unverifiable income".to_string(),
            DisqualificationReason::InsufficientIncomeHistory => {
                "insufficient income history".to_string()
            }
            DisqualificationReason::DownPaymentBelowMinimum { minimum_ratio, .. } => {
                format!("down payment below minimum ({})", percent(*minimum_ratio))
            }
            DisqualificationReason::PropertyPriceUnavailable { minimum_ratio } => format!(
                "down payment below minimum ({}): property price unavailable",
                percent(*minimum_ratio)
            ),
        }
    }
}

impl Serialize for DisqualificationReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.summary())
    }
}

fn percent(ratio: f64) -> String {
    let value = ratio * 100.0;
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}%", value)
    } else {
        format!("{:.1}%", value)
    }
}

pub(crate) fn decide(
    record: &AnswerRecord,
    plan: &FinancingPlan,
    config: &EvaluationConfig,
    evaluated_at: DateTime<Utc>,
) -> QualificationVerdict {
    if let Some(rule) = DISQUALIFIERS.iter().find(|rule| (rule.applies)(record)) {
        return QualificationVerdict::disqualified_at(rule.reason.clone(), evaluated_at);
    }

    match affordability(record, plan, config) {
        Some(reason) => QualificationVerdict::disqualified_at(reason, evaluated_at),
        None => QualificationVerdict::qualified_at(evaluated_at),
    }
}
