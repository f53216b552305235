use serde::{Deserialize, Serialize};

use super::answers::{AnswerKey, AnswerRecord};

/// Down payment, rate, and term combination offered on a property listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTier {
    pub label: String,
    pub down_payment: f64,
    /// Annual interest rate in percent, e.g. `9.9`.
    pub interest_rate: f64,
    /// Term in months.
    pub term: u32,
}

/// Concrete financing terms evaluated for affordability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingPlan {
    pub down_payment: f64,
    pub interest_rate: f64,
    pub loan_amount: f64,
    pub monthly_payment: f64,
    pub term: u32,
}

impl FinancingPlan {
    /// Price a tier against the property's asking price using fixed-rate amortization.
    pub fn calculate(property_price: f64, tier: &PlanTier) -> Result<Self, PlanError> {
        ensure_amount("property price", property_price)?;
        ensure_amount("down payment", tier.down_payment)?;

        let loan_amount = (property_price - tier.down_payment).max(0.0);
        let monthly_payment = monthly_payment(loan_amount, tier.interest_rate, tier.term)?;

        Ok(Self {
            down_payment: round_cents(tier.down_payment),
            interest_rate: tier.interest_rate,
            loan_amount: round_cents(loan_amount),
            monthly_payment: round_cents(monthly_payment),
            term: tier.term,
        })
    }

    /// Rebuild the selected plan from recorded answers; missing amounts become zero.
    pub fn from_record(record: &AnswerRecord) -> Self {
        let term = record.amount(AnswerKey::Term);
        Self {
            down_payment: record.amount(AnswerKey::DownPayment),
            interest_rate: record.amount(AnswerKey::InterestRate),
            loan_amount: record.amount(AnswerKey::LoanAmount),
            monthly_payment: record.amount(AnswerKey::MonthlyPayment),
            term: if term > 0.0 { term as u32 } else { 0 },
        }
    }

    /// Share of the price covered by the down payment, `None` for a non-positive price.
    pub fn down_payment_ratio(&self, property_price: f64) -> Option<f64> {
        if property_price > 0.0 && property_price.is_finite() {
            Some(self.down_payment / property_price)
        } else {
            None
        }
    }
}

/// Standard amortized payment; a zero rate spreads the loan evenly over the term.
pub fn monthly_payment(
    loan_amount: f64,
    annual_rate_percent: f64,
    term_months: u32,
) -> Result<f64, PlanError> {
    ensure_amount("loan amount", loan_amount)?;
    if term_months == 0 {
        return Err(PlanError::NonPositiveTerm);
    }
    if !annual_rate_percent.is_finite() || annual_rate_percent < 0.0 {
        return Err(PlanError::NegativeRate(annual_rate_percent));
    }

    let months = f64::from(term_months);
    let monthly_rate = annual_rate_percent / 100.0 / 12.0;
    if monthly_rate == 0.0 {
        return Ok(loan_amount / months);
    }

    let denominator = 1.0 - (1.0 + monthly_rate).powf(-months);
    Ok(loan_amount * monthly_rate / denominator)
}

fn ensure_amount(field: &'static str, value: f64) -> Result<(), PlanError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PlanError::InvalidAmount { field, value })
    }
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("term must be at least one month")]
    NonPositiveTerm,
    #[error("interest rate must be zero or positive, got {0}")]
    NegativeRate(f64),
    #[error("{field} must be a finite, non-negative amount, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },
}
