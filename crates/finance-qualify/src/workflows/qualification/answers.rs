use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Every question and context field the qualification flow can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKey {
    Language,
    HomeUsage,
    RealEstateAgent,
    HomePurchaseTiming,
    CurrentHomeOwnership,
    CurrentOnAllPayments,
    EmploymentStatus,
    VerifyIncome,
    IncomeHistory,
    OpenCreditLines,
    TotalMonthlyPayments,
    GrossAnnualIncome,
    ForeclosureForbearance,
    DeclaredBankruptcy,
    CurrentCreditScore,
    LiensOrJudgments,
    FirstName,
    LastName,
    Email,
    Phone,
    SelectedPlan,
    DownPayment,
    DownPaymentPercentage,
    InterestRate,
    LoanAmount,
    MonthlyPayment,
    Term,
    PropertyId,
    OwnerId,
    PropertyPrice,
    PropertyTitle,
    PropertyLocation,
    FinancingAvailable,
    PropertyAddress,
    PropertyCity,
    PropertyState,
    PropertyZip,
}

impl AnswerKey {
    pub const ALL: [AnswerKey; 37] = [
        Self::Language,
        Self::HomeUsage,
        Self::RealEstateAgent,
        Self::HomePurchaseTiming,
        Self::CurrentHomeOwnership,
        Self::CurrentOnAllPayments,
        Self::EmploymentStatus,
        Self::VerifyIncome,
        Self::IncomeHistory,
        Self::OpenCreditLines,
        Self::TotalMonthlyPayments,
        Self::GrossAnnualIncome,
        Self::ForeclosureForbearance,
        Self::DeclaredBankruptcy,
        Self::CurrentCreditScore,
        Self::LiensOrJudgments,
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Phone,
        Self::SelectedPlan,
        Self::DownPayment,
        Self::DownPaymentPercentage,
        Self::InterestRate,
        Self::LoanAmount,
        Self::MonthlyPayment,
        Self::Term,
        Self::PropertyId,
        Self::OwnerId,
        Self::PropertyPrice,
        Self::PropertyTitle,
        Self::PropertyLocation,
        Self::FinancingAvailable,
        Self::PropertyAddress,
        Self::PropertyCity,
        Self::PropertyState,
        Self::PropertyZip,
    ];

    /// Internal snake_case name, matching the serde representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::HomeUsage => "home_usage",
            Self::RealEstateAgent => "real_estate_agent",
            Self::HomePurchaseTiming => "home_purchase_timing",
            Self::CurrentHomeOwnership => "current_home_ownership",
            Self::CurrentOnAllPayments => "current_on_all_payments",
            Self::EmploymentStatus => "employment_status",
            Self::VerifyIncome => "verify_income",
            Self::IncomeHistory => "income_history",
            Self::OpenCreditLines => "open_credit_lines",
            Self::TotalMonthlyPayments => "total_monthly_payments",
            Self::GrossAnnualIncome => "gross_annual_income",
            Self::ForeclosureForbearance => "foreclosure_forbearance",
            Self::DeclaredBankruptcy => "declared_bankruptcy",
            Self::CurrentCreditScore => "current_credit_score",
            Self::LiensOrJudgments => "liens_or_judgments",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::SelectedPlan => "selected_plan",
            Self::DownPayment => "down_payment",
            Self::DownPaymentPercentage => "down_payment_percentage",
            Self::InterestRate => "interest_rate",
            Self::LoanAmount => "loan_amount",
            Self::MonthlyPayment => "monthly_payment",
            Self::Term => "term",
            Self::PropertyId => "property_id",
            Self::OwnerId => "owner_id",
            Self::PropertyPrice => "property_price",
            Self::PropertyTitle => "property_title",
            Self::PropertyLocation => "property_location",
            Self::FinancingAvailable => "financing_available",
            Self::PropertyAddress => "property_address",
            Self::PropertyCity => "property_city",
            Self::PropertyState => "property_state",
            Self::PropertyZip => "property_zip",
        }
    }

    /// Field name used by the qualification storage API.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::HomeUsage => "homeUsage",
            Self::RealEstateAgent => "realEstateAgent",
            Self::HomePurchaseTiming => "homePurchaseTiming",
            Self::CurrentHomeOwnership => "currentHomeOwnership",
            Self::CurrentOnAllPayments => "currentOnAllPayments",
            Self::EmploymentStatus => "employmentStatus",
            Self::VerifyIncome => "verifyIncome",
            Self::IncomeHistory => "incomeHistory",
            Self::OpenCreditLines => "openCreditLines",
            Self::TotalMonthlyPayments => "totalMonthlyPayments",
            Self::GrossAnnualIncome => "grossAnnualIncome",
            Self::ForeclosureForbearance => "foreclosureForbearance",
            Self::DeclaredBankruptcy => "declaredBankruptcy",
            Self::CurrentCreditScore => "currentCreditScore",
            Self::LiensOrJudgments => "liensOrJudgments",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::SelectedPlan => "selectedPlan",
            Self::DownPayment => "downPayment",
            Self::DownPaymentPercentage => "downPaymentPercentage",
            Self::InterestRate => "interestRate",
            Self::LoanAmount => "loanAmount",
            Self::MonthlyPayment => "monthlyPayment",
            Self::Term => "term",
            Self::PropertyId => "propertyId",
            Self::OwnerId => "ownerId",
            Self::PropertyPrice => "propertyPrice",
            Self::PropertyTitle => "propertyTitle",
            Self::PropertyLocation => "propertyLocation",
            Self::FinancingAvailable => "financingAvailable",
            Self::PropertyAddress => "propertyAddress",
            Self::PropertyCity => "propertyCity",
            Self::PropertyState => "propertyState",
            Self::PropertyZip => "propertyZip",
        }
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loosely typed answer, mirroring what a form input produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric view of the answer. Text is parsed as a formatted amount.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(value) if value.is_finite() => Some(*value),
            AnswerValue::Number(_) | AnswerValue::Flag(_) => None,
            AnswerValue::Text(text) => parse_amount(text),
        }
    }

    pub fn is_present(&self) -> bool {
        match self {
            AnswerValue::Text(text) => !text.trim().is_empty(),
            AnswerValue::Number(value) => value.is_finite(),
            AnswerValue::Flag(_) => true,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Flag(flag) => write!(f, "{flag}"),
            AnswerValue::Number(value) => write!(f, "{value}"),
            AnswerValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for AnswerValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Answers accumulated over one qualification attempt.
///
/// The record only grows: writes replace a key's value but nothing removes a key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerRecord {
    answers: BTreeMap<AnswerKey, AnswerValue>,
}

impl AnswerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: AnswerKey, value: impl Into<AnswerValue>) {
        self.answers.insert(key, value.into());
    }

    pub fn get(&self, key: AnswerKey) -> Option<&AnswerValue> {
        self.answers.get(&key)
    }

    pub fn text(&self, key: AnswerKey) -> Option<&str> {
        self.get(key).and_then(AnswerValue::as_text)
    }

    /// Text rendering of any answer kind, empty when absent.
    pub fn display(&self, key: AnswerKey) -> String {
        self.get(key)
            .map(|value| value.to_string())
            .unwrap_or_default()
    }

    pub fn number(&self, key: AnswerKey) -> Option<f64> {
        self.get(key).and_then(AnswerValue::to_number)
    }

    /// Coerced amount where anything unparseable counts as zero.
    pub fn amount(&self, key: AnswerKey) -> f64 {
        self.number(key).unwrap_or(0.0)
    }

    pub fn is_answered(&self, key: AnswerKey) -> bool {
        self.get(key).map(AnswerValue::is_present).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnswerKey, &AnswerValue)> {
        self.answers.iter().map(|(key, value)| (*key, value))
    }

    /// Copy every answer from `other`, overwriting keys present in both.
    pub fn merge(&mut self, other: &AnswerRecord) {
        for (key, value) in other.iter() {
            self.answers.insert(key, value.clone());
        }
    }
}

impl FromIterator<(AnswerKey, AnswerValue)> for AnswerRecord {
    fn from_iter<I: IntoIterator<Item = (AnswerKey, AnswerValue)>>(iter: I) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

/// Parse a currency or number typed into a form, e.g. `"$250,000"` or `"6.5%"`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .trim_end_matches('%')
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}
