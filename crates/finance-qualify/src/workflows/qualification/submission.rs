use serde::{Deserialize, Serialize};

use super::answers::{AnswerKey, AnswerRecord};
use super::evaluation::QualificationVerdict;
use super::plan::FinancingPlan;

/// Flat record accepted by the qualification storage API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualificationPayload {
    pub property_id: String,
    pub property_price: Option<f64>,
    pub owner_id: String,
    pub loan_amount: Option<f64>,
    pub interest_rate: Option<f64>,
    pub monthly_payment: Option<f64>,
    pub down_payment: Option<f64>,
    pub term: Option<u32>,
    pub language: String,
    pub home_usage: String,
    pub real_estate_agent: String,
    pub home_purchase_timing: String,
    pub current_home_ownership: String,
    pub current_on_all_payments: String,
    pub down_payment_percentage: Option<f64>,
    pub employment_status: String,
    pub verify_income: String,
    pub income_history: String,
    pub open_credit_lines: String,
    pub total_monthly_payments: Option<f64>,
    pub gross_annual_income: String,
    pub foreclosure_forbearance: String,
    pub declared_bankruptcy: String,
    pub current_credit_score: String,
    pub liens_or_judgments: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub property_address: String,
    pub property_city: String,
    pub property_state: String,
    pub property_zip: String,
    pub qualified: bool,
    pub disqualification_reason: Option<String>,
}

impl QualificationPayload {
    pub fn assemble(
        record: &AnswerRecord,
        plan: &FinancingPlan,
        verdict: &QualificationVerdict,
    ) -> Self {
        let text = |key: AnswerKey| record.display(key).trim().to_string();
        let number = |key: AnswerKey| record.number(key);

        Self {
            property_id: text(AnswerKey::PropertyId),
            property_price: number(AnswerKey::PropertyPrice),
            owner_id: text(AnswerKey::OwnerId),
            loan_amount: number(AnswerKey::LoanAmount).or(positive(plan.loan_amount)),
            interest_rate: number(AnswerKey::InterestRate).or(positive(plan.interest_rate)),
            monthly_payment: number(AnswerKey::MonthlyPayment).or(positive(plan.monthly_payment)),
            down_payment: number(AnswerKey::DownPayment),
            term: number(AnswerKey::Term)
                .filter(|term| *term >= 1.0)
                .map(|term| term.round() as u32)
                .or((plan.term > 0).then_some(plan.term)),
            language: text(AnswerKey::Language),
            home_usage: text(AnswerKey::HomeUsage),
            real_estate_agent: text(AnswerKey::RealEstateAgent),
            home_purchase_timing: text(AnswerKey::HomePurchaseTiming),
            current_home_ownership: text(AnswerKey::CurrentHomeOwnership),
            current_on_all_payments: text(AnswerKey::CurrentOnAllPayments),
            down_payment_percentage: number(AnswerKey::DownPaymentPercentage),
            employment_status: text(AnswerKey::EmploymentStatus),
            verify_income: text(AnswerKey::VerifyIncome),
            income_history: text(AnswerKey::IncomeHistory),
            open_credit_lines: text(AnswerKey::OpenCreditLines),
            total_monthly_payments: number(AnswerKey::TotalMonthlyPayments),
            gross_annual_income: text(AnswerKey::GrossAnnualIncome),
            foreclosure_forbearance: text(AnswerKey::ForeclosureForbearance),
            declared_bankruptcy: text(AnswerKey::DeclaredBankruptcy),
            current_credit_score: text(AnswerKey::CurrentCreditScore),
            liens_or_judgments: text(AnswerKey::LiensOrJudgments),
            first_name: text(AnswerKey::FirstName),
            last_name: text(AnswerKey::LastName),
            email: text(AnswerKey::Email),
            phone: text(AnswerKey::Phone),
            property_address: text(AnswerKey::PropertyAddress),
            property_city: text(AnswerKey::PropertyCity),
            property_state: text(AnswerKey::PropertyState),
            property_zip: text(AnswerKey::PropertyZip),
            qualified: verdict.is_qualified(),
            disqualification_reason: verdict
                .disqualification_reason()
                .map(|reason| reason.summary()),
        }
    }
}

fn positive(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}

/// Everything produced by a successful submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub verdict: QualificationVerdict,
    pub record: AnswerRecord,
    pub plan: FinancingPlan,
    pub payload: QualificationPayload,
}

impl Submission {
    pub fn package(record: AnswerRecord, plan: FinancingPlan, verdict: QualificationVerdict) -> Self {
        let payload = QualificationPayload::assemble(&record, &plan, &verdict);
        Self {
            verdict,
            record,
            plan,
            payload,
        }
    }
}
