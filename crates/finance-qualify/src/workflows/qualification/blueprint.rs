use std::fmt;

use serde::Serialize;

use super::answers::{AnswerKey, AnswerRecord};
use super::domain::{answer_is, EmploymentStatus, FlowStage};

pub const REVIEW_STEP_ID: StepId = StepId("review");

/// Terminal pseudo-step shown once every applicable question has been answered.
pub static REVIEW_STEP: StepDefinition = StepDefinition {
    id: REVIEW_STEP_ID,
    prompt: "Review your answers and submit",
    stage: FlowStage::Complete,
    required: &[],
    applicability: Applicability::Always,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StepId(pub &'static str);

impl StepId {
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Inclusion rule evaluated against the answers recorded so far.
#[derive(Clone, Copy)]
pub enum Applicability {
    Always,
    /// Income verification branch; unrecognized statuses take [`EmploymentStatus::FALLBACK`].
    EmploymentIs(EmploymentStatus),
    /// Monthly debt question, asked only to buyers with open credit lines.
    HasOpenCreditLines,
    Custom(fn(&AnswerRecord) -> bool),
}

impl Applicability {
    pub fn applies(&self, record: &AnswerRecord) -> bool {
        match self {
            Applicability::Always => true,
            Applicability::EmploymentIs(status) => EmploymentStatus::branch_for(record) == *status,
            Applicability::HasOpenCreditLines => {
                answer_is(record, AnswerKey::OpenCreditLines, "yes, i do")
                    || answer_is(record, AnswerKey::OpenCreditLines, "yes")
            }
            Applicability::Custom(predicate) => predicate(record),
        }
    }
}

impl fmt::Debug for Applicability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Applicability::Always => f.write_str("Always"),
            Applicability::EmploymentIs(status) => {
                f.debug_tuple("EmploymentIs").field(status).finish()
            }
            Applicability::HasOpenCreditLines => f.write_str("HasOpenCreditLines"),
            Applicability::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One question in the flow.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub id: StepId,
    pub prompt: &'static str,
    pub stage: FlowStage,
    /// Answers that must be recorded before the flow moves past this step.
    pub required: &'static [AnswerKey],
    pub applicability: Applicability,
}

impl StepDefinition {
    pub fn is_applicable(&self, record: &AnswerRecord) -> bool {
        self.applicability.applies(record)
    }

    pub fn is_terminal(&self) -> bool {
        self.id == REVIEW_STEP_ID
    }

    pub fn missing_answers(&self, record: &AnswerRecord) -> Vec<AnswerKey> {
        self.required
            .iter()
            .copied()
            .filter(|key| !record.is_answered(*key))
            .collect()
    }

    pub fn to_view(&self) -> StepView {
        StepView {
            id: self.id,
            prompt: self.prompt,
            stage: self.stage,
            stage_label: self.stage.label(),
            required: self.required.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub id: StepId,
    pub prompt: &'static str,
    pub stage: FlowStage,
    pub stage_label: &'static str,
    pub required: Vec<AnswerKey>,
}

/// Ordered catalogue of qualification questions.
#[derive(Debug, Clone)]
pub struct QualificationBlueprint {
    steps: Vec<StepDefinition>,
}

impl QualificationBlueprint {
    pub fn standard() -> Self {
        Self {
            steps: standard_step_definitions(),
        }
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn steps_for_stage(&self, stage: FlowStage) -> Vec<&StepDefinition> {
        self.steps
            .iter()
            .filter(|step| step.stage == stage)
            .collect()
    }

    pub fn into_steps(self) -> Vec<StepDefinition> {
        self.steps
    }
}

const fn question(
    id: &'static str,
    prompt: &'static str,
    stage: FlowStage,
    required: &'static [AnswerKey],
) -> StepDefinition {
    StepDefinition {
        id: StepId(id),
        prompt,
        stage,
        required,
        applicability: Applicability::Always,
    }
}

const fn income_verification(
    id: &'static str,
    prompt: &'static str,
    status: EmploymentStatus,
) -> StepDefinition {
    StepDefinition {
        id: StepId(id),
        prompt,
        stage: FlowStage::Financial,
        required: &[AnswerKey::VerifyIncome],
        applicability: Applicability::EmploymentIs(status),
    }
}

fn standard_step_definitions() -> Vec<StepDefinition> {
    vec![
        question(
            "language_selection",
            "Choose your language",
            FlowStage::Property,
            &[AnswerKey::Language],
        ),
        question(
            "home_usage",
            "How will you use your new land?",
            FlowStage::Property,
            &[AnswerKey::HomeUsage],
        ),
        question(
            "real_estate_agent",
            "Are you working with a real estate agent?",
            FlowStage::Property,
            &[AnswerKey::RealEstateAgent],
        ),
        question(
            "home_purchase_timing",
            "When are you planning to make your land purchase?",
            FlowStage::Property,
            &[AnswerKey::HomePurchaseTiming],
        ),
        question(
            "current_home_ownership",
            "Do you currently own a home?",
            FlowStage::Property,
            &[AnswerKey::CurrentHomeOwnership],
        ),
        question(
            "current_on_all_payments",
            "Have you been current on all rent or housing/land payments over the last 12 months?",
            FlowStage::Property,
            &[AnswerKey::CurrentOnAllPayments],
        ),
        question(
            "down_payment",
            "Choose your payment plan",
            FlowStage::Property,
            &[AnswerKey::DownPayment],
        ),
        question(
            "employment_status",
            "What is your current employment status?",
            FlowStage::Financial,
            &[AnswerKey::EmploymentStatus],
        ),
        income_verification(
            "verify_income_employed",
            "Can you verify your income and provide last year's W-2 and two most recent pay stubs?",
            EmploymentStatus::Employed,
        ),
        income_verification(
            "verify_income_self_employed",
            "Can you provide your last two years of tax returns and 1099s?",
            EmploymentStatus::SelfEmployed,
        ),
        income_verification(
            "verify_income_not_employed",
            "Do you have another source of income you can verify?",
            EmploymentStatus::NotEmployed,
        ),
        income_verification(
            "verify_income_retired",
            "Can you verify your retirement income with award letters or statements?",
            EmploymentStatus::Retired,
        ),
        question(
            "income_history",
            "Do you have at least two years of consistent income history?",
            FlowStage::Financial,
            &[AnswerKey::IncomeHistory],
        ),
        question(
            "open_credit_lines",
            "Do you have any open credit lines or loans?",
            FlowStage::Financial,
            &[AnswerKey::OpenCreditLines],
        ),
        StepDefinition {
            id: StepId("total_monthly_payments"),
            prompt: "What are your total monthly payments?",
            stage: FlowStage::Financial,
            required: &[AnswerKey::TotalMonthlyPayments],
            applicability: Applicability::HasOpenCreditLines,
        },
        question(
            "gross_annual_income",
            "What is your household gross (before taxes) annual income?",
            FlowStage::Credit,
            &[AnswerKey::GrossAnnualIncome],
        ),
        question(
            "foreclosure_forbearance",
            "Are you currently in foreclosure or forbearance?",
            FlowStage::Credit,
            &[AnswerKey::ForeclosureForbearance],
        ),
        question(
            "declared_bankruptcy",
            "Have you declared bankruptcy in the last four years?",
            FlowStage::Credit,
            &[AnswerKey::DeclaredBankruptcy],
        ),
        question(
            "current_credit_score",
            "What is your current credit score?",
            FlowStage::Credit,
            &[AnswerKey::CurrentCreditScore],
        ),
        question(
            "liens_or_judgments",
            "Do you have any outstanding liens or judgments?",
            FlowStage::Credit,
            &[AnswerKey::LiensOrJudgments],
        ),
        question(
            "user_info",
            "Give us a way to reach you",
            FlowStage::Complete,
            &[
                AnswerKey::FirstName,
                AnswerKey::LastName,
                AnswerKey::Email,
                AnswerKey::Phone,
            ],
        ),
    ]
}
