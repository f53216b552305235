use super::super::answers::{AnswerKey, AnswerRecord};
use super::super::domain::{answer_is, normalize_answer, CreditScoreBand, IncomeBand};
use super::super::plan::{round_cents, FinancingPlan};
use super::config::EvaluationConfig;
use super::policy::DisqualificationReason;

/// Answer-only rule that forces a "not qualified" verdict.
pub(crate) struct Disqualifier {
    pub reason: DisqualificationReason,
    pub applies: fn(&AnswerRecord) -> bool,
}

/// Checked in order; the first match supplies the reason.
pub(crate) const DISQUALIFIERS: [Disqualifier; 6] = [
    Disqualifier {
        reason: DisqualificationReason::CreditScore,
        applies: low_credit_score,
    },
    Disqualifier {
        reason: DisqualificationReason::DelinquentPayments,
        applies: delinquent_payments,
    },
    Disqualifier {
        reason: DisqualificationReason::InsufficientIncome,
        applies: insufficient_income,
    },
    Disqualifier {
        reason: DisqualificationReason::AdverseCreditHistory,
        applies: adverse_credit_history,
    },
    Disqualifier {
        reason: DisqualificationReason::UnverifiableIncome,
        applies: unverifiable_income,
    },
    Disqualifier {
        reason: DisqualificationReason::InsufficientIncomeHistory,
        applies: insufficient_income_history,
    },
];

fn low_credit_score(record: &AnswerRecord) -> bool {
    record
        .text(AnswerKey::CurrentCreditScore)
        .and_then(CreditScoreBand::parse)
        .map(CreditScoreBand::is_disqualifying)
        .unwrap_or(false)
}

fn delinquent_payments(record: &AnswerRecord) -> bool {
    answer_is(record, AnswerKey::CurrentOnAllPayments, "no")
}

fn insufficient_income(record: &AnswerRecord) -> bool {
    record
        .text(AnswerKey::GrossAnnualIncome)
        .and_then(IncomeBand::parse)
        .map(IncomeBand::is_insufficient)
        .unwrap_or(false)
}

fn adverse_credit_history(record: &AnswerRecord) -> bool {
    [
        AnswerKey::ForeclosureForbearance,
        AnswerKey::DeclaredBankruptcy,
        AnswerKey::LiensOrJudgments,
    ]
    .into_iter()
    .any(|key| answer_is(record, key, "yes"))
}

fn unverifiable_income(record: &AnswerRecord) -> bool {
    record
        .text(AnswerKey::VerifyIncome)
        .map(normalize_answer)
        .map(|answer| answer == "no, i cannot" || answer == "no, i don't")
        .unwrap_or(false)
}

fn insufficient_income_history(record: &AnswerRecord) -> bool {
    answer_is(record, AnswerKey::IncomeHistory, "no")
}

/// Down payment against the configured share of the recorded property price.
pub(crate) fn affordability(
    record: &AnswerRecord,
    plan: &FinancingPlan,
    config: &EvaluationConfig,
) -> Option<DisqualificationReason> {
    let minimum_ratio = config.minimum_down_payment_ratio;
    let price = record
        .number(AnswerKey::PropertyPrice)
        .filter(|price| *price > 0.0);

    let Some(price) = price else {
        return Some(DisqualificationReason::PropertyPriceUnavailable { minimum_ratio });
    };

    let required = price * minimum_ratio;
    if plan.down_payment < required {
        return Some(DisqualificationReason::DownPaymentBelowMinimum {
            minimum_ratio,
            required: round_cents(required),
            provided: plan.down_payment,
        });
    }

    None
}
