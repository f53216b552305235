use super::common::*;
use crate::workflows::qualification::{
    AnswerKey, AnswerRecord, DisqualificationReason, EvaluationConfig, FinancingPlan,
    QualificationEvaluator, QualificationVerdict,
};

fn evaluate(record: &AnswerRecord) -> QualificationVerdict {
    let plan = FinancingPlan::from_record(record);
    QualificationEvaluator::default().evaluate_at(record, &plan, evaluated_at())
}

fn reason(record: &AnswerRecord) -> Option<DisqualificationReason> {
    evaluate(record).disqualification_reason().cloned()
}

#[test]
fn qualifying_buyer_with_ample_down_payment_is_qualified() {
    let mut record = qualified_record();
    record.insert(AnswerKey::CurrentCreditScore, "Excellent (720+)");
    record.insert(AnswerKey::GrossAnnualIncome, "$100,000+");

    let verdict = evaluate(&record);

    assert!(verdict.is_qualified());
    assert_eq!(verdict.disqualification_reason(), None);
    assert_eq!(verdict.summary(), "qualified");
}

#[test]
fn down_payment_under_ten_percent_is_disqualifying() {
    let mut record = qualified_record();
    record.insert(AnswerKey::DownPayment, "20,000");

    let verdict = evaluate(&record);

    assert!(!verdict.is_qualified());
    let reason = verdict.disqualification_reason().expect("reason present");
    assert_eq!(reason.summary(), "down payment below minimum (10%)");
    assert_eq!(
        reason,
        &DisqualificationReason::DownPaymentBelowMinimum {
            minimum_ratio: 0.10,
            required: 25_000.0,
            provided: 20_000.0,
        }
    );
}

#[test]
fn down_payment_at_exactly_the_minimum_qualifies() {
    let mut record = qualified_record();
    record.insert(AnswerKey::DownPayment, "$25,000");

    assert!(evaluate(&record).is_qualified());
}

#[test]
fn minimum_is_compared_before_rounding_to_cents() {
    let mut record = qualified_record();
    record.insert(AnswerKey::PropertyPrice, "100,000.05");

    // The minimum is 10,000.005; rounding it first would demand 10,000.01.
    record.insert(AnswerKey::DownPayment, "10,000.006");
    assert!(evaluate(&record).is_qualified());

    record.insert(AnswerKey::DownPayment, "10,000.004");
    assert!(matches!(
        reason(&record),
        Some(DisqualificationReason::DownPaymentBelowMinimum { provided, .. }) if provided == 10_000.004
    ));
}

#[test]
fn delinquent_payments_always_disqualify() {
    let mut record = qualified_record();
    record.insert(AnswerKey::CurrentOnAllPayments, "No");
    record.insert(AnswerKey::DownPayment, "200,000");

    assert_eq!(reason(&record), Some(DisqualificationReason::DelinquentPayments));
}

#[test]
fn each_disqualifier_reports_its_reason() {
    let cases = [
        (
            AnswerKey::CurrentCreditScore,
            "Below average (620-659)",
            DisqualificationReason::CreditScore,
        ),
        (
            AnswerKey::CurrentCreditScore,
            "Bad (Below 580)",
            DisqualificationReason::CreditScore,
        ),
        (
            AnswerKey::GrossAnnualIncome,
            "$50,000 - $75,000",
            DisqualificationReason::InsufficientIncome,
        ),
        (
            AnswerKey::ForeclosureForbearance,
            "Yes",
            DisqualificationReason::AdverseCreditHistory,
        ),
        (
            AnswerKey::DeclaredBankruptcy,
            "Yes",
            DisqualificationReason::AdverseCreditHistory,
        ),
        (
            AnswerKey::LiensOrJudgments,
            "yes",
            DisqualificationReason::AdverseCreditHistory,
        ),
        (
            AnswerKey::VerifyIncome,
            "No, I cannot",
            DisqualificationReason::UnverifiableIncome,
        ),
        (
            AnswerKey::VerifyIncome,
            "No, I don\u{2019}t",
            DisqualificationReason::UnverifiableIncome,
        ),
        (
            AnswerKey::IncomeHistory,
            "No",
            DisqualificationReason::InsufficientIncomeHistory,
        ),
    ];

    for (key, answer, expected) in cases {
        let mut record = qualified_record();
        record.insert(key, answer);
        assert_eq!(reason(&record), Some(expected), "{key} = {answer}");
    }
}

#[test]
fn fair_credit_and_middle_income_are_not_disqualifying() {
    for band in ["Fair (660-679)", "No Credit"] {
        let mut record = qualified_record();
        record.insert(AnswerKey::CurrentCreditScore, band);
        record.insert(AnswerKey::GrossAnnualIncome, "$75,000 - $100,000");

        assert!(evaluate(&record).is_qualified(), "{band}");
    }
}

#[test]
fn first_matching_disqualifier_wins() {
    let mut record = qualified_record();
    record.insert(AnswerKey::IncomeHistory, "No");
    record.insert(AnswerKey::CurrentOnAllPayments, "No");
    record.insert(AnswerKey::CurrentCreditScore, "Poor (580-619)");
    record.insert(AnswerKey::DownPayment, "0");

    assert_eq!(reason(&record), Some(DisqualificationReason::CreditScore));
}

#[test]
fn missing_or_unreadable_price_fails_closed() {
    let mut record = qualified_record();
    record.insert(AnswerKey::PropertyPrice, "call for pricing");

    let verdict = evaluate(&record);
    assert!(!verdict.is_qualified());
    assert_eq!(
        verdict.disqualification_reason(),
        Some(&DisqualificationReason::PropertyPriceUnavailable {
            minimum_ratio: 0.10
        })
    );

    let record: AnswerRecord = qualified_record()
        .iter()
        .filter(|(key, _)| *key != AnswerKey::PropertyPrice)
        .map(|(key, value)| (key, value.clone()))
        .collect();
    assert!(!evaluate(&record).is_qualified());
}

#[test]
fn missing_down_payment_counts_as_zero() {
    let record: AnswerRecord = qualified_record()
        .iter()
        .filter(|(key, _)| *key != AnswerKey::DownPayment)
        .map(|(key, value)| (key, value.clone()))
        .collect();

    assert!(matches!(
        reason(&record),
        Some(DisqualificationReason::DownPaymentBelowMinimum { provided, .. }) if provided == 0.0
    ));
}

#[test]
fn configured_ratio_changes_the_threshold() {
    let record = qualified_record();
    let plan = FinancingPlan::from_record(&record);
    let strict = QualificationEvaluator::new(EvaluationConfig {
        minimum_down_payment_ratio: 0.2,
    });

    let verdict = strict.evaluate_at(&record, &plan, evaluated_at());

    assert!(!verdict.is_qualified());
    assert_eq!(
        verdict.disqualification_reason().map(|reason| reason.summary()),
        Some("down payment below minimum (20%)".to_string())
    );
}

#[test]
fn evaluation_is_deterministic_apart_from_timestamp() {
    let record = qualified_record();
    let plan = FinancingPlan::from_record(&record);
    let evaluator = QualificationEvaluator::default();

    let first = evaluator.evaluate_at(&record, &plan, evaluated_at());
    let second = evaluator.evaluate(&record, &plan);

    assert_eq!(first, second);
    assert_ne!(first.evaluated_at(), second.evaluated_at());
}

#[test]
fn verdict_serializes_reason_as_text() {
    let mut record = qualified_record();
    record.insert(AnswerKey::DeclaredBankruptcy, "Yes");

    let json = serde_json::to_value(evaluate(&record)).expect("verdict serializes");

    assert_eq!(json["qualified"], serde_json::json!(false));
    assert_eq!(
        json["disqualificationReason"],
        serde_json::json!("adverse credit history")
    );
    assert_eq!(json["evaluatedAt"], serde_json::json!("2025-03-14T15:00:00Z"));
}
