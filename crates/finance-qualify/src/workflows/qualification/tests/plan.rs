use super::common::*;
use crate::workflows::qualification::{
    monthly_payment, AnswerValue, FinancingPlan, PlanError, PlanTier, PropertyContext,
};

fn tier(down_payment: f64, interest_rate: f64, term: u32) -> PlanTier {
    PlanTier {
        label: "1".to_string(),
        down_payment,
        interest_rate,
        term,
    }
}

#[test]
fn thirty_year_six_percent_loan_matches_amortization_table() {
    let plan = FinancingPlan::calculate(100_000.0, &tier(10_000.0, 6.0, 360)).expect("valid plan");

    assert_eq!(plan.loan_amount, 90_000.0);
    assert_eq!(plan.down_payment, 10_000.0);
    assert_eq!(plan.term, 360);
    assert!((plan.monthly_payment - 539.60).abs() < 0.01, "{}", plan.monthly_payment);
}

#[test]
fn zero_rate_spreads_loan_evenly() {
    let payment = monthly_payment(12_000.0, 0.0, 24).expect("valid inputs");
    assert_eq!(payment, 500.0);
}

#[test]
fn guards_reject_out_of_domain_inputs() {
    assert_eq!(
        monthly_payment(10_000.0, 5.0, 0),
        Err(PlanError::NonPositiveTerm)
    );
    assert_eq!(
        monthly_payment(10_000.0, -1.0, 12),
        Err(PlanError::NegativeRate(-1.0))
    );
    assert!(matches!(
        monthly_payment(f64::NAN, 5.0, 12),
        Err(PlanError::InvalidAmount { field: "loan amount", .. })
    ));
    assert!(matches!(
        FinancingPlan::calculate(f64::INFINITY, &tier(1_000.0, 5.0, 12)),
        Err(PlanError::InvalidAmount { field: "property price", .. })
    ));
}

#[test]
fn down_payment_above_price_floors_loan_at_zero() {
    let plan = FinancingPlan::calculate(40_000.0, &tier(45_000.0, 7.5, 60)).expect("valid plan");

    assert_eq!(plan.loan_amount, 0.0);
    assert_eq!(plan.monthly_payment, 0.0);
}

#[test]
fn property_tiers_resolve_by_label() {
    let context = property_context();

    let plan = context
        .plan_for(" 2 ")
        .expect("tier prices")
        .expect("tier offered");
    assert_eq!(plan.down_payment, 50_000.0);
    assert_eq!(plan.loan_amount, 200_000.0);
    assert_eq!(plan.term, 84);
    assert_eq!(plan.down_payment_ratio(250_000.0), Some(0.2));

    assert_eq!(context.plan_for("4").expect("no pricing needed"), None);
}

#[test]
fn unpriced_property_surfaces_a_plan_error() {
    let context = PropertyContext {
        asking_price: Some(AnswerValue::from("-5")),
        ..property_context()
    };

    assert!(matches!(
        context.plan_for("1"),
        Err(PlanError::InvalidAmount { field: "property price", .. })
    ));
}
