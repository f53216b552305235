use crate::infra::InMemorySubmissionSink;
use chrono::Utc;
use clap::Args;
use finance_qualify::config::{AppConfig, QualificationConfig};
use finance_qualify::error::AppError;
use finance_qualify::workflows::audit::{AuditReport, QualificationAuditor};
use finance_qualify::workflows::qualification::{
    AnswerKey, AnswerValue, PlanTier, PropertyContext, QualificationService,
    QualificationServiceError, SessionView, SubmissionReceipt, REVIEW_STEP_ID,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Employment answer for the scripted buyer (Employed, Self-Employed 1099, Not Employed, Retired)
    #[arg(long, default_value = "Employed")]
    pub(crate) employment_status: String,
    /// Financing tier to select from the demo listing (1, 2 or 3)
    #[arg(long, default_value = "1")]
    pub(crate) tier: String,
    /// Down payment the buyer commits to. Defaults to the selected tier's amount.
    #[arg(long)]
    pub(crate) down_payment: Option<f64>,
}

#[derive(Args, Debug)]
pub(crate) struct AuditArgs {
    /// CSV export of stored qualification records
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Override the configured minimum down payment ratio for this run, in (0, 1]
    #[arg(
        long = "min-down-payment-ratio",
        allow_negative_numbers = true,
        value_parser = parse_down_payment_ratio
    )]
    pub(crate) qualification: Option<QualificationConfig>,
}

pub(crate) fn parse_down_payment_ratio(raw: &str) -> Result<QualificationConfig, String> {
    QualificationConfig::from_ratio(raw).map_err(|err| err.to_string())
}

pub(crate) fn run_audit(args: AuditArgs) -> Result<(), AppError> {
    let AuditArgs { csv, qualification } = args;

    let qualification = match qualification {
        Some(overridden) => overridden,
        None => AppConfig::load()?.qualification,
    };
    let evaluation = qualification.evaluation_config();

    let report = QualificationAuditor::from_path(&csv, evaluation, Utc::now())?;
    render_audit_report(&csv, &report);
    Ok(())
}

fn render_audit_report(csv: &std::path::Path, report: &AuditReport) {
    println!("Qualification audit for {}", csv.display());
    println!(
        "- {} rows | {} qualify under current rules",
        report.row_count, report.qualified_count
    );

    if report.is_clean() {
        println!("- stored decisions match re-evaluation");
        return;
    }

    if !report.mismatches.is_empty() {
        println!("Drifted rows:");
        for mismatch in &report.mismatches {
            println!(
                "  - row {}: stored {} ({}) | now {} ({})",
                mismatch.row,
                qualified_label(mismatch.stored_qualified),
                mismatch.stored_reason.as_deref().unwrap_or("no reason"),
                qualified_label(mismatch.recomputed_qualified),
                mismatch.recomputed_reason.as_deref().unwrap_or("no reason"),
            );
        }
    }

    if !report.missing_flag.is_empty() {
        let rows: Vec<String> = report.missing_flag.iter().map(usize::to_string).collect();
        println!("Rows without a stored decision: {}", rows.join(", "));
    }
}

fn qualified_label(qualified: bool) -> &'static str {
    if qualified {
        "qualified"
    } else {
        "not qualified"
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        employment_status,
        tier,
        down_payment,
    } = args;

    let config = AppConfig::load()?;
    let sink = Arc::new(InMemorySubmissionSink::default());
    let service = QualificationService::new(sink.clone(), config.qualification.evaluation_config());

    println!("Buyer qualification demo");
    let listing = demo_listing();
    println!(
        "Listing {} | {} | {}, {}",
        listing.property_id, listing.title, listing.city, listing.state
    );

    let outcome = walk_demo_buyer(&service, listing, &employment_status, &tier, down_payment);
    match outcome {
        Ok(receipt) => {
            render_receipt(&receipt);
            println!("\nStored payloads: {}", sink.delivered().len());
        }
        Err(err) => println!("\nDemo stopped: {err}"),
    }

    Ok(())
}

fn walk_demo_buyer(
    service: &QualificationService<InMemorySubmissionSink>,
    listing: PropertyContext,
    employment_status: &str,
    tier: &str,
    down_payment: Option<f64>,
) -> Result<SubmissionReceipt, QualificationServiceError> {
    let session = service.start(listing)?;
    let session_id = session.session_id;

    let priced = service.select_plan(&session_id, tier)?;
    println!(
        "Selected tier {tier}: {} down | {} / month over {} months",
        priced.answers.display(AnswerKey::DownPayment),
        priced.answers.display(AnswerKey::MonthlyPayment),
        priced.answers.display(AnswerKey::Term),
    );

    let mut answers = demo_answers(employment_status);
    let committed = down_payment
        .or_else(|| priced.answers.number(AnswerKey::DownPayment))
        .unwrap_or_default();
    answers.insert(AnswerKey::DownPayment, AnswerValue::from(committed));

    println!("\nQuestionnaire");
    let mut view = priced;
    while view.current_step.id != REVIEW_STEP_ID {
        render_step(&view);
        let batch = view
            .current_step
            .required
            .iter()
            .filter_map(|key| answers.get(key).map(|value| (*key, value.clone())))
            .collect();
        service.answer(&session_id, batch)?;
        view = service.next(&session_id)?;
    }

    service.submit(&session_id)
}

fn render_step(view: &SessionView) {
    let keys: Vec<&str> = view
        .current_step
        .required
        .iter()
        .map(|key| key.as_str())
        .collect();
    println!(
        "  [{:>3}%] {} ({}): {}",
        view.progress.percent,
        view.current_step.id,
        view.progress.stage_label,
        keys.join(", ")
    );
}

fn render_receipt(receipt: &SubmissionReceipt) {
    println!("\nOutcome: {}", receipt.verdict.summary());
    println!(
        "Qualification {} stored for session {}",
        receipt.qualification_id, receipt.session_id
    );

    let payload = &receipt.payload;
    println!(
        "- loan {} at {}% for {} months | {} / month",
        format_amount(payload.loan_amount),
        format_amount(payload.interest_rate),
        payload.term.map(|term| term.to_string()).unwrap_or_default(),
        format_amount(payload.monthly_payment),
    );
    println!(
        "- buyer {} {} <{}> | employment {}",
        payload.first_name, payload.last_name, payload.email, payload.employment_status
    );
}

fn format_amount(value: Option<f64>) -> String {
    value.map(|amount| format!("{amount:.2}")).unwrap_or_else(|| "-".to_string())
}

fn demo_listing() -> PropertyContext {
    PropertyContext {
        property_id: "prop-demo-1".to_string(),
        owner_id: Some("7".to_string()),
        asking_price: Some(AnswerValue::from("120,000")),
        title: "Five wooded acres near the river".to_string(),
        street_address: "410 County Road 212".to_string(),
        city: "Smithville".to_string(),
        state: "TX".to_string(),
        zip: "78957".to_string(),
        financing_available: true,
        term: None,
        tiers: vec![
            PlanTier {
                label: "1".to_string(),
                down_payment: 12_000.0,
                interest_rate: 7.5,
                term: 240,
            },
            PlanTier {
                label: "2".to_string(),
                down_payment: 24_000.0,
                interest_rate: 6.9,
                term: 180,
            },
            PlanTier {
                label: "3".to_string(),
                down_payment: 6_000.0,
                interest_rate: 9.0,
                term: 360,
            },
        ],
    }
}

fn demo_answers(employment_status: &str) -> BTreeMap<AnswerKey, AnswerValue> {
    [
        (AnswerKey::Language, "English"),
        (AnswerKey::HomeUsage, "Build a home"),
        (AnswerKey::RealEstateAgent, "No"),
        (AnswerKey::HomePurchaseTiming, "Within 3 months"),
        (AnswerKey::CurrentHomeOwnership, "No"),
        (AnswerKey::CurrentOnAllPayments, "Yes"),
        (AnswerKey::EmploymentStatus, employment_status),
        (AnswerKey::VerifyIncome, "Yes, I can"),
        (AnswerKey::IncomeHistory, "Yes"),
        (AnswerKey::OpenCreditLines, "Yes, I do"),
        (AnswerKey::TotalMonthlyPayments, "$850"),
        (AnswerKey::GrossAnnualIncome, "$75,000 - $100,000"),
        (AnswerKey::ForeclosureForbearance, "No"),
        (AnswerKey::DeclaredBankruptcy, "No"),
        (AnswerKey::CurrentCreditScore, "Good (680-719)"),
        (AnswerKey::LiensOrJudgments, "No"),
        (AnswerKey::FirstName, "Avery"),
        (AnswerKey::LastName, "Delgado"),
        (AnswerKey::Email, "avery.delgado@example.com"),
        (AnswerKey::Phone, "512-555-0142"),
    ]
    .into_iter()
    .map(|(key, value)| (key, AnswerValue::from(value)))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use finance_qualify::workflows::qualification::EvaluationConfig;

    fn demo_service() -> (
        QualificationService<InMemorySubmissionSink>,
        Arc<InMemorySubmissionSink>,
    ) {
        let sink = Arc::new(InMemorySubmissionSink::default());
        let service = QualificationService::new(sink.clone(), EvaluationConfig::default());
        (service, sink)
    }

    #[test]
    fn scripted_buyer_qualifies_on_first_tier() {
        let (service, sink) = demo_service();

        let receipt = walk_demo_buyer(&service, demo_listing(), "Employed", "1", None)
            .expect("demo completes");

        assert!(receipt.verdict.is_qualified());
        assert_eq!(receipt.payload.loan_amount, Some(108_000.0));
        assert_eq!(sink.delivered().len(), 1);
    }

    #[test]
    fn smallest_tier_falls_below_minimum_down_payment() {
        let (service, _) = demo_service();

        let receipt = walk_demo_buyer(&service, demo_listing(), "Retired", "3", None)
            .expect("demo completes");

        assert!(!receipt.verdict.is_qualified());
        assert_eq!(
            receipt.payload.disqualification_reason.as_deref(),
            Some("down payment below minimum (10%)")
        );
    }

    #[test]
    fn unknown_tier_stops_the_walk() {
        let (service, sink) = demo_service();

        let result = walk_demo_buyer(&service, demo_listing(), "Employed", "9", None);

        assert!(matches!(
            result,
            Err(QualificationServiceError::UnknownPlanTier(_))
        ));
        assert!(sink.delivered().is_empty());
    }
}
