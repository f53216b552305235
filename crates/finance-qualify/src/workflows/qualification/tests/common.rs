use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::qualification::{
    AnswerKey, AnswerRecord, AnswerValue, EvaluationConfig, PropertyContext, PlanTier,
    QualificationId, QualificationPayload, QualificationService, SessionId, SinkError,
    SinkReceipt, StepFlowEngine, StepId, SubmissionSink, REVIEW_STEP_ID,
};

pub(super) fn evaluated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 15, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn property_context() -> PropertyContext {
    PropertyContext {
        property_id: "prop-1042".to_string(),
        owner_id: Some("7".to_string()),
        asking_price: Some(AnswerValue::from("250,000")),
        title: "Ten wooded acres off FM 521".to_string(),
        street_address: "4410 FM 521".to_string(),
        city: "Angleton".to_string(),
        state: "TX".to_string(),
        zip: "77515".to_string(),
        financing_available: true,
        term: Some(120),
        tiers: vec![
            PlanTier {
                label: "1".to_string(),
                down_payment: 25_000.0,
                interest_rate: 9.9,
                term: 120,
            },
            PlanTier {
                label: "2".to_string(),
                down_payment: 50_000.0,
                interest_rate: 8.5,
                term: 84,
            },
            PlanTier {
                label: "3".to_string(),
                down_payment: 12_500.0,
                interest_rate: 11.0,
                term: 180,
            },
        ],
    }
}

/// Answers for every standard question from a buyer who qualifies.
pub(super) fn buyer_answers() -> BTreeMap<AnswerKey, AnswerValue> {
    [
        (AnswerKey::Language, "English"),
        (AnswerKey::HomeUsage, "Primary residence"),
        (AnswerKey::RealEstateAgent, "No"),
        (AnswerKey::HomePurchaseTiming, "Within 3 months"),
        (AnswerKey::CurrentHomeOwnership, "No"),
        (AnswerKey::CurrentOnAllPayments, "Yes"),
        (AnswerKey::DownPayment, "30,000"),
        (AnswerKey::EmploymentStatus, "Employed"),
        (AnswerKey::VerifyIncome, "Yes, I can"),
        (AnswerKey::IncomeHistory, "Yes"),
        (AnswerKey::OpenCreditLines, "No, I don't"),
        (AnswerKey::TotalMonthlyPayments, "450"),
        (AnswerKey::GrossAnnualIncome, "$100,000 - $150,000"),
        (AnswerKey::ForeclosureForbearance, "No"),
        (AnswerKey::DeclaredBankruptcy, "No"),
        (AnswerKey::CurrentCreditScore, "Excellent (720+)"),
        (AnswerKey::LiensOrJudgments, "No"),
        (AnswerKey::FirstName, "Dana"),
        (AnswerKey::LastName, "Reyes"),
        (AnswerKey::Email, "dana.reyes@example.com"),
        (AnswerKey::Phone, "979-555-0142"),
    ]
    .into_iter()
    .map(|(key, value)| (key, AnswerValue::from(value)))
    .collect()
}

/// Completed record with property context, as evaluated at submission.
pub(super) fn qualified_record() -> AnswerRecord {
    let mut record = property_context().seed();
    for (key, value) in buyer_answers() {
        record.insert(key, value);
    }
    record
}

pub(super) fn standard_engine() -> StepFlowEngine {
    StepFlowEngine::standard(property_context().seed())
}

/// Fill the current step's required answers from `answers`.
pub(super) fn answer_current(engine: &mut StepFlowEngine, answers: &BTreeMap<AnswerKey, AnswerValue>) {
    let required = engine.current_step().required;
    for key in required {
        let value = answers
            .get(key)
            .cloned()
            .unwrap_or_else(|| panic!("no scripted answer for {key}"));
        engine.update_answer(*key, value).expect("flow accepts answers");
    }
}

/// Answer and advance until `target` is current.
pub(super) fn advance_to(
    engine: &mut StepFlowEngine,
    answers: &BTreeMap<AnswerKey, AnswerValue>,
    target: &'static str,
) {
    while engine.current_step().id != StepId(target) {
        assert!(
            !engine.is_at_review(),
            "reached review without visiting {target}"
        );
        answer_current(engine, answers);
        engine.next().expect("scripted answers satisfy every step");
    }
}

pub(super) fn walk_to_review(
    engine: &mut StepFlowEngine,
    answers: &BTreeMap<AnswerKey, AnswerValue>,
) -> Vec<StepId> {
    let mut visited = Vec::new();
    while !engine.is_at_review() {
        visited.push(engine.current_step().id);
        answer_current(engine, answers);
        engine.next().expect("scripted answers satisfy every step");
    }
    visited
}

pub(super) fn build_service() -> (Arc<QualificationService<MemorySink>>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    let service = QualificationService::new(sink.clone(), EvaluationConfig::default());
    (Arc::new(service), sink)
}

/// Drive a service session through every question using `answers`.
pub(super) fn complete_session<S: SubmissionSink + 'static>(
    service: &QualificationService<S>,
    session_id: &SessionId,
    answers: &BTreeMap<AnswerKey, AnswerValue>,
) {
    loop {
        let view = service.view(session_id).expect("session exists");
        if view.current_step.id == REVIEW_STEP_ID {
            break;
        }
        let batch = view
            .current_step
            .required
            .iter()
            .map(|key| (*key, answers[key].clone()))
            .collect();
        service.answer(session_id, batch).expect("answers recorded");
        service.next(session_id).expect("step completes");
    }
}

#[derive(Default)]
pub(super) struct MemorySink {
    delivered: Mutex<Vec<QualificationPayload>>,
}

impl MemorySink {
    pub(super) fn delivered(&self) -> Vec<QualificationPayload> {
        self.delivered.lock().expect("sink mutex poisoned").clone()
    }
}

impl SubmissionSink for MemorySink {
    fn deliver(&self, payload: &QualificationPayload) -> Result<SinkReceipt, SinkError> {
        let mut delivered = self.delivered.lock().expect("sink mutex poisoned");
        delivered.push(payload.clone());
        Ok(SinkReceipt {
            qualification_id: QualificationId(format!("qual-{:06}", delivered.len())),
        })
    }
}

/// Rejects the first `failures` deliveries, then accepts.
pub(super) struct FlakySink {
    failures: AtomicU32,
    inner: MemorySink,
}

impl FlakySink {
    pub(super) fn failing(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            inner: MemorySink::default(),
        }
    }

    pub(super) fn delivered(&self) -> Vec<QualificationPayload> {
        self.inner.delivered()
    }
}

impl SubmissionSink for FlakySink {
    fn deliver(&self, payload: &QualificationPayload) -> Result<SinkReceipt, SinkError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(SinkError::Unavailable("storage api timed out".to_string()));
        }
        self.inner.deliver(payload)
    }
}

/// Holds each delivery until the test lets it through.
pub(super) struct GatedSink {
    entered: Barrier,
    release: Barrier,
    inner: MemorySink,
}

impl GatedSink {
    pub(super) fn new() -> Self {
        Self {
            entered: Barrier::new(2),
            release: Barrier::new(2),
            inner: MemorySink::default(),
        }
    }

    /// Block until a delivery is inside the sink.
    pub(super) fn wait_for_delivery(&self) {
        self.entered.wait();
    }

    pub(super) fn release(&self) {
        self.release.wait();
    }

    pub(super) fn delivered(&self) -> Vec<QualificationPayload> {
        self.inner.delivered()
    }
}

impl SubmissionSink for GatedSink {
    fn deliver(&self, payload: &QualificationPayload) -> Result<SinkReceipt, SinkError> {
        self.entered.wait();
        self.release.wait();
        self.inner.deliver(payload)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
