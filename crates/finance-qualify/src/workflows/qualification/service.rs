use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::answers::{AnswerKey, AnswerRecord, AnswerValue};
use super::blueprint::{QualificationBlueprint, StepDefinition, StepId, StepView};
use super::domain::PropertyContext;
use super::evaluation::{EvaluationConfig, QualificationEvaluator, QualificationVerdict};
use super::flow::{ConfigurationError, FlowError, FlowProgress, FlowState, StepFlowEngine};
use super::plan::{FinancingPlan, PlanError};
use super::sink::{QualificationId, SinkError, SubmissionSink};
use super::submission::{QualificationPayload, Submission};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Session {
    context: PropertyContext,
    engine: StepFlowEngine,
    submission: Option<Submission>,
    receipt: Option<SubmissionReceipt>,
    /// Set while the payload is with the sink.
    delivering: bool,
}

impl Session {
    fn view(&self, session_id: &SessionId) -> SessionView {
        SessionView {
            session_id: session_id.clone(),
            property_id: self.context.property_id.clone(),
            state: self.engine.state(),
            current_step: self.engine.current_step().to_view(),
            progress: self.engine.progress(),
            can_go_back: self.engine.can_go_back(),
            applicable_steps: self
                .engine
                .applicable_steps()
                .into_iter()
                .map(|step| step.id)
                .collect(),
            answers: self.engine.record().clone(),
            verdict: self
                .submission
                .as_ref()
                .map(|submission| submission.verdict.clone()),
            receipt: self.receipt.clone(),
        }
    }
}

/// Snapshot of a session returned by every navigation call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: SessionId,
    pub property_id: String,
    pub state: FlowState,
    pub current_step: StepView,
    pub progress: FlowProgress,
    pub can_go_back: bool,
    pub applicable_steps: Vec<StepId>,
    pub answers: AnswerRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<QualificationVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<SubmissionReceipt>,
}

/// Confirmation that a qualification reached the storage backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub session_id: SessionId,
    pub qualification_id: QualificationId,
    pub verdict: QualificationVerdict,
    pub payload: QualificationPayload,
}

/// Delivered sessions kept readable before the oldest are evicted.
const DEFAULT_RECEIPT_RETENTION: usize = 1024;

#[derive(Default)]
struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    /// Sessions holding a receipt, oldest first.
    delivered: VecDeque<SessionId>,
}

impl SessionStore {
    fn remove(&mut self, session_id: &SessionId) -> Option<Session> {
        self.delivered.retain(|delivered| delivered != session_id);
        self.sessions.remove(session_id)
    }

    fn settle_delivery(
        &mut self,
        session_id: &SessionId,
        receipt: Option<&SubmissionReceipt>,
        retention: usize,
    ) {
        let Some(session) = self.sessions.get_mut(session_id) else {
            return;
        };
        session.delivering = false;

        if let Some(receipt) = receipt {
            session.receipt = Some(receipt.clone());
            self.delivered.push_back(session_id.clone());
            while self.delivered.len() > retention {
                if let Some(oldest) = self.delivered.pop_front() {
                    self.sessions.remove(&oldest);
                    debug!(session = %oldest, "delivered session evicted");
                }
            }
        }
    }
}

/// Hosts one flow engine per buyer session and hands submissions to the sink.
pub struct QualificationService<S> {
    sink: Arc<S>,
    evaluator: QualificationEvaluator,
    steps: Vec<StepDefinition>,
    store: Mutex<SessionStore>,
    receipt_retention: usize,
    sequence: AtomicU64,
}

impl<S> QualificationService<S>
where
    S: SubmissionSink + 'static,
{
    pub fn new(sink: Arc<S>, config: EvaluationConfig) -> Self {
        Self {
            sink,
            evaluator: QualificationEvaluator::new(config),
            steps: QualificationBlueprint::standard().into_steps(),
            store: Mutex::new(SessionStore::default()),
            receipt_retention: DEFAULT_RECEIPT_RETENTION,
            sequence: AtomicU64::new(1),
        }
    }

    /// Service over a caller-defined step list, validated up front.
    pub fn with_steps(
        sink: Arc<S>,
        config: EvaluationConfig,
        steps: Vec<StepDefinition>,
    ) -> Result<Self, ConfigurationError> {
        StepFlowEngine::initialize(steps.clone(), AnswerRecord::new())?;
        Ok(Self {
            steps,
            ..Self::new(sink, config)
        })
    }

    /// Cap how many delivered sessions stay readable; older ones are evicted.
    pub fn with_receipt_retention(mut self, limit: usize) -> Self {
        self.receipt_retention = limit;
        self
    }

    pub fn start(&self, context: PropertyContext) -> Result<SessionView, QualificationServiceError> {
        let engine = StepFlowEngine::initialize(self.steps.clone(), context.seed())
            .map_err(FlowError::from)?
            .with_evaluation_config(self.evaluator.config().clone());

        let session_id = self.next_session_id();
        let session = Session {
            context,
            engine,
            submission: None,
            receipt: None,
            delivering: false,
        };
        let view = session.view(&session_id);

        info!(
            session = %session_id,
            property = %session.context.property_id,
            "qualification session started"
        );
        self.lock_store().sessions.insert(session_id, session);
        Ok(view)
    }

    pub fn view(&self, session_id: &SessionId) -> Result<SessionView, QualificationServiceError> {
        self.with_session(session_id, |session| Ok(session.view(session_id)))
    }

    /// Drop a session, finished or abandoned. A delivery already in flight
    /// still completes for its caller.
    pub fn discard(&self, session_id: &SessionId) -> Result<(), QualificationServiceError> {
        self.lock_store()
            .remove(session_id)
            .ok_or_else(|| QualificationServiceError::SessionNotFound(session_id.clone()))?;
        info!(session = %session_id, "qualification session discarded");
        Ok(())
    }

    pub fn answer(
        &self,
        session_id: &SessionId,
        answers: BTreeMap<AnswerKey, AnswerValue>,
    ) -> Result<SessionView, QualificationServiceError> {
        self.with_session(session_id, |session| {
            for (key, value) in answers {
                session.engine.update_answer(key, value)?;
            }
            Ok(session.view(session_id))
        })
    }

    /// Price one of the property's tiers and record it as the buyer's plan.
    pub fn select_plan(
        &self,
        session_id: &SessionId,
        tier: &str,
    ) -> Result<SessionView, QualificationServiceError> {
        self.with_session(session_id, |session| {
            let plan = session
                .context
                .plan_for(tier)?
                .ok_or_else(|| QualificationServiceError::UnknownPlanTier(tier.to_string()))?;
            session.engine.select_plan(tier, &plan)?;
            Ok(session.view(session_id))
        })
    }

    pub fn next(&self, session_id: &SessionId) -> Result<SessionView, QualificationServiceError> {
        self.with_session(session_id, |session| {
            session.engine.next()?;
            Ok(session.view(session_id))
        })
    }

    pub fn back(&self, session_id: &SessionId) -> Result<SessionView, QualificationServiceError> {
        self.with_session(session_id, |session| {
            session.engine.back()?;
            Ok(session.view(session_id))
        })
    }

    /// Submit the session and deliver its payload.
    ///
    /// A failed delivery leaves the frozen submission on the session, so calling
    /// this again retries without re-answering.
    pub fn submit(
        &self,
        session_id: &SessionId,
    ) -> Result<SubmissionReceipt, QualificationServiceError> {
        let submission = self.with_session(session_id, |session| {
            if session.receipt.is_some() {
                return Err(FlowError::AlreadySubmitted.into());
            }
            if session.delivering {
                return Err(QualificationServiceError::SubmissionInProgress(
                    session_id.clone(),
                ));
            }
            let submission = match &session.submission {
                Some(frozen) => frozen.clone(),
                None => session.engine.submit()?,
            };
            session.submission = Some(submission.clone());
            session.delivering = true;
            Ok(submission)
        })?;

        let sink_receipt = match self.sink.deliver(&submission.payload) {
            Ok(receipt) => receipt,
            Err(error) => {
                warn!(session = %session_id, %error, "qualification delivery failed");
                self.lock_store()
                    .settle_delivery(session_id, None, self.receipt_retention);
                return Err(error.into());
            }
        };

        let receipt = SubmissionReceipt {
            session_id: session_id.clone(),
            qualification_id: sink_receipt.qualification_id,
            verdict: submission.verdict,
            payload: submission.payload,
        };

        self.lock_store()
            .settle_delivery(session_id, Some(&receipt), self.receipt_retention);

        info!(
            session = %session_id,
            qualification = %receipt.qualification_id,
            qualified = receipt.verdict.is_qualified(),
            "qualification submitted"
        );
        Ok(receipt)
    }

    /// Stateless evaluation of an arbitrary record.
    pub fn evaluate(&self, record: &AnswerRecord, plan: &FinancingPlan) -> QualificationVerdict {
        self.evaluator.evaluate(record, plan)
    }

    fn next_session_id(&self) -> SessionId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        SessionId(format!("qs-{id:06}"))
    }

    fn lock_store(&self) -> MutexGuard<'_, SessionStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_session<T>(
        &self,
        session_id: &SessionId,
        action: impl FnOnce(&mut Session) -> Result<T, QualificationServiceError>,
    ) -> Result<T, QualificationServiceError> {
        let mut store = self.lock_store();
        let session = store
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| QualificationServiceError::SessionNotFound(session_id.clone()))?;
        action(session)
    }
}

/// Error raised by the qualification service.
#[derive(Debug, thiserror::Error)]
pub enum QualificationServiceError {
    #[error("qualification session `{0}` not found")]
    SessionNotFound(SessionId),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("qualification session `{0}` is already being delivered")]
    SubmissionInProgress(SessionId),
    #[error("plan tier `{0}` is not offered for this property")]
    UnknownPlanTier(String),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Submission(#[from] SinkError),
}
