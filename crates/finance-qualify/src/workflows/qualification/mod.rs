//! Buyer financing qualification: the branching questionnaire, the decision
//! rules, plan pricing, and the payload handed to qualification storage.

pub mod answers;
pub mod blueprint;
pub mod domain;
pub(crate) mod evaluation;
pub mod flow;
pub mod plan;
pub mod router;
pub mod service;
pub mod sink;
pub mod submission;

#[cfg(test)]
mod tests;

pub use answers::{parse_amount, AnswerKey, AnswerRecord, AnswerValue};
pub use blueprint::{
    Applicability, QualificationBlueprint, StepDefinition, StepId, StepView, REVIEW_STEP_ID,
};
pub use domain::{CreditScoreBand, EmploymentStatus, FlowStage, IncomeBand, PropertyContext};
pub use evaluation::{
    DisqualificationReason, EvaluationConfig, QualificationEvaluator, QualificationVerdict,
};
pub use flow::{ConfigurationError, FlowError, FlowProgress, FlowState, StepFlowEngine};
pub use plan::{monthly_payment, FinancingPlan, PlanError, PlanTier};
pub use router::qualification_router;
pub use service::{
    QualificationService, QualificationServiceError, SessionId, SessionView, SubmissionReceipt,
};
pub use sink::{QualificationId, SinkError, SinkReceipt, SubmissionSink};
pub use submission::{QualificationPayload, Submission};
