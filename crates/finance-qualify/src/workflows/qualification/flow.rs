use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::answers::{AnswerKey, AnswerRecord, AnswerValue};
use super::blueprint::{QualificationBlueprint, StepDefinition, StepId, REVIEW_STEP, REVIEW_STEP_ID};
use super::domain::FlowStage;
use super::evaluation::{EvaluationConfig, QualificationEvaluator};
use super::plan::{round_cents, FinancingPlan};
use super::submission::Submission;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Step(usize),
    Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    InProgress,
    Submitted,
}

/// Where the buyer is in the questionnaire, for the progress indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowProgress {
    pub step_number: usize,
    pub total_steps: usize,
    pub percent: u8,
    pub stage: FlowStage,
    pub stage_label: &'static str,
}

/// Branch-aware questionnaire state machine for one qualification attempt.
///
/// Applicability is recomputed from the latest answers on every navigation, so
/// answering `employment_status` or `open_credit_lines` reshapes the steps that
/// follow without touching anything already recorded.
#[derive(Debug, Clone)]
pub struct StepFlowEngine {
    steps: Vec<StepDefinition>,
    record: AnswerRecord,
    position: Position,
    history: Vec<usize>,
    state: FlowState,
    evaluator: QualificationEvaluator,
}

impl StepFlowEngine {
    pub fn initialize(
        steps: Vec<StepDefinition>,
        seed: AnswerRecord,
    ) -> Result<Self, ConfigurationError> {
        validate_steps(&steps)?;
        Ok(Self::from_validated(steps, seed))
    }

    /// Engine over the standard buyer questionnaire.
    pub fn standard(seed: AnswerRecord) -> Self {
        Self::from_validated(QualificationBlueprint::standard().into_steps(), seed)
    }

    fn from_validated(steps: Vec<StepDefinition>, record: AnswerRecord) -> Self {
        let mut engine = Self {
            steps,
            record,
            position: Position::Review,
            history: Vec::new(),
            state: FlowState::InProgress,
            evaluator: QualificationEvaluator::default(),
        };
        engine.position = engine.next_applicable_from(0);
        engine
    }

    pub fn with_evaluation_config(mut self, config: EvaluationConfig) -> Self {
        self.evaluator = QualificationEvaluator::new(config);
        self
    }

    pub fn current_step(&self) -> &StepDefinition {
        match self.position {
            Position::Step(index) => &self.steps[index],
            Position::Review => &REVIEW_STEP,
        }
    }

    pub fn record(&self) -> &AnswerRecord {
        &self.record
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn is_at_review(&self) -> bool {
        self.position == Position::Review
    }

    pub fn can_go_back(&self) -> bool {
        self.state == FlowState::InProgress
            && self
                .history
                .iter()
                .any(|index| self.steps[*index].is_applicable(&self.record))
    }

    /// Steps that apply to the answers recorded so far, in flow order.
    pub fn applicable_steps(&self) -> Vec<&StepDefinition> {
        self.steps
            .iter()
            .filter(|step| step.is_applicable(&self.record))
            .collect()
    }

    pub fn update_answer(
        &mut self,
        key: AnswerKey,
        value: impl Into<AnswerValue>,
    ) -> Result<(), FlowError> {
        self.ensure_open()?;
        self.record.insert(key, value);
        self.reanchor();
        Ok(())
    }

    /// Record a financing tier and every derived plan field in one write.
    pub fn select_plan(&mut self, label: &str, plan: &FinancingPlan) -> Result<(), FlowError> {
        self.ensure_open()?;

        self.record.insert(AnswerKey::SelectedPlan, label.trim());
        self.record.insert(AnswerKey::DownPayment, plan.down_payment);
        self.record.insert(AnswerKey::InterestRate, plan.interest_rate);
        self.record.insert(AnswerKey::LoanAmount, plan.loan_amount);
        self.record.insert(AnswerKey::MonthlyPayment, plan.monthly_payment);
        self.record.insert(AnswerKey::Term, plan.term);

        let price = self.record.amount(AnswerKey::PropertyPrice);
        if let Some(ratio) = plan.down_payment_ratio(price) {
            self.record
                .insert(AnswerKey::DownPaymentPercentage, round_cents(ratio * 100.0));
        }

        self.reanchor();
        debug!(plan = label, down_payment = plan.down_payment, "financing plan selected");
        Ok(())
    }

    pub fn next(&mut self) -> Result<&StepDefinition, FlowError> {
        self.ensure_open()?;

        let Position::Step(index) = self.position else {
            return Ok(&REVIEW_STEP);
        };

        let step = &self.steps[index];
        let missing = step.missing_answers(&self.record);
        if !missing.is_empty() {
            return Err(FlowError::Validation {
                step: step.id,
                missing,
            });
        }

        self.history.push(index);
        self.position = self.next_applicable_from(index + 1);
        debug!(from = %self.steps[index].id, to = %self.current_step().id, "advanced step");
        Ok(self.current_step())
    }

    pub fn back(&mut self) -> Result<&StepDefinition, FlowError> {
        self.ensure_open()?;

        while let Some(index) = self.history.pop() {
            if self.steps[index].is_applicable(&self.record) {
                self.position = Position::Step(index);
                debug!(to = %self.steps[index].id, "returned to previous step");
                break;
            }
        }

        Ok(self.current_step())
    }

    pub fn submit(&mut self) -> Result<Submission, FlowError> {
        self.submit_at(Utc::now())
    }

    /// Freeze the record and evaluate it. Calling again re-evaluates the frozen record.
    pub fn submit_at(&mut self, evaluated_at: DateTime<Utc>) -> Result<Submission, FlowError> {
        if self.position != Position::Review {
            return Err(FlowError::IncompleteFlow {
                current: self.current_step().id,
            });
        }

        if self.state == FlowState::InProgress {
            if let Some(index) = self.first_unanswered_step() {
                self.position = Position::Step(index);
                self.history.retain(|visited| *visited < index);
                return Err(FlowError::IncompleteFlow {
                    current: self.steps[index].id,
                });
            }
            self.state = FlowState::Submitted;
        }

        let plan = FinancingPlan::from_record(&self.record);
        let verdict = self
            .evaluator
            .evaluate_at(&self.record, &plan, evaluated_at);
        debug!(qualified = verdict.is_qualified(), "qualification evaluated");

        Ok(Submission::package(self.record.clone(), plan, verdict))
    }

    pub fn progress(&self) -> FlowProgress {
        let applicable: Vec<usize> = (0..self.steps.len())
            .filter(|index| self.steps[*index].is_applicable(&self.record))
            .collect();
        let count = applicable.len();

        let completed = match self.position {
            Position::Step(index) => applicable.iter().filter(|i| **i < index).count(),
            Position::Review => count,
        };
        let percent = if count == 0 || self.state == FlowState::Submitted {
            100
        } else {
            (completed * 100 / count) as u8
        };

        let stage = self.current_step().stage;
        FlowProgress {
            step_number: completed + 1,
            total_steps: count + 1,
            percent,
            stage,
            stage_label: stage.label(),
        }
    }

    fn ensure_open(&self) -> Result<(), FlowError> {
        match self.state {
            FlowState::InProgress => Ok(()),
            FlowState::Submitted => Err(FlowError::AlreadySubmitted),
        }
    }

    /// Keep the current step applicable after an answer reshapes the flow.
    fn reanchor(&mut self) {
        let Position::Step(index) = self.position else {
            return;
        };
        if self.steps[index].is_applicable(&self.record) {
            return;
        }

        let resume = self.history.last().map_or(0, |previous| previous + 1);
        self.position = self.next_applicable_from(resume);
        debug!(from = %self.steps[index].id, to = %self.current_step().id, "current step no longer applies");
    }

    fn next_applicable_from(&self, start: usize) -> Position {
        (start..self.steps.len())
            .find(|index| self.steps[*index].is_applicable(&self.record))
            .map(Position::Step)
            .unwrap_or(Position::Review)
    }

    fn first_unanswered_step(&self) -> Option<usize> {
        (0..self.steps.len()).find(|index| {
            let step = &self.steps[*index];
            step.is_applicable(&self.record) && !step.missing_answers(&self.record).is_empty()
        })
    }
}

fn validate_steps(steps: &[StepDefinition]) -> Result<(), ConfigurationError> {
    if steps.is_empty() {
        return Err(ConfigurationError::EmptySteps);
    }

    let mut seen = HashSet::new();
    for step in steps {
        if step.id == REVIEW_STEP_ID {
            return Err(ConfigurationError::ReservedStepId(step.id));
        }
        if !seen.insert(step.id) {
            return Err(ConfigurationError::DuplicateStep(step.id));
        }
    }

    Ok(())
}

fn join_keys(keys: &[AnswerKey]) -> String {
    keys.iter()
        .map(|key| key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Invalid step list handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("a qualification flow needs at least one step")]
    EmptySteps,
    #[error("step id `{0}` is defined more than once")]
    DuplicateStep(StepId),
    #[error("step id `{0}` is reserved for the review step")]
    ReservedStepId(StepId),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("step `{step}` is missing required answers: {}", join_keys(.missing))]
    Validation {
        step: StepId,
        missing: Vec<AnswerKey>,
    },
    #[error("cannot submit before the review step (currently at `{current}`)")]
    IncompleteFlow { current: StepId },
    #[error("qualification has already been submitted")]
    AlreadySubmitted,
}
