use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::answers::{AnswerKey, AnswerRecord, AnswerValue};
use super::domain::PropertyContext;
use super::flow::FlowError;
use super::plan::FinancingPlan;
use super::service::{QualificationService, QualificationServiceError, SessionId};
use super::sink::SubmissionSink;

#[derive(Debug, Deserialize)]
pub(crate) struct AnswersRequest {
    answers: BTreeMap<AnswerKey, AnswerValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlanRequest {
    tier: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateRequest {
    answers: AnswerRecord,
    #[serde(default)]
    plan: Option<FinancingPlan>,
}

/// Router exposing the qualification wizard and stateless evaluation.
pub fn qualification_router<S>(service: Arc<QualificationService<S>>) -> Router
where
    S: SubmissionSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/qualifications/sessions",
            post(start_handler::<S>),
        )
        .route(
            "/api/v1/qualifications/sessions/:session_id",
            get(view_handler::<S>).delete(discard_handler::<S>),
        )
        .route(
            "/api/v1/qualifications/sessions/:session_id/answers",
            put(answers_handler::<S>),
        )
        .route(
            "/api/v1/qualifications/sessions/:session_id/plan",
            post(plan_handler::<S>),
        )
        .route(
            "/api/v1/qualifications/sessions/:session_id/next",
            post(next_handler::<S>),
        )
        .route(
            "/api/v1/qualifications/sessions/:session_id/back",
            post(back_handler::<S>),
        )
        .route(
            "/api/v1/qualifications/sessions/:session_id/submit",
            post(submit_handler::<S>),
        )
        .route(
            "/api/v1/qualifications/evaluate",
            post(evaluate_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn start_handler<S>(
    State(service): State<Arc<QualificationService<S>>>,
    axum::Json(context): axum::Json<PropertyContext>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.start(context) {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn view_handler<S>(
    State(service): State<Arc<QualificationService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.view(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn discard_handler<S>(
    State(service): State<Arc<QualificationService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.discard(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn answers_handler<S>(
    State(service): State<Arc<QualificationService<S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<AnswersRequest>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.answer(&SessionId(session_id), request.answers) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn plan_handler<S>(
    State(service): State<Arc<QualificationService<S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<PlanRequest>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.select_plan(&SessionId(session_id), &request.tier) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn next_handler<S>(
    State(service): State<Arc<QualificationService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.next(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn back_handler<S>(
    State(service): State<Arc<QualificationService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.back(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<QualificationService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.submit(&SessionId(session_id)) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluate_handler<S>(
    State(service): State<Arc<QualificationService<S>>>,
    axum::Json(request): axum::Json<EvaluateRequest>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    let plan = request
        .plan
        .unwrap_or_else(|| FinancingPlan::from_record(&request.answers));
    let verdict = service.evaluate(&request.answers, &plan);
    (StatusCode::OK, axum::Json(verdict)).into_response()
}

fn error_response(error: QualificationServiceError) -> Response {
    let (status, payload) = match &error {
        QualificationServiceError::SessionNotFound(_) => {
            (StatusCode::NOT_FOUND, json!({ "error": error.to_string() }))
        }
        QualificationServiceError::Flow(FlowError::Validation { step, missing }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": error.to_string(),
                "step": step,
                "missing": missing,
            }),
        ),
        QualificationServiceError::Flow(FlowError::IncompleteFlow { current }) => (
            StatusCode::CONFLICT,
            json!({
                "error": error.to_string(),
                "step": current,
            }),
        ),
        QualificationServiceError::Flow(FlowError::AlreadySubmitted)
        | QualificationServiceError::SubmissionInProgress(_) => {
            (StatusCode::CONFLICT, json!({ "error": error.to_string() }))
        }
        QualificationServiceError::Flow(FlowError::Configuration(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
        QualificationServiceError::UnknownPlanTier(_) | QualificationServiceError::Plan(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": error.to_string() }),
        ),
        QualificationServiceError::Submission(_) => (
            StatusCode::BAD_GATEWAY,
            json!({
                "error": error.to_string(),
                "retryable": true,
            }),
        ),
    };

    (status, axum::Json(payload)).into_response()
}
