use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{Actor, CopusPass, IntervalObservation, ScheduleId, ScheduleRequest};
use super::repository::{
    AuditSink, CompletionLedger, IdentityDirectory, RecordRepository, ScheduleRepository,
};
use super::service::{
    EvaluationService, SchedulingService, SchedulingError, SubmissionError, SubmissionOutcome,
};

/// Both service facades behind one state handle.
pub struct ObservationApi<S, R, C, I, A> {
    pub scheduling: SchedulingService<S, C, I, A>,
    pub evaluation: EvaluationService<S, R, C, A>,
}

/// Router builder exposing the observation workflow over HTTP.
///
/// Authentication lives with an external collaborator; handlers trust the
/// actor supplied in the payload.
pub fn observation_router<S, R, C, I, A>(api: Arc<ObservationApi<S, R, C, I, A>>) -> Router
where
    S: ScheduleRepository + 'static,
    R: RecordRepository + 'static,
    C: CompletionLedger + 'static,
    I: IdentityDirectory + 'static,
    A: AuditSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/observations/schedules",
            post(create_handler::<S, R, C, I, A>),
        )
        .route(
            "/api/v1/observations/schedules/:schedule_id",
            get(status_handler::<S, R, C, I, A>),
        )
        .route(
            "/api/v1/observations/schedules/:schedule_id/decision",
            post(decision_handler::<S, R, C, I, A>),
        )
        .route(
            "/api/v1/observations/schedules/:schedule_id/start",
            post(start_handler::<S, R, C, I, A>),
        )
        .route(
            "/api/v1/observations/schedules/:schedule_id/cancel",
            post(cancel_handler::<S, R, C, I, A>),
        )
        .route(
            "/api/v1/observations/schedules/:schedule_id/passes/:pass/intervals",
            put(autosave_handler::<S, R, C, I, A>),
        )
        .route(
            "/api/v1/observations/schedules/:schedule_id/passes/:pass/submit",
            post(submit_handler::<S, R, C, I, A>),
        )
        .with_state(api)
}

#[derive(Debug, Deserialize)]
struct CreateScheduleBody {
    actor: Actor,
    schedule: ScheduleRequest,
}

#[derive(Debug, Deserialize)]
struct DecisionBody {
    actor: Actor,
    approve: bool,
}

#[derive(Debug, Deserialize)]
struct ActorBody {
    actor: Actor,
}

#[derive(Debug, Deserialize)]
struct IntervalsBody {
    actor: Actor,
    #[serde(default)]
    expected_version: u64,
    intervals: Vec<IntervalObservation>,
}

async fn create_handler<S, R, C, I, A>(
    State(api): State<Arc<ObservationApi<S, R, C, I, A>>>,
    axum::Json(body): axum::Json<CreateScheduleBody>,
) -> Response
where
    S: ScheduleRepository + 'static,
    R: RecordRepository + 'static,
    C: CompletionLedger + 'static,
    I: IdentityDirectory + 'static,
    A: AuditSink + 'static,
{
    match api.scheduling.request_schedule(body.schedule, &body.actor) {
        Ok(schedule) => (StatusCode::CREATED, axum::Json(schedule)).into_response(),
        Err(err) => scheduling_error_response(err),
    }
}

async fn status_handler<S, R, C, I, A>(
    State(api): State<Arc<ObservationApi<S, R, C, I, A>>>,
    Path(schedule_id): Path<String>,
) -> Response
where
    S: ScheduleRepository + 'static,
    R: RecordRepository + 'static,
    C: CompletionLedger + 'static,
    I: IdentityDirectory + 'static,
    A: AuditSink + 'static,
{
    match api.evaluation.status(&ScheduleId(schedule_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => submission_error_response(err),
    }
}

async fn decision_handler<S, R, C, I, A>(
    State(api): State<Arc<ObservationApi<S, R, C, I, A>>>,
    Path(schedule_id): Path<String>,
    axum::Json(body): axum::Json<DecisionBody>,
) -> Response
where
    S: ScheduleRepository + 'static,
    R: RecordRepository + 'static,
    C: CompletionLedger + 'static,
    I: IdentityDirectory + 'static,
    A: AuditSink + 'static,
{
    let id = ScheduleId(schedule_id);
    let result = if body.approve {
        api.scheduling.approve(&id, &body.actor, Utc::now())
    } else {
        api.scheduling.disapprove(&id, &body.actor, Utc::now())
    };

    match result {
        Ok(schedule) => (StatusCode::OK, axum::Json(schedule)).into_response(),
        Err(err) => scheduling_error_response(err),
    }
}

async fn start_handler<S, R, C, I, A>(
    State(api): State<Arc<ObservationApi<S, R, C, I, A>>>,
    Path(schedule_id): Path<String>,
    axum::Json(body): axum::Json<ActorBody>,
) -> Response
where
    S: ScheduleRepository + 'static,
    R: RecordRepository + 'static,
    C: CompletionLedger + 'static,
    I: IdentityDirectory + 'static,
    A: AuditSink + 'static,
{
    match api
        .scheduling
        .start(&ScheduleId(schedule_id), &body.actor, Utc::now())
    {
        Ok(schedule) => (StatusCode::OK, axum::Json(schedule)).into_response(),
        Err(err) => scheduling_error_response(err),
    }
}

async fn cancel_handler<S, R, C, I, A>(
    State(api): State<Arc<ObservationApi<S, R, C, I, A>>>,
    Path(schedule_id): Path<String>,
    axum::Json(body): axum::Json<ActorBody>,
) -> Response
where
    S: ScheduleRepository + 'static,
    R: RecordRepository + 'static,
    C: CompletionLedger + 'static,
    I: IdentityDirectory + 'static,
    A: AuditSink + 'static,
{
    match api
        .scheduling
        .cancel(&ScheduleId(schedule_id), &body.actor, Utc::now())
    {
        Ok(schedule) => (StatusCode::OK, axum::Json(schedule)).into_response(),
        Err(err) => scheduling_error_response(err),
    }
}

async fn autosave_handler<S, R, C, I, A>(
    State(api): State<Arc<ObservationApi<S, R, C, I, A>>>,
    Path((schedule_id, pass)): Path<(String, u8)>,
    axum::Json(body): axum::Json<IntervalsBody>,
) -> Response
where
    S: ScheduleRepository + 'static,
    R: RecordRepository + 'static,
    C: CompletionLedger + 'static,
    I: IdentityDirectory + 'static,
    A: AuditSink + 'static,
{
    let Some(pass) = CopusPass::from_number(pass) else {
        return unknown_pass_response(pass);
    };

    match api.evaluation.autosave_observation(
        &ScheduleId(schedule_id),
        pass,
        body.intervals,
        body.expected_version,
    ) {
        Ok(record) => {
            let payload = json!({
                "schedule_id": record.schedule_id.0,
                "copus_pass": record.copus_pass.number(),
                "version": record.version,
                "interval_count": record.intervals.len(),
                "finalized": record.finalized,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => submission_error_response(err),
    }
}

async fn submit_handler<S, R, C, I, A>(
    State(api): State<Arc<ObservationApi<S, R, C, I, A>>>,
    Path((schedule_id, pass)): Path<(String, u8)>,
    axum::Json(body): axum::Json<IntervalsBody>,
) -> Response
where
    S: ScheduleRepository + 'static,
    R: RecordRepository + 'static,
    C: CompletionLedger + 'static,
    I: IdentityDirectory + 'static,
    A: AuditSink + 'static,
{
    let Some(pass) = CopusPass::from_number(pass) else {
        return unknown_pass_response(pass);
    };

    match api.evaluation.submit_observation(
        &ScheduleId(schedule_id),
        pass,
        body.intervals,
        &body.actor,
        body.expected_version,
        Utc::now(),
    ) {
        Ok(SubmissionOutcome::Completed {
            schedule,
            record,
            evaluation,
        }) => {
            let payload = json!({
                "schedule_id": schedule.id.0,
                "status": schedule.status.label(),
                "version": record.version,
                "evaluation": evaluation,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(SubmissionOutcome::Draft { record }) => {
            let payload = json!({
                "schedule_id": record.schedule_id.0,
                "status": "draft",
                "version": record.version,
                "interval_count": record.intervals.len(),
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(err) => submission_error_response(err),
    }
}

fn unknown_pass_response(pass: u8) -> Response {
    let payload = json!({ "error": format!("unknown COPUS pass {pass}") });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}

fn scheduling_error_response(err: SchedulingError) -> Response {
    let status = match &err {
        SchedulingError::Conflict(_) | SchedulingError::Transition(_) => StatusCode::CONFLICT,
        SchedulingError::Gate(_)
        | SchedulingError::InvalidWindow
        | SchedulingError::UnknownPerson { .. }
        | SchedulingError::WrongRole { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SchedulingError::NotFound { .. } => StatusCode::NOT_FOUND,
        SchedulingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn submission_error_response(err: SubmissionError) -> Response {
    let status = match &err {
        SubmissionError::NotFound { .. } => StatusCode::NOT_FOUND,
        SubmissionError::PassMismatch { .. }
        | SubmissionError::Aggregation(_)
        | SubmissionError::Scoring(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionError::NotInProgress { .. }
        | SubmissionError::Transition(_)
        | SubmissionError::ConcurrentModification { .. } => StatusCode::CONFLICT,
        SubmissionError::ScheduleStore(_) | SubmissionError::RecordStore(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
