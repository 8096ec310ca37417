use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::recommendation::RecommendationService;
use super::repository::{RepositoryError, SessionRepository};
use super::service::{DiagnosisService, DiagnosisServiceError};
use super::session::{SessionError, SessionId};
use super::views::{AnswerView, QuestionView, SessionView};

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub option_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub answers: Vec<usize>,
}

/// Router builder exposing the quiz flow over HTTP.
pub fn diagnosis_router<R, C>(service: Arc<DiagnosisService<R, C>>) -> Router
where
    R: SessionRepository + 'static,
    C: RecommendationService + 'static,
{
    Router::new()
        .route("/api/v1/diagnosis/questions", get(questions_handler::<R, C>))
        .route("/api/v1/diagnosis/evaluate", post(evaluate_handler::<R, C>))
        .route("/api/v1/diagnosis/sessions", post(create_handler::<R, C>))
        .route(
            "/api/v1/diagnosis/sessions/:session_id",
            get(status_handler::<R, C>),
        )
        .route(
            "/api/v1/diagnosis/sessions/:session_id/begin",
            post(begin_handler::<R, C>),
        )
        .route(
            "/api/v1/diagnosis/sessions/:session_id/answers",
            post(answer_handler::<R, C>),
        )
        .route(
            "/api/v1/diagnosis/sessions/:session_id/restart",
            post(restart_handler::<R, C>),
        )
        .with_state(service)
}

pub(crate) async fn questions_handler<R, C>(
    State(service): State<Arc<DiagnosisService<R, C>>>,
) -> Response
where
    R: SessionRepository + 'static,
    C: RecommendationService + 'static,
{
    let questions: Vec<QuestionView> = service
        .classifier()
        .definition()
        .questions()
        .iter()
        .enumerate()
        .map(|(index, question)| QuestionView::new(index, question))
        .collect();
    (StatusCode::OK, axum::Json(questions)).into_response()
}

pub(crate) async fn create_handler<R, C>(
    State(service): State<Arc<DiagnosisService<R, C>>>,
) -> Response
where
    R: SessionRepository + 'static,
    C: RecommendationService + 'static,
{
    match service.create() {
        Ok(session) => {
            let view = SessionView::new(&session, service.classifier());
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R, C>(
    State(service): State<Arc<DiagnosisService<R, C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: RecommendationService + 'static,
{
    match service.get(&SessionId(session_id)) {
        Ok(session) => {
            let view = SessionView::new(&session, service.classifier());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn begin_handler<R, C>(
    State(service): State<Arc<DiagnosisService<R, C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: RecommendationService + 'static,
{
    match service.begin(&SessionId(session_id)) {
        Ok(session) => {
            let view = SessionView::new(&session, service.classifier());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn answer_handler<R, C>(
    State(service): State<Arc<DiagnosisService<R, C>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<AnswerRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    C: RecommendationService + 'static,
{
    match service
        .answer(&SessionId(session_id), request.option_index)
        .await
    {
        Ok(answered) => {
            let view = AnswerView {
                session: SessionView::new(&answered.session, service.classifier()),
                report: answered.report,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn restart_handler<R, C>(
    State(service): State<Arc<DiagnosisService<R, C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: RecommendationService + 'static,
{
    match service.restart(&SessionId(session_id)) {
        Ok(session) => {
            let view = SessionView::new(&session, service.classifier());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn evaluate_handler<R, C>(
    State(service): State<Arc<DiagnosisService<R, C>>>,
    axum::Json(request): axum::Json<EvaluateRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    C: RecommendationService + 'static,
{
    match service.evaluate(&request.answers) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: DiagnosisServiceError) -> Response {
    let status = match &err {
        DiagnosisServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        DiagnosisServiceError::Repository(RepositoryError::Conflict)
        | DiagnosisServiceError::Session(
            SessionError::NotStarted | SessionError::AlreadyStarted | SessionError::AlreadyResolved,
        ) => StatusCode::CONFLICT,
        DiagnosisServiceError::Classifier(inner)
        | DiagnosisServiceError::Session(SessionError::Classifier(inner))
            if inner.is_invalid_answer() =>
        {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "diagnosis request failed");
    }

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
