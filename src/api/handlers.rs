use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::request_id::RequestId;
use crate::models::{EnrichedRecommendation, Persona, SessionState, Step};

use super::state::Session;
use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SelectPersonaRequest {
    pub persona: Persona,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

/// The question currently waiting for an answer
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<String>,
    pub progress: f32,
}

/// Everything a client needs to render the current step
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub step: Step,
    pub persona: Option<Persona>,
    pub question: Option<QuestionView>,
    pub answers: Vec<String>,
    pub recommendations: Vec<EnrichedRecommendation>,
    pub retry_count: u32,
    pub notice: Option<String>,
}

impl SessionView {
    fn new(session: &Session, state: &SessionState) -> Self {
        let question = state.current_question().map(|q| QuestionView {
            index: state.current_index(),
            total: state.questions.len(),
            text: q.text.clone(),
            options: q.options.clone(),
            progress: state.progress(),
        });

        Self {
            session_id: session.id,
            created_at: session.created_at,
            step: state.step,
            persona: state.persona,
            question,
            answers: state.answers.clone(),
            recommendations: state.recommendations.clone(),
            retry_count: state.retry_count,
            notice: state.notice.clone(),
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Personas offered on the welcome step, in display order
pub async fn list_personas() -> Json<Vec<Persona>> {
    Json(Persona::ALL.to_vec())
}

/// Start a new session at the welcome step
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let session = state.create_session().await;
    let session_state = session.state.lock().await;
    (
        StatusCode::CREATED,
        Json(SessionView::new(&session, &session_state)),
    )
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
    let session = state.session(session_id).await?;
    let session_state = session.state.lock().await;
    Ok(Json(SessionView::new(&session, &session_state)))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.remove_session(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pick a persona and generate the questionnaire
pub async fn select_persona(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<SelectPersonaRequest>,
) -> AppResult<Json<SessionView>> {
    tracing::info!(
        request_id = %request_id,
        session_id = %session_id,
        persona = %request.persona,
        "Processing persona selection"
    );

    let session = state.session(session_id).await?;
    let mut session_state = session.state.lock().await;

    state.machine.select_persona(&mut session_state, request.persona)?;
    state.machine.advance(&mut session_state).await?;

    Ok(Json(SessionView::new(&session, &session_state)))
}

/// Record an answer; the last one also produces the recommendations
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<AnswerRequest>,
) -> AppResult<Json<SessionView>> {
    let session = state.session(session_id).await?;
    let mut session_state = session.state.lock().await;

    tracing::info!(
        request_id = %request_id,
        session_id = %session_id,
        question = session_state.current_index(),
        "Processing answer"
    );

    state.machine.submit_answer(&mut session_state, &request.answer)?;
    state.machine.advance(&mut session_state).await?;

    Ok(Json(SessionView::new(&session, &session_state)))
}

/// Start over from the welcome step
pub async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<SessionView>> {
    tracing::info!(request_id = %request_id, session_id = %session_id, "Processing reset");

    let session = state.session(session_id).await?;
    let mut session_state = session.state.lock().await;

    state.machine.reset(&mut session_state);

    Ok(Json(SessionView::new(&session, &session_state)))
}
