use axum::Json;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, patch, post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;
use uuid::Uuid;

use crate::calendar::{self, ExportSummary};
use crate::error::AppError;
use crate::models::*;
use crate::schedule;
use crate::services::SessionView;
use crate::state::AppState;

/// Schedule photos from phones easily exceed axum's 2 MB default.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const FILE_NAME_HEADER: &str = "x-file-name";

#[derive(Deserialize)]
struct ParseRequest {
    text: String,
}

#[derive(Deserialize)]
struct UpdateEntryRequest {
    field: DraftField,
    value: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/parse", post(parse_text))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/readiness", post(refresh_readiness))
        .route("/sessions/{id}/file", put(select_file))
        .route("/sessions/{id}/process", post(process))
        .route(
            "/sessions/{id}/entries",
            get(list_entries).put(replace_entries).post(add_entry),
        )
        .route(
            "/sessions/{id}/entries/{index}",
            patch(update_entry).delete(remove_entry),
        )
        .route("/sessions/{id}/save", post(save_schedule))
        .route("/sessions/{id}/schedule", delete(clear_schedule))
        .route("/sessions/{id}/events", post(create_events))
        .route("/previews/{id}", get(get_preview))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.recognizer.check_ready().await?;
    Ok(StatusCode::OK)
}

async fn parse_text(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Json<Vec<CourseRecord>> {
    Json(schedule::parse_with(&req.text, state.sessions.parser_options()))
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    (StatusCode::CREATED, Json(state.sessions.create_session().await))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.get(id).await?))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn refresh_readiness(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.refresh_readiness(id).await?))
}

async fn select_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SessionView>, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::InputRejected("Please drop an image or PDF file".to_string()))?;
    let name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("upload");

    let view = state
        .sessions
        .select_file(id, name, content_type, body.to_vec())
        .await?;
    Ok(Json(view))
}

async fn process(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.process(id).await?))
}

async fn list_entries(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DraftEntry>>, AppError> {
    Ok(Json(state.sessions.entries(id).await?))
}

async fn replace_entries(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(entries): Json<Vec<DraftEntry>>,
) -> Result<Json<Vec<DraftEntry>>, AppError> {
    Ok(Json(state.sessions.replace_entries(id, entries).await?))
}

async fn add_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DraftEntry>>, AppError> {
    Ok(Json(state.sessions.add_entry(id).await?))
}

async fn update_entry(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<Json<DraftEntry>, AppError> {
    let entry = state
        .sessions
        .update_entry(id, index, req.field, req.value)
        .await?;
    Ok(Json(entry))
}

async fn remove_entry(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<Vec<DraftEntry>>, AppError> {
    Ok(Json(state.sessions.remove_entry(id, index).await?))
}

async fn save_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FinalizedSchedule>, AppError> {
    Ok(Json(state.sessions.save(id).await?))
}

async fn clear_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.clear_schedule(id).await?))
}

async fn create_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExportSummary>, AppError> {
    let schedule = state.sessions.schedule(id).await?;
    let summary = calendar::export(&schedule, state.calendar.as_ref()).await?;
    Ok(Json(summary))
}

async fn get_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let image = state.sessions.previews().get(&id).ok_or(AppError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, image.content_type)],
        image.bytes.to_vec(),
    )
        .into_response())
}
