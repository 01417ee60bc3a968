use std::collections::BTreeMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::Serialize;
use services::Ack;
use services::progress::wire::{
    CompleteLessonRequest, CorrectAnswerDto, CorrectAnswerRequest, HistoryEntryDto, LessonDto,
    ProgressPatchDto, ProgressRecordDto, ReconcileDto, SectionUpdateRequest, SummaryDto,
};

use crate::error::{ApiError, ApiResult};
use crate::identity::CurrentUser;
use crate::state::ApiState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn list_lessons(State(state): State<ApiState>) -> ApiResult<Json<Vec<LessonDto>>> {
    let lessons = state.progress.list_lessons().await?;
    Ok(Json(lessons.iter().map(LessonDto::from).collect()))
}

pub async fn all_progress(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<BTreeMap<String, ProgressRecordDto>>> {
    let records = state.progress.get_all_lesson_progress(&user).await?;
    Ok(Json(
        records
            .iter()
            .map(|(id, record)| (id.to_string(), ProgressRecordDto::from(record)))
            .collect(),
    ))
}

pub async fn summary(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<SummaryDto>> {
    let summary = state.progress.get_progress_summary(&user).await?;
    Ok(Json(summary.into()))
}

pub async fn history(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<HistoryEntryDto>>> {
    let history = state.progress.completion_history(&user).await?;
    Ok(Json(history.iter().map(HistoryEntryDto::from).collect()))
}

pub async fn complete_lesson(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CompleteLessonRequest>, JsonRejection>,
) -> ApiResult<Json<Ack>> {
    let Json(request) = body?;
    let lesson_id = required(request.lesson_id, "lessonId")?;
    let ack = state.progress.complete_lesson(&user, &lesson_id).await?;
    Ok(Json(ack))
}

pub async fn update_sections(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<SectionUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<ProgressRecordDto>> {
    let Json(request) = body?;
    let update = request.to_update();
    let lesson_id = required(request.lesson_id, "lessonId")?;
    let record = state
        .progress
        .update_section_progress(&user, &lesson_id, update)
        .await?;
    Ok(Json(ProgressRecordDto::from(&record)))
}

pub async fn reconcile(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ReconcileDto>> {
    let merged = state.progress.reconcile_guest_progress(&user).await?;
    Ok(Json(ReconcileDto { merged }))
}

pub async fn lesson_progress(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
) -> ApiResult<Json<ProgressRecordDto>> {
    let record = state.progress.get_lesson_progress(&user, &lesson_id).await?;
    Ok(Json(ProgressRecordDto::from(&record)))
}

pub async fn save_lesson_progress(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
    body: Result<Json<ProgressPatchDto>, JsonRejection>,
) -> ApiResult<Json<ProgressRecordDto>> {
    let Json(patch) = body?;
    let patch = patch.into_patch()?;
    let record = state
        .progress
        .save_lesson_progress(&user, &lesson_id, patch)
        .await?;
    Ok(Json(ProgressRecordDto::from(&record)))
}

pub async fn open_lesson(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
) -> ApiResult<Json<ProgressRecordDto>> {
    let record = state.progress.open_lesson(&user, &lesson_id).await?;
    Ok(Json(ProgressRecordDto::from(&record)))
}

pub async fn correct_answer(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
    body: Result<Json<CorrectAnswerRequest>, JsonRejection>,
) -> ApiResult<Json<CorrectAnswerDto>> {
    let Json(request) = body?;
    let step_id = required(request.step_id, "stepId")?;
    let outcome = state
        .progress
        .record_correct_answer(&user, &lesson_id, &step_id)
        .await?;
    Ok(Json(CorrectAnswerDto {
        counted: outcome.counted,
        progress: ProgressRecordDto::from(&outcome.progress),
    }))
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}
