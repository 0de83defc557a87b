//! Operator routes. All of them sit behind `middleware::require_admin`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use onair_db::APPLICATION_INTAKE;
use onair_types::api::{
    AnswerBody, ApplicationView, BlacklistEntryBody, BlacklistEntryView, BlacklistRemoveBody, Validity,
};
use onair_types::models::{BlacklistEntry, IntakeFlag};

use crate::error::ApiError;
use crate::input;
use crate::state::{AppState, run_db};

pub async fn list_blacklist(State(state): State<AppState>) -> Result<Json<Vec<BlacklistEntryView>>, ApiError> {
    let entries = run_db(&state, |db| db.blacklist()).await?;
    Ok(Json(entries.into_iter().map(BlacklistEntryView::from).collect()))
}

/// Raw five-digit numbers are prefixed with the current year, matching what
/// that student's submissions will be stored under.
pub async fn add_to_blacklist(
    State(state): State<AppState>,
    Json(req): Json<BlacklistEntryBody>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = BlacklistEntry {
        name: req.name.trim().to_string(),
        student_number: input::operator_student_number(&req.student_number, Utc::now(), state.settings.zone)?,
    };

    let view = BlacklistEntryView::from(entry.clone());
    let added = run_db(&state, move |db| db.add_to_blacklist(&entry)).await?;

    info!("Blacklisted {} ({})", view.student_number, if added { "new" } else { "updated" });
    let status = if added { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(view)))
}

pub async fn remove_from_blacklist(
    State(state): State<AppState>,
    Json(req): Json<BlacklistRemoveBody>,
) -> Result<StatusCode, ApiError> {
    let student_number = input::operator_student_number(&req.student_number, Utc::now(), state.settings.zone)?;
    let sn = student_number.clone();
    let removed = run_db(&state, move |db| db.remove_from_blacklist(&sn)).await?;

    if !removed {
        return Err(ApiError::NotFound);
    }
    info!("Removed {} from blacklist", student_number);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_application_intake(State(state): State<AppState>) -> Result<Json<Validity>, ApiError> {
    let flag = run_db(&state, |db| db.intake_flag(APPLICATION_INTAKE))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(Validity::from(flag)))
}

pub async fn set_application_intake(
    State(state): State<AppState>,
    Json(req): Json<Validity>,
) -> Result<Json<Validity>, ApiError> {
    let flag = IntakeFlag { is_open: req.is_valid, message: req.message };
    let stored = flag.clone();
    run_db(&state, move |db| db.set_intake_flag(APPLICATION_INTAKE, &stored)).await?;

    info!("Application intake {}", if flag.is_open { "opened" } else { "closed" });
    Ok(Json(Validity::from(flag)))
}

pub async fn list_applications(State(state): State<AppState>) -> Result<Json<Vec<ApplicationView>>, ApiError> {
    let applications = run_db(&state, |db| db.applications()).await?;
    Ok(Json(applications.into_iter().map(ApplicationView::from).collect()))
}

pub async fn answer_suggestion(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AnswerBody>,
) -> Result<StatusCode, ApiError> {
    let answer = input::required("answer", &req.answer)?;
    let updated = run_db(&state, move |db| db.answer_suggestion(id, &answer)).await?;

    if !updated {
        return Err(ApiError::NotFound);
    }
    info!("Answered suggestion #{}", id);
    Ok(StatusCode::NO_CONTENT)
}
