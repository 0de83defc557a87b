use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use tracing::info;

use onair_db::Submission;
use onair_types::api::{DeleteSongRequestBody, SongRequestBody, SongRequestView, SubmittedAt, Validity};
use onair_types::models::NewSongRequest;
use onair_types::{Board, BucketDate};

use crate::error::ApiError;
use crate::input;
use crate::rules;
use crate::state::{AppState, run_db};
use crate::verification::require_verified;

// -- Lunchtime board --

pub async fn submit_daily(
    State(state): State<AppState>,
    Query(at): Query<SubmittedAt>,
    Json(req): Json<SongRequestBody>,
) -> Result<Json<Validity>, ApiError> {
    submit(state, Board::Daily, at, req).await
}

pub async fn list_daily(State(state): State<AppState>) -> Result<Json<Vec<SongRequestView>>, ApiError> {
    list(state, Board::Daily).await
}

pub async fn delete_daily(
    State(state): State<AppState>,
    Json(req): Json<DeleteSongRequestBody>,
) -> Result<Json<Validity>, ApiError> {
    delete(state, Board::Daily, req).await
}

// -- Morning board --

pub async fn submit_morning(
    State(state): State<AppState>,
    Query(at): Query<SubmittedAt>,
    Json(req): Json<SongRequestBody>,
) -> Result<Json<Validity>, ApiError> {
    submit(state, Board::Morning, at, req).await
}

pub async fn list_morning(State(state): State<AppState>) -> Result<Json<Vec<SongRequestView>>, ApiError> {
    list(state, Board::Morning).await
}

pub async fn delete_morning(
    State(state): State<AppState>,
    Json(req): Json<DeleteSongRequestBody>,
) -> Result<Json<Validity>, ApiError> {
    delete(state, Board::Morning, req).await
}

// -- Shared --

fn current_bucket(state: &AppState, board: Board, now: chrono::DateTime<Utc>) -> BucketDate {
    let settings = &state.settings;
    BucketDate::for_board(board, now, settings.zone, settings.morning_cutoff_hour)
}

async fn submit(state: AppState, board: Board, at: SubmittedAt, req: SongRequestBody) -> Result<Json<Validity>, ApiError> {
    let now = Utc::now();
    let student_number = input::student_number(&req.student_number, now, state.settings.zone)?;
    let candidate = NewSongRequest {
        name: input::required("name", &req.name)?,
        song_title: input::required("songTitle", &req.song_title)?,
        singer: input::required("singer", &req.singer)?,
        image_url: req.image_url.trim().to_string(),
        student_number,
        requested_at: at.or(now),
    };

    if let Err(rejection) =
        require_verified(&state, req.verification_token.as_deref(), &candidate.student_number, now).await?
    {
        info!("Song request from {} failed verification: {}", candidate.student_number, rejection);
        return Ok(Json(Validity::rejected(rejection.to_string())));
    }

    let bucket = current_bucket(&state, board, now);
    let limit = state.settings.daily_song_limit;
    let title = candidate.song_title.clone();
    let requester = candidate.student_number.clone();

    let outcome = run_db(&state, move |db| {
        db.submit_song_request(board, bucket, &candidate, |existing, blacklist| {
            rules::check_song_request(&candidate, existing, blacklist, limit)
        })
    })
    .await?;

    match outcome {
        Submission::Accepted(id) => {
            info!("Accepted {} song request #{} '{}' from {} for {}", board.as_str(), id, title, requester, bucket);
            Ok(Json(Validity::valid()))
        }
        Submission::Rejected(rejection) => {
            info!("Rejected {} song request '{}' from {}: {:?}", board.as_str(), title, requester, rejection);
            Ok(Json(Validity::rejected(rejection.to_string())))
        }
    }
}

async fn list(state: AppState, board: Board) -> Result<Json<Vec<SongRequestView>>, ApiError> {
    let bucket = current_bucket(&state, board, Utc::now());
    let requests = run_db(&state, move |db| db.song_bucket(board, bucket)).await?;
    Ok(Json(requests.into_iter().map(SongRequestView::from).collect()))
}

/// Always reports success when the request is well formed, whether or not
/// anything matched.
async fn delete(state: AppState, board: Board, req: DeleteSongRequestBody) -> Result<Json<Validity>, ApiError> {
    let now = Utc::now();
    let student_number = input::student_number(&req.student_number, now, state.settings.zone)?;
    let name = req.name.trim().to_string();

    if let Err(rejection) =
        require_verified(&state, req.verification_token.as_deref(), &student_number, now).await?
    {
        return Ok(Json(Validity::rejected(rejection.to_string())));
    }

    let bucket = current_bucket(&state, board, now);
    let sn = student_number.clone();
    let removed = run_db(&state, move |db| db.delete_song_requests(board, bucket, &name, &sn)).await?;

    info!("Removed {} {} song request(s) for {} from {}", removed, board.as_str(), student_number, bucket);
    Ok(Json(Validity::valid()))
}
