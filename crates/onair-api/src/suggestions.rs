use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use tracing::info;

use onair_db::Submission;
use onair_types::api::{SubmittedAt, SuggestionBody, SuggestionView, Validity};
use onair_types::models::NewSuggestion;

use crate::error::ApiError;
use crate::input;
use crate::rules::{self, SUGGESTION_ACCEPTED};
use crate::state::{AppState, run_db};
use crate::verification::require_verified;

/// POST /suggestion-request: suggestions only pass the blacklist check.
pub async fn submit_suggestion(
    State(state): State<AppState>,
    Query(at): Query<SubmittedAt>,
    Json(req): Json<SuggestionBody>,
) -> Result<Json<Validity>, ApiError> {
    let now = Utc::now();
    let candidate = NewSuggestion {
        name: input::required("name", &req.name)?,
        student_number: input::student_number(&req.student_number, now, state.settings.zone)?,
        suggestion: input::required("suggestion", &req.suggestion)?,
        requested_at: at.or(now),
    };

    if let Err(rejection) =
        require_verified(&state, req.verification_token.as_deref(), &candidate.student_number, now).await?
    {
        return Ok(Json(Validity::rejected(rejection.to_string())));
    }

    let requester = candidate.student_number.clone();
    let outcome = run_db(&state, move |db| {
        db.submit_suggestion(&candidate, |blacklist| {
            rules::check_suggestion(&candidate.student_number, blacklist)
        })
    })
    .await?;

    match outcome {
        Submission::Accepted(id) => {
            info!("Accepted suggestion #{} from {}", id, requester);
            Ok(Json(Validity::accepted(SUGGESTION_ACCEPTED)))
        }
        Submission::Rejected(rejection) => {
            info!("Rejected suggestion from {}: {:?}", requester, rejection);
            Ok(Json(Validity::rejected(rejection.to_string())))
        }
    }
}

/// GET /suggestion-request: every suggestion ever made, oldest first.
pub async fn list_suggestions(State(state): State<AppState>) -> Result<Json<Vec<SuggestionView>>, ApiError> {
    let suggestions = run_db(&state, |db| db.suggestions()).await?;
    Ok(Json(suggestions.into_iter().map(SuggestionView::from).collect()))
}
