use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use tracing::info;

use onair_db::{APPLICATION_INTAKE, Submission};
use onair_types::api::{ApplicationBody, SubmittedAt, Validity};
use onair_types::models::NewApplication;

use crate::error::ApiError;
use crate::input;
use crate::rules;
use crate::state::{AppState, run_db};
use crate::verification::require_verified;

/// POST /submit-application: gated only by the operator's intake flag,
/// which is read fresh on every submission.
pub async fn submit_application(
    State(state): State<AppState>,
    Query(at): Query<SubmittedAt>,
    Json(req): Json<ApplicationBody>,
) -> Result<Json<Validity>, ApiError> {
    let now = Utc::now();
    let candidate = NewApplication {
        name: input::required("name", &req.name)?,
        student_number: input::student_number(&req.student_number, now, state.settings.zone)?,
        file_url: input::required("fileURL", &req.file_url)?,
        file_type: req.file_type.trim().to_string(),
        submitted_at: at.or(now),
    };

    if let Err(rejection) =
        require_verified(&state, req.verification_token.as_deref(), &candidate.student_number, now).await?
    {
        return Ok(Json(Validity::rejected(rejection.to_string())));
    }

    let requester = candidate.student_number.clone();
    let outcome = run_db(&state, move |db| {
        db.submit_application(APPLICATION_INTAKE, &candidate, rules::check_application)
    })
    .await?;

    match outcome {
        Submission::Accepted(id) => {
            info!("Accepted application #{} from {}", id, requester);
            Ok(Json(Validity::valid()))
        }
        Submission::Rejected(rejection) => {
            info!("Application from {} refused: intake closed", requester);
            Ok(Json(Validity::rejected(rejection.to_string())))
        }
    }
}
