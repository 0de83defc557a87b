pub mod admin;
pub mod applications;
pub mod error;
pub mod input;
pub mod mailer;
pub mod middleware;
pub mod rules;
pub mod songs;
pub mod state;
pub mod suggestions;
pub mod verification;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

pub use state::{AppState, AppStateInner, Settings};

/// Every route the portal serves. Transport layers (CORS, tracing) are added
/// by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route(
            "/song-request",
            get(songs::list_daily).post(songs::submit_daily).delete(songs::delete_daily),
        )
        .route(
            "/morning-song-request",
            get(songs::list_morning).post(songs::submit_morning).delete(songs::delete_morning),
        )
        .route(
            "/suggestion-request",
            get(suggestions::list_suggestions).post(suggestions::submit_suggestion),
        )
        .route("/submit-application", post(applications::submit_application))
        .route("/email-verification", post(verification::issue_code))
        .route("/email-verification/confirm", post(verification::confirm_code));

    let admin_routes = Router::new()
        .route(
            "/admin/blacklist",
            get(admin::list_blacklist).post(admin::add_to_blacklist).delete(admin::remove_from_blacklist),
        )
        .route(
            "/admin/application-intake",
            get(admin::get_application_intake).put(admin::set_application_intake),
        )
        .route("/admin/applications", get(admin::list_applications))
        .route("/admin/suggestions/{id}/answer", put(admin::answer_suggestion))
        .layer(from_fn_with_state(state.clone(), middleware::require_admin));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
