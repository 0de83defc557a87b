use std::sync::Arc;

use chrono::{Duration, FixedOffset};
use tracing::error;

use onair_db::Database;

use crate::error::ApiError;
use crate::mailer::Mailer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub mailer: Arc<dyn Mailer>,
    pub settings: Settings,
}

/// Request-time policy. Fixed for the life of the process; anything an
/// operator toggles at runtime lives in the database instead.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Zone used for bucket dates and student-number year prefixes.
    pub zone: FixedOffset,
    /// Shown in the verification mail subject.
    pub school_name: String,
    pub school_domain: String,
    pub daily_song_limit: usize,
    pub morning_cutoff_hour: u32,
    pub code_ttl: Duration,
    pub max_code_attempts: u32,
    pub require_verification: bool,
    /// Echo the code in the issue response, for clients that still compare
    /// it themselves.
    pub expose_code: bool,
    pub mail_from: String,
    /// Empty disables the operator routes entirely.
    pub admin_token: String,
}

impl Default for Settings {
    fn default() -> Self {
        let school_domain = "seoun.sen.ms.kr".to_string();
        Self {
            zone: FixedOffset::east_opt(9 * 3600).expect("+09:00 is a valid offset"),
            mail_from: format!("broadcast@{}", school_domain),
            school_name: "서운중학교".to_string(),
            school_domain,
            daily_song_limit: 10,
            morning_cutoff_hour: 18,
            code_ttl: Duration::minutes(10),
            max_code_attempts: 5,
            require_verification: false,
            expose_code: false,
            admin_token: String::new(),
        }
    }
}

/// Runs a blocking storage call off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = state.clone();
    tokio::task::spawn_blocking(move || f(&db.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(|e| {
            error!("Database error: {:#}", e);
            ApiError::Internal
        })
}
