use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Application, BlacklistEntry, IntakeFlag, SongRequest, Suggestion};

// -- Common --

/// Outcome of a submission. Rejections are ordinary responses carrying a
/// message for the requester, not HTTP errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validity {
    pub is_valid: bool,
    pub message: String,
}

impl Validity {
    pub fn valid() -> Self {
        Self { is_valid: true, message: String::new() }
    }

    pub fn accepted(message: impl Into<String>) -> Self {
        Self { is_valid: true, message: message.into() }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self { is_valid: false, message: message.into() }
    }
}

/// `?date=<epoch millis>` sent by the forms alongside a submission.
#[derive(Debug, Default, Deserialize)]
pub struct SubmittedAt {
    pub date: Option<i64>,
}

impl SubmittedAt {
    /// The client's timestamp if it is present and representable, otherwise
    /// `fallback`.
    pub fn or(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.date
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or(fallback)
    }
}

// -- Songs --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRequestBody {
    pub name: String,
    pub student_number: String,
    pub song_title: String,
    pub singer: String,
    #[serde(default, alias = "imgSrc")]
    pub image_url: String,
    #[serde(default)]
    pub verification_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSongRequestBody {
    pub name: String,
    pub student_number: String,
    #[serde(default)]
    pub verification_token: Option<String>,
}

/// Public view of a bucket entry. The student number is shown without its
/// year prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRequestView {
    pub name: String,
    pub student_number: String,
    pub song_title: String,
    pub singer: String,
    pub image_url: String,
    pub timestamp: DateTime<Utc>,
}

impl From<SongRequest> for SongRequestView {
    fn from(req: SongRequest) -> Self {
        Self {
            name: req.name,
            student_number: req.student_number.raw().to_string(),
            song_title: req.song_title,
            singer: req.singer,
            image_url: req.image_url,
            timestamp: req.requested_at,
        }
    }
}

// -- Suggestions --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionBody {
    pub name: String,
    pub student_number: String,
    #[serde(alias = "suggestionText")]
    pub suggestion: String,
    #[serde(default)]
    pub verification_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionView {
    pub id: i64,
    pub name: String,
    pub student_number: String,
    pub suggestion: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Suggestion> for SuggestionView {
    fn from(s: Suggestion) -> Self {
        Self {
            id: s.id,
            name: s.name,
            student_number: s.student_number.raw().to_string(),
            suggestion: s.suggestion,
            answer: s.answer,
            timestamp: s.requested_at,
        }
    }
}

// -- Applications --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationBody {
    pub name: String,
    pub student_number: String,
    #[serde(rename = "fileURL", alias = "applicationFileURL")]
    pub file_url: String,
    pub file_type: String,
    #[serde(default)]
    pub verification_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: i64,
    pub name: String,
    pub student_number: String,
    #[serde(rename = "fileURL")]
    pub file_url: String,
    pub file_type: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Application> for ApplicationView {
    fn from(a: Application) -> Self {
        Self {
            id: a.id,
            name: a.name,
            student_number: a.student_number.as_str().to_string(),
            file_url: a.file_url,
            file_type: a.file_type,
            timestamp: a.submitted_at,
        }
    }
}

// -- Email verification --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerificationRequest {
    pub email_addr: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmailVerificationResponse {
    pub sent: bool,
    /// Only filled in when the server runs with code echoing enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmVerificationRequest {
    pub email_addr: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmVerificationResponse {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

// -- Operator --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntryBody {
    #[serde(default)]
    pub name: String,
    pub student_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistRemoveBody {
    pub student_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntryView {
    pub name: String,
    pub student_number: String,
}

impl From<BlacklistEntry> for BlacklistEntryView {
    fn from(e: BlacklistEntry) -> Self {
        Self { name: e.name, student_number: e.student_number.as_str().to_string() }
    }
}

impl From<IntakeFlag> for Validity {
    fn from(flag: IntakeFlag) -> Self {
        Self { is_valid: flag.is_open, message: flag.message }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnswerBody {
    pub answer: String,
}
