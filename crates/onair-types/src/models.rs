use chrono::{DateTime, Utc};

use crate::student::StudentNumber;

/// A song request as stored in a day's bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRequest {
    pub id: i64,
    pub name: String,
    pub student_number: StudentNumber,
    pub song_title: String,
    pub singer: String,
    pub image_url: String,
    pub requested_at: DateTime<Utc>,
}

/// A song request that has not been accepted yet.
#[derive(Debug, Clone)]
pub struct NewSongRequest {
    pub name: String,
    pub student_number: StudentNumber,
    pub song_title: String,
    pub singer: String,
    pub image_url: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub id: i64,
    pub name: String,
    pub student_number: StudentNumber,
    pub suggestion: String,
    /// Empty until a club member answers.
    pub answer: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSuggestion {
    pub name: String,
    pub student_number: StudentNumber,
    pub suggestion: String,
    pub requested_at: DateTime<Utc>,
}

/// Membership is decided by student number alone; the name is kept for the
/// operator's benefit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistEntry {
    pub name: String,
    pub student_number: StudentNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: i64,
    pub name: String,
    pub student_number: StudentNumber,
    pub file_url: String,
    pub file_type: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub name: String,
    pub student_number: StudentNumber,
    pub file_url: String,
    pub file_type: String,
    pub submitted_at: DateTime<Utc>,
}

/// Operator switch for a submission type. When closed, `message` is shown to
/// everyone who tries to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeFlag {
    pub is_open: bool,
    pub message: String,
}
