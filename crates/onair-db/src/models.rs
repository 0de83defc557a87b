//! Database row types. These map directly to SQLite rows and are converted
//! into `onair_types::models` once timestamps have been parsed.

use anyhow::Result;
use onair_types::StudentNumber;
use onair_types::models::{Application, BlacklistEntry, SongRequest, Suggestion};

use crate::parse_ts;

pub struct SongRow {
    pub id: i64,
    pub name: String,
    pub student_number: String,
    pub song_title: String,
    pub singer: String,
    pub image_url: String,
    pub requested_at: String,
}

impl SongRow {
    pub fn into_model(self) -> Result<SongRequest> {
        Ok(SongRequest {
            id: self.id,
            name: self.name,
            student_number: StudentNumber::from_stored(self.student_number),
            song_title: self.song_title,
            singer: self.singer,
            image_url: self.image_url,
            requested_at: parse_ts(&self.requested_at)?,
        })
    }
}

pub struct SuggestionRow {
    pub id: i64,
    pub name: String,
    pub student_number: String,
    pub suggestion: String,
    pub answer: String,
    pub requested_at: String,
}

impl SuggestionRow {
    pub fn into_model(self) -> Result<Suggestion> {
        Ok(Suggestion {
            id: self.id,
            name: self.name,
            student_number: StudentNumber::from_stored(self.student_number),
            suggestion: self.suggestion,
            answer: self.answer,
            requested_at: parse_ts(&self.requested_at)?,
        })
    }
}

pub struct ApplicationRow {
    pub id: i64,
    pub name: String,
    pub student_number: String,
    pub file_url: String,
    pub file_type: String,
    pub submitted_at: String,
}

impl ApplicationRow {
    pub fn into_model(self) -> Result<Application> {
        Ok(Application {
            id: self.id,
            name: self.name,
            student_number: StudentNumber::from_stored(self.student_number),
            file_url: self.file_url,
            file_type: self.file_type,
            submitted_at: parse_ts(&self.submitted_at)?,
        })
    }
}

pub struct BlacklistRow {
    pub student_number: String,
    pub name: String,
}

impl From<BlacklistRow> for BlacklistEntry {
    fn from(row: BlacklistRow) -> Self {
        Self {
            name: row.name,
            student_number: StudentNumber::from_stored(row.student_number),
        }
    }
}

pub struct VerificationCodeRow {
    pub email: String,
    pub code_sha256: String,
    pub attempts: u32,
    pub expires_at: String,
}
