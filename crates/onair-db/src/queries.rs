use anyhow::Result;
use rusqlite::Connection;

use onair_types::models::{
    Application, BlacklistEntry, IntakeFlag, NewApplication, NewSongRequest, NewSuggestion,
    SongRequest, Suggestion,
};
use onair_types::{Board, BucketDate, StudentNumber};

use crate::models::{ApplicationRow, BlacklistRow, SongRow, SuggestionRow};
use crate::{Database, OptionalExt, Submission, ts};

impl Database {
    // -- Song requests --

    /// Loads the bucket and blacklist, runs `check` against them and appends
    /// `candidate` only if it passes. The whole sequence holds the write lock
    /// inside one transaction, so two submissions cannot both squeeze past
    /// the quota.
    pub fn submit_song_request<R>(
        &self,
        board: Board,
        bucket: BucketDate,
        candidate: &NewSongRequest,
        check: impl FnOnce(&[SongRequest], &[BlacklistEntry]) -> std::result::Result<(), R>,
    ) -> Result<Submission<R>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let existing = query_bucket(&tx, board, bucket)?;
            let blacklist = query_blacklist(&tx)?;

            if let Err(rejection) = check(&existing, &blacklist) {
                return Ok(Submission::Rejected(rejection));
            }

            tx.execute(
                "INSERT INTO song_requests
                    (board, bucket_date, name, student_number, song_title, singer, image_url, requested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    board.as_str(),
                    bucket.to_string(),
                    candidate.name,
                    candidate.student_number.as_str(),
                    candidate.song_title,
                    candidate.singer,
                    candidate.image_url,
                    ts(candidate.requested_at),
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Submission::Accepted(id))
        })
    }

    pub fn song_bucket(&self, board: Board, bucket: BucketDate) -> Result<Vec<SongRequest>> {
        self.with_conn(|conn| query_bucket(conn, board, bucket))
    }

    /// Removes every entry in the bucket matching both name and student
    /// number. Returns how many were removed.
    pub fn delete_song_requests(
        &self,
        board: Board,
        bucket: BucketDate,
        name: &str,
        student_number: &StudentNumber,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM song_requests
                 WHERE board = ?1 AND bucket_date = ?2 AND name = ?3 AND student_number = ?4",
                rusqlite::params![board.as_str(), bucket.to_string(), name, student_number.as_str()],
            )?;
            Ok(removed)
        })
    }

    // -- Suggestions --

    pub fn submit_suggestion<R>(
        &self,
        candidate: &NewSuggestion,
        check: impl FnOnce(&[BlacklistEntry]) -> std::result::Result<(), R>,
    ) -> Result<Submission<R>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let blacklist = query_blacklist(&tx)?;

            if let Err(rejection) = check(&blacklist) {
                return Ok(Submission::Rejected(rejection));
            }

            tx.execute(
                "INSERT INTO suggestions (name, student_number, suggestion, requested_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    candidate.name,
                    candidate.student_number.as_str(),
                    candidate.suggestion,
                    ts(candidate.requested_at),
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Submission::Accepted(id))
        })
    }

    pub fn suggestions(&self) -> Result<Vec<Suggestion>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, student_number, suggestion, answer, requested_at
                 FROM suggestions ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(SuggestionRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        student_number: row.get(2)?,
                        suggestion: row.get(3)?,
                        answer: row.get(4)?,
                        requested_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(SuggestionRow::into_model).collect()
        })
    }

    /// Returns false if no suggestion has that id.
    pub fn answer_suggestion(&self, id: i64, answer: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE suggestions SET answer = ?1 WHERE id = ?2",
                rusqlite::params![answer, id],
            )?;
            Ok(updated > 0)
        })
    }

    // -- Blacklist --

    pub fn blacklist(&self) -> Result<Vec<BlacklistEntry>> {
        self.with_conn(query_blacklist)
    }

    /// Returns false if the student number was already listed; the stored
    /// name is refreshed either way.
    pub fn add_to_blacklist(&self, entry: &BlacklistEntry) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let existing: Option<String> = tx
                .query_row(
                    "SELECT student_number FROM blacklist WHERE student_number = ?1",
                    [entry.student_number.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            tx.execute(
                "INSERT INTO blacklist (student_number, name) VALUES (?1, ?2)
                 ON CONFLICT(student_number) DO UPDATE SET name = excluded.name",
                rusqlite::params![entry.student_number.as_str(), entry.name],
            )?;
            tx.commit()?;
            Ok(existing.is_none())
        })
    }

    pub fn remove_from_blacklist(&self, student_number: &StudentNumber) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM blacklist WHERE student_number = ?1",
                [student_number.as_str()],
            )?;
            Ok(removed > 0)
        })
    }

    // -- Intake flags --

    pub fn intake_flag(&self, kind: &str) -> Result<Option<IntakeFlag>> {
        self.with_conn(|conn| query_intake_flag(conn, kind))
    }

    pub fn set_intake_flag(&self, kind: &str, flag: &IntakeFlag) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO intake_flags (kind, is_open, message) VALUES (?1, ?2, ?3)
                 ON CONFLICT(kind) DO UPDATE SET is_open = excluded.is_open, message = excluded.message",
                rusqlite::params![kind, flag.is_open, flag.message],
            )?;
            Ok(())
        })
    }

    // -- Applications --

    /// The flag is read inside the same transaction as the append, so a
    /// closed intake never lets a write through.
    pub fn submit_application<R>(
        &self,
        kind: &str,
        candidate: &NewApplication,
        check: impl FnOnce(Option<&IntakeFlag>) -> std::result::Result<(), R>,
    ) -> Result<Submission<R>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let flag = query_intake_flag(&tx, kind)?;

            if let Err(rejection) = check(flag.as_ref()) {
                return Ok(Submission::Rejected(rejection));
            }

            tx.execute(
                "INSERT INTO applications (name, student_number, file_url, file_type, submitted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    candidate.name,
                    candidate.student_number.as_str(),
                    candidate.file_url,
                    candidate.file_type,
                    ts(candidate.submitted_at),
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Submission::Accepted(id))
        })
    }

    pub fn applications(&self) -> Result<Vec<Application>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, student_number, file_url, file_type, submitted_at
                 FROM applications ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ApplicationRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        student_number: row.get(2)?,
                        file_url: row.get(3)?,
                        file_type: row.get(4)?,
                        submitted_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(ApplicationRow::into_model).collect()
        })
    }
}

fn query_bucket(conn: &Connection, board: Board, bucket: BucketDate) -> Result<Vec<SongRequest>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, student_number, song_title, singer, image_url, requested_at
         FROM song_requests
         WHERE board = ?1 AND bucket_date = ?2
         ORDER BY id",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![board.as_str(), bucket.to_string()], |row| {
            Ok(SongRow {
                id: row.get(0)?,
                name: row.get(1)?,
                student_number: row.get(2)?,
                song_title: row.get(3)?,
                singer: row.get(4)?,
                image_url: row.get(5)?,
                requested_at: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(SongRow::into_model).collect()
}

fn query_blacklist(conn: &Connection) -> Result<Vec<BlacklistEntry>> {
    let mut stmt = conn.prepare("SELECT student_number, name FROM blacklist ORDER BY created_at, student_number")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(BlacklistRow {
                student_number: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(BlacklistEntry::from).collect())
}

fn query_intake_flag(conn: &Connection, kind: &str) -> Result<Option<IntakeFlag>> {
    conn.query_row(
        "SELECT is_open, message FROM intake_flags WHERE kind = ?1",
        [kind],
        |row| {
            Ok(IntakeFlag {
                is_open: row.get(0)?,
                message: row.get(1)?,
            })
        },
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sn(s: &str) -> StudentNumber {
        StudentNumber::from_stored(s.to_string())
    }

    fn today() -> BucketDate {
        "2024-05-01".parse().unwrap()
    }

    fn song(name: &str, number: &str, title: &str) -> NewSongRequest {
        NewSongRequest {
            name: name.to_string(),
            student_number: sn(number),
            song_title: title.to_string(),
            singer: "Singer".to_string(),
            image_url: String::new(),
            requested_at: Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_song_bucket_is_partitioned_by_board_and_day() {
        let db = Database::open_in_memory().unwrap();
        let tomorrow: BucketDate = "2024-05-02".parse().unwrap();

        let ok = |_: &[SongRequest], _: &[BlacklistEntry]| Ok::<(), ()>(());
        db.submit_song_request(Board::Daily, today(), &song("A", "24s10101", "One"), ok).unwrap();
        db.submit_song_request(Board::Daily, tomorrow, &song("B", "24s10102", "Two"), ok).unwrap();
        db.submit_song_request(Board::Morning, today(), &song("C", "24s10103", "Three"), ok).unwrap();

        let bucket = db.song_bucket(Board::Daily, today()).unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].song_title, "One");
        assert_eq!(bucket[0].student_number.as_str(), "24s10101");
        assert_eq!(bucket[0].requested_at, Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap());
    }

    #[test]
    fn test_rejected_submission_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let outcome = db
            .submit_song_request(Board::Daily, today(), &song("A", "24s10101", "One"), |_, _| Err("closed"))
            .unwrap();
        assert_eq!(outcome, Submission::Rejected("closed"));
        assert!(db.song_bucket(Board::Daily, today()).unwrap().is_empty());
    }

    #[test]
    fn test_guard_sees_existing_bucket_and_blacklist() {
        let db = Database::open_in_memory().unwrap();
        db.add_to_blacklist(&BlacklistEntry { name: "X".into(), student_number: sn("24s99999") }).unwrap();
        db.submit_song_request(Board::Daily, today(), &song("A", "24s10101", "One"), |_, _| Ok::<(), ()>(()))
            .unwrap();

        db.submit_song_request(Board::Daily, today(), &song("B", "24s10102", "Two"), |bucket, blacklist| {
            assert_eq!(bucket.len(), 1);
            assert_eq!(blacklist.len(), 1);
            Ok::<(), ()>(())
        })
        .unwrap();
    }

    #[test]
    fn test_delete_matches_name_and_number() {
        let db = Database::open_in_memory().unwrap();
        let ok = |_: &[SongRequest], _: &[BlacklistEntry]| Ok::<(), ()>(());
        db.submit_song_request(Board::Daily, today(), &song("A", "24s10101", "One"), ok).unwrap();
        db.submit_song_request(Board::Daily, today(), &song("B", "24s10102", "Two"), ok).unwrap();

        assert_eq!(db.delete_song_requests(Board::Daily, today(), "A", &sn("24s10102")).unwrap(), 0);
        assert_eq!(db.delete_song_requests(Board::Daily, today(), "A", &sn("24s10101")).unwrap(), 1);
        let left = db.song_bucket(Board::Daily, today()).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "B");
    }

    #[test]
    fn test_blacklist_add_and_remove() {
        let db = Database::open_in_memory().unwrap();
        let entry = BlacklistEntry { name: "X".into(), student_number: sn("24s10101") };
        assert!(db.add_to_blacklist(&entry).unwrap());
        assert!(!db.add_to_blacklist(&entry).unwrap());
        assert_eq!(db.blacklist().unwrap(), vec![entry.clone()]);
        assert!(db.remove_from_blacklist(&entry.student_number).unwrap());
        assert!(!db.remove_from_blacklist(&entry.student_number).unwrap());
    }

    #[test]
    fn test_suggestion_answer() {
        let db = Database::open_in_memory().unwrap();
        let candidate = NewSuggestion {
            name: "A".into(),
            student_number: sn("24s10101"),
            suggestion: "More jazz".into(),
            requested_at: Utc::now(),
        };
        let Submission::Accepted(id) = db.submit_suggestion(&candidate, |_| Ok::<(), ()>(())).unwrap() else {
            panic!("suggestion rejected");
        };
        assert_eq!(db.suggestions().unwrap()[0].answer, "");
        assert!(db.answer_suggestion(id, "Next week").unwrap());
        assert!(!db.answer_suggestion(id + 1, "Nope").unwrap());
        assert_eq!(db.suggestions().unwrap()[0].answer, "Next week");
    }

    #[test]
    fn test_application_intake_seeded_closed() {
        let db = Database::open_in_memory().unwrap();
        let flag = db.intake_flag(crate::APPLICATION_INTAKE).unwrap().unwrap();
        assert!(!flag.is_open);

        db.set_intake_flag(crate::APPLICATION_INTAKE, &IntakeFlag { is_open: true, message: String::new() })
            .unwrap();
        assert!(db.intake_flag(crate::APPLICATION_INTAKE).unwrap().unwrap().is_open);
        assert!(db.intake_flag("unknown").unwrap().is_none());
    }
}
