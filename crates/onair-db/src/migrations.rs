use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Each version step commits atomically with its `schema_version` row.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE song_requests (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                board           TEXT NOT NULL,
                bucket_date     TEXT NOT NULL,
                name            TEXT NOT NULL,
                student_number  TEXT NOT NULL,
                song_title      TEXT NOT NULL,
                singer          TEXT NOT NULL,
                image_url       TEXT NOT NULL DEFAULT '',
                requested_at    TEXT NOT NULL
            );

            CREATE INDEX idx_song_requests_bucket
                ON song_requests(board, bucket_date, id);

            CREATE TABLE suggestions (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                student_number  TEXT NOT NULL,
                suggestion      TEXT NOT NULL,
                answer          TEXT NOT NULL DEFAULT '',
                requested_at    TEXT NOT NULL
            );

            CREATE TABLE blacklist (
                student_number  TEXT PRIMARY KEY,
                name            TEXT NOT NULL DEFAULT '',
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE applications (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                student_number  TEXT NOT NULL,
                file_url        TEXT NOT NULL,
                file_type       TEXT NOT NULL,
                submitted_at    TEXT NOT NULL
            );

            CREATE TABLE intake_flags (
                kind        TEXT PRIMARY KEY,
                is_open     INTEGER NOT NULL,
                message     TEXT NOT NULL DEFAULT ''
            );

            -- Applications start closed until an operator opens them
            INSERT OR IGNORE INTO intake_flags (kind, is_open, message)
                VALUES ('application', 0, '지금은 지원 기간이 아닙니다.');

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        tx.commit()?;
    }

    if version < 2 {
        info!("Running migration v2 (email verification)");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE verification_codes (
                email       TEXT PRIMARY KEY,
                code_sha256 TEXT NOT NULL,
                attempts    INTEGER NOT NULL DEFAULT 0,
                expires_at  TEXT NOT NULL
            );

            CREATE TABLE verification_tokens (
                token       TEXT PRIMARY KEY,
                email       TEXT NOT NULL,
                expires_at  TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
        tx.commit()?;
    }

    info!("Database migrations complete");
    Ok(())
}
