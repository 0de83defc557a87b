use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::models::VerificationCodeRow;
use crate::{Database, OptionalExt, parse_ts, ts};

/// Outcome of checking a submitted code against the stored digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    /// No code was issued for that address, or it was already used.
    Missing,
    Expired,
    /// Too many wrong guesses; the code is dead until a new one is issued.
    Exhausted,
    Mismatch,
    Confirmed,
}

impl Database {
    /// Stores the digest of a freshly issued code, replacing any earlier code
    /// for the same address.
    pub fn store_verification_code(
        &self,
        email: &str,
        code_sha256: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO verification_codes (email, code_sha256, attempts, expires_at)
                 VALUES (?1, ?2, 0, ?3)
                 ON CONFLICT(email) DO UPDATE SET
                    code_sha256 = excluded.code_sha256,
                    attempts = 0,
                    expires_at = excluded.expires_at",
                rusqlite::params![email, code_sha256, ts(expires_at)],
            )?;
            Ok(())
        })
    }

    /// Checks `code_sha256` for `email`. On a match the code is consumed and
    /// `token` is stored as a single-use proof of the address.
    pub fn confirm_verification_code(
        &self,
        email: &str,
        code_sha256: &str,
        now: DateTime<Utc>,
        max_attempts: u32,
        token: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<CodeCheck> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let row = tx
                .query_row(
                    "SELECT email, code_sha256, attempts, expires_at FROM verification_codes WHERE email = ?1",
                    [email],
                    |row| {
                        Ok(VerificationCodeRow {
                            email: row.get(0)?,
                            code_sha256: row.get(1)?,
                            attempts: row.get(2)?,
                            expires_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;

            let Some(row) = row else {
                return Ok(CodeCheck::Missing);
            };

            if parse_ts(&row.expires_at)? <= now {
                tx.execute("DELETE FROM verification_codes WHERE email = ?1", [&row.email])?;
                tx.commit()?;
                return Ok(CodeCheck::Expired);
            }

            if row.attempts >= max_attempts {
                return Ok(CodeCheck::Exhausted);
            }

            if row.code_sha256 != code_sha256 {
                tx.execute(
                    "UPDATE verification_codes SET attempts = attempts + 1 WHERE email = ?1",
                    [&row.email],
                )?;
                tx.commit()?;
                return Ok(CodeCheck::Mismatch);
            }

            tx.execute("DELETE FROM verification_codes WHERE email = ?1", [&row.email])?;
            tx.execute(
                "INSERT INTO verification_tokens (token, email, expires_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![token, row.email, ts(token_expires_at)],
            )?;
            tx.commit()?;
            Ok(CodeCheck::Confirmed)
        })
    }

    /// Removes `token` and returns the address it proves, if it was still
    /// live. A token can only ever be consumed once.
    pub fn consume_verification_token(&self, token: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let row: Option<(String, String)> = tx
                .query_row(
                    "SELECT email, expires_at FROM verification_tokens WHERE token = ?1",
                    [token],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((email, expires_at)) = row else {
                return Ok(None);
            };

            tx.execute("DELETE FROM verification_tokens WHERE token = ?1", [token])?;
            tx.commit()?;

            if parse_ts(&expires_at)? <= now {
                return Ok(None);
            }
            Ok(Some(email))
        })
    }

    /// Deletes codes and tokens that expired before `now`. Returns how many
    /// rows were removed.
    pub fn prune_expired_verifications(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let cutoff = ts(now);
            let codes = conn.execute("DELETE FROM verification_codes WHERE expires_at <= ?1", [&cutoff])?;
            let tokens = conn.execute("DELETE FROM verification_tokens WHERE expires_at <= ?1", [&cutoff])?;
            Ok(codes + tokens)
        })
    }
}
