//! One-time codes proving a student controls their school mailbox.
//!
//! The server keeps only a digest of each code and does the comparison
//! itself. A confirmed code is traded for an opaque single-use token that the
//! form submits alongside the request.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use uuid::Uuid;

use onair_db::verification::CodeCheck;
use onair_types::StudentNumber;
use onair_types::api::{
    ConfirmVerificationRequest, ConfirmVerificationResponse, EmailVerificationRequest,
    EmailVerificationResponse,
};

use crate::error::ApiError;
use crate::mailer::MailMessage;
use crate::rules::{self, Rejection};
use crate::state::{AppState, run_db};

pub const CODE_LEN: usize = 6;


/// POST /email-verification: issue a code and mail it.
pub async fn issue_code(
    State(state): State<AppState>,
    Json(req): Json<EmailVerificationRequest>,
) -> Result<Json<EmailVerificationResponse>, ApiError> {
    let email = school_address(&req.email_addr, &state.settings.school_domain)?;
    let code = generate_code();
    let digest = code_digest(&email, &code);
    let expires_at = Utc::now() + state.settings.code_ttl;

    let addr = email.clone();
    run_db(&state, move |db| db.store_verification_code(&addr, &digest, expires_at)).await?;

    let message = MailMessage {
        from: state.settings.mail_from.clone(),
        to: email.clone(),
        subject: mail_subject(&state.settings.school_name),
        text: format!("안녕하세요, 방송부입니다.\n신청자님의 인증 코드는 다음과 같습니다:\n{}", code),
    };
    state.mailer.send(&message).await.map_err(|e| {
        error!("Failed to send verification mail to {}: {:#}", email, e);
        ApiError::Upstream
    })?;

    info!("Verification code issued for {}", email);
    Ok(Json(EmailVerificationResponse {
        sent: true,
        code: state.settings.expose_code.then_some(code),
    }))
}

/// POST /email-verification/confirm: trade a correct code for a token.
pub async fn confirm_code(
    State(state): State<AppState>,
    Json(req): Json<ConfirmVerificationRequest>,
) -> Result<Json<ConfirmVerificationResponse>, ApiError> {
    let email = school_address(&req.email_addr, &state.settings.school_domain)?;
    let digest = code_digest(&email, req.code.trim());
    let token = Uuid::new_v4().to_string();
    let now = Utc::now();
    let token_expires_at = now + state.settings.code_ttl;
    let max_attempts = state.settings.max_code_attempts;

    let (addr, tok) = (email.clone(), token.clone());
    let check = run_db(&state, move |db| {
        db.confirm_verification_code(&addr, &digest, now, max_attempts, &tok, token_expires_at)
    })
    .await?;

    if check != CodeCheck::Confirmed {
        warn!("Verification for {} failed: {:?}", email, check);
        return Ok(Json(ConfirmVerificationResponse { verified: false, token: None }));
    }

    info!("Verified {}", email);
    Ok(Json(ConfirmVerificationResponse { verified: true, token: Some(token) }))
}

/// Consumes the submission's token when verification is required. The outer
/// error is a server failure; the inner one is a rejection for the requester.
pub(crate) async fn require_verified(
    state: &AppState,
    token: Option<&str>,
    student_number: &StudentNumber,
    now: DateTime<Utc>,
) -> Result<Result<(), Rejection>, ApiError> {
    if !state.settings.require_verification {
        return Ok(Ok(()));
    }

    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(Err(Rejection::VerificationFailed));
    };

    let tok = token.to_string();
    let email = run_db(state, move |db| db.consume_verification_token(&tok, now)).await?;

    match email {
        Some(email) => Ok(rules::check_verified_address(&email, student_number)),
        None => Ok(Err(Rejection::VerificationFailed)),
    }
}

/// Accepts a bare local part or a full address on the school domain and
/// returns the full, lowercased address.
pub fn school_address(input: &str, domain: &str) -> Result<String, ApiError> {
    let input = input.trim();
    let local = match input.split_once('@') {
        Some((local, d)) if d.eq_ignore_ascii_case(domain) => local,
        Some(_) => return Err(ApiError::BadRequest(format!("address must be on {domain}"))),
        None => input,
    };

    let valid = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+'));
    if !valid {
        return Err(ApiError::BadRequest("malformed email address".to_string()));
    }

    Ok(format!("{}@{}", local.to_ascii_lowercase(), domain))
}

fn mail_subject(school_name: &str) -> String {
    format!("{} 방송부 웹사이트 본인인증 코드", school_name)
}

/// Six decimal digits. Codes are short-lived, single-use and delivered out of
/// band, so a general-purpose RNG is enough.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

fn code_digest(email: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_school_address() {
        let domain = "seoun.sen.ms.kr";
        assert_eq!(school_address("S10203", domain).unwrap(), "s10203@seoun.sen.ms.kr");
        assert_eq!(school_address("s10203@SEOUN.sen.ms.kr", domain).unwrap(), "s10203@seoun.sen.ms.kr");
        assert!(school_address("s10203@gmail.com", domain).is_err());
        assert!(school_address("", domain).is_err());
        assert!(school_address("a b", domain).is_err());
    }

    #[test]
    fn test_mail_subject_names_school() {
        assert_eq!(mail_subject("서운중학교"), "서운중학교 방송부 웹사이트 본인인증 코드");
    }

    #[test]
    fn test_digest_binds_address() {
        assert_ne!(code_digest("a@x", "123456"), code_digest("b@x", "123456"));
        assert_eq!(code_digest("a@x", "123456").len(), 64);
    }
}
