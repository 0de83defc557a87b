//! Acceptance rules for submissions.
//!
//! Each check runs against a snapshot the storage layer loads inside the same
//! transaction as the append, and reports the first rule that fails. Rule
//! order is part of the contract: a full bucket wins over every other reason.

use thiserror::Error;

use onair_types::StudentNumber;
use onair_types::models::{BlacklistEntry, IntakeFlag, NewSongRequest, SongRequest};

/// Characters dropped from song titles before comparing them.
pub const TITLE_PUNCTUATION: &[char] = &[
    '{', '}', '[', ']', '/', '?', '.', ',', ';', ':', '|', ')', '*', '~', '`', '!', '^', '-', '_',
    '+', '<', '>', '@', '#', '$', '%', '&', '\\', '=', '(', '\'', '"',
];

pub const SUGGESTION_ACCEPTED: &str = "건의사항이 성공적으로 신청되었습니다.";

/// Shown when the intake flag row is missing altogether.
const INTAKE_CLOSED_DEFAULT: &str = "지금은 지원 기간이 아닙니다.";

/// Why a submission was turned away. `Display` is the text shown to the
/// requester.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("오늘 신청이 마감되었습니다. ({limit}개)")]
    RequestsClosed { limit: usize },

    #[error("동일한 신청곡이 존재합니다.")]
    DuplicateSong,

    #[error("이미 신청하셨습니다.")]
    AlreadyRequested,

    #[error("블랙리스트에 등록되신 것 같습니다. 최근 신청 시 주의사항을 위반한 적이 있는지 확인해주세요")]
    Blacklisted,

    #[error("동일한 가수의 신청곡이 존재합니다.")]
    DuplicateSinger,

    #[error("{0}")]
    IntakeClosed(String),

    #[error("이메일 인증에 실패하였습니다.")]
    VerificationFailed,

    #[error("인증하신 이메일과 입력하신 학번이 일치하지 않습니다.")]
    VerificationMismatch,
}

/// Uppercases, then drops [`TITLE_PUNCTUATION`] and all whitespace.
pub fn normalize_title(title: &str) -> String {
    title
        .to_uppercase()
        .chars()
        .filter(|c| !TITLE_PUNCTUATION.contains(c) && !c.is_whitespace())
        .collect()
}

pub fn is_blacklisted(blacklist: &[BlacklistEntry], student_number: &StudentNumber) -> bool {
    blacklist.iter().any(|e| &e.student_number == student_number)
}

/// Song request rules, in priority order: quota, duplicate title, one request
/// per student, blacklist, duplicate singer. Singers are compared exactly.
pub fn check_song_request(
    candidate: &NewSongRequest,
    bucket: &[SongRequest],
    blacklist: &[BlacklistEntry],
    limit: usize,
) -> Result<(), Rejection> {
    if bucket.len() >= limit {
        return Err(Rejection::RequestsClosed { limit });
    }

    let title = normalize_title(&candidate.song_title);
    if bucket.iter().any(|r| normalize_title(&r.song_title) == title) {
        return Err(Rejection::DuplicateSong);
    }

    if bucket.iter().any(|r| r.student_number == candidate.student_number) {
        return Err(Rejection::AlreadyRequested);
    }

    if is_blacklisted(blacklist, &candidate.student_number) {
        return Err(Rejection::Blacklisted);
    }

    if bucket.iter().any(|r| r.singer == candidate.singer) {
        return Err(Rejection::DuplicateSinger);
    }

    Ok(())
}

pub fn check_suggestion(student_number: &StudentNumber, blacklist: &[BlacklistEntry]) -> Result<(), Rejection> {
    if is_blacklisted(blacklist, student_number) {
        return Err(Rejection::Blacklisted);
    }
    Ok(())
}

pub fn check_application(flag: Option<&IntakeFlag>) -> Result<(), Rejection> {
    match flag {
        Some(flag) if flag.is_open => Ok(()),
        Some(flag) => Err(Rejection::IntakeClosed(flag.message.clone())),
        None => Err(Rejection::IntakeClosed(INTAKE_CLOSED_DEFAULT.to_string())),
    }
}

/// School mailboxes are named `s` plus the raw student number (`s10203`),
/// so a proof of address must name exactly that mailbox.
pub fn check_verified_address(email: &str, student_number: &StudentNumber) -> Result<(), Rejection> {
    let local = email.split_once('@').map_or(email, |(local, _)| local);
    if local.strip_prefix('s') == Some(student_number.raw()) {
        Ok(())
    } else {
        Err(Rejection::VerificationMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sn(s: &str) -> StudentNumber {
        StudentNumber::from_stored(s.to_string())
    }

    fn existing(number: &str, title: &str, singer: &str) -> SongRequest {
        SongRequest {
            id: 0,
            name: "Existing".to_string(),
            student_number: sn(number),
            song_title: title.to_string(),
            singer: singer.to_string(),
            image_url: String::new(),
            requested_at: Utc::now(),
        }
    }

    fn candidate(number: &str, title: &str, singer: &str) -> NewSongRequest {
        NewSongRequest {
            name: "New".to_string(),
            student_number: sn(number),
            song_title: title.to_string(),
            singer: singer.to_string(),
            image_url: String::new(),
            requested_at: Utc::now(),
        }
    }

    fn blacklisted(number: &str) -> BlacklistEntry {
        BlacklistEntry { name: String::new(), student_number: sn(number) }
    }

    fn full_bucket(limit: usize) -> Vec<SongRequest> {
        (0..limit)
            .map(|i| existing(&format!("24s2{:04}", i), &format!("Song {i}"), &format!("Singer {i}")))
            .collect()
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("hello!"), "HELLO");
        assert_eq!(normalize_title("  Don't  Stop (Me) Now "), "DONTSTOPMENOW");
        assert_eq!(normalize_title("a-b_c+d=e"), "ABCDE");
        assert_eq!(normalize_title("밤편지"), "밤편지");
        // Characters outside the set survive
        assert_eq!(normalize_title("7 rings♪"), "7RINGS♪");
    }

    #[test]
    fn test_accepts_fresh_request() {
        let bucket = vec![existing("24s10101", "Hello", "Adele")];
        assert_eq!(check_song_request(&candidate("24s10102", "Halo", "Beyonce"), &bucket, &[], 10), Ok(()));
    }

    #[test]
    fn test_full_bucket_rejects_anything() {
        let bucket = full_bucket(10);
        let result = check_song_request(&candidate("24s10102", "Brand new", "Nobody"), &bucket, &[], 10);
        assert_eq!(result, Err(Rejection::RequestsClosed { limit: 10 }));
        assert_eq!(result.unwrap_err().to_string(), "오늘 신청이 마감되었습니다. (10개)");
    }

    #[test]
    fn test_duplicate_title_after_normalization() {
        let bucket = vec![existing("24s10101", "Hello", "Adele")];
        let result = check_song_request(&candidate("24s10102", "hello!", "Drake"), &bucket, &[], 10);
        assert_eq!(result, Err(Rejection::DuplicateSong));
        assert_eq!(result.unwrap_err().to_string(), "동일한 신청곡이 존재합니다.");
    }

    #[test]
    fn test_one_request_per_student() {
        let bucket = vec![existing("24s10101", "Hello", "Adele")];
        let result = check_song_request(&candidate("24s10101", "Other", "Drake"), &bucket, &[], 10);
        assert_eq!(result, Err(Rejection::AlreadyRequested));
    }

    #[test]
    fn test_blacklisted_student() {
        let result = check_song_request(&candidate("24s10101", "Hello", "Adele"), &[], &[blacklisted("24s10101")], 10);
        assert_eq!(result, Err(Rejection::Blacklisted));
    }

    #[test]
    fn test_duplicate_singer_is_case_sensitive() {
        let bucket = vec![existing("24s10101", "Hello", "Adele")];
        assert_eq!(
            check_song_request(&candidate("24s10102", "Skyfall", "Adele"), &bucket, &[], 10),
            Err(Rejection::DuplicateSinger)
        );
        assert_eq!(check_song_request(&candidate("24s10102", "Skyfall", "ADELE"), &bucket, &[], 10), Ok(()));
    }

    #[test]
    fn test_quota_outranks_blacklist_and_repeat() {
        let mut bucket = full_bucket(10);
        bucket[0] = existing("24s10101", "Hello", "Adele");
        let result = check_song_request(&candidate("24s10101", "Hello", "Adele"), &bucket, &[blacklisted("24s10101")], 10);
        assert_eq!(result, Err(Rejection::RequestsClosed { limit: 10 }));
    }

    #[test]
    fn test_duplicate_song_outranks_repeat_requester() {
        let bucket = vec![existing("24s10101", "Hello", "Adele")];
        let result = check_song_request(&candidate("24s10101", "HELLO", "Adele"), &bucket, &[blacklisted("24s10101")], 10);
        assert_eq!(result, Err(Rejection::DuplicateSong));
    }

    #[test]
    fn test_suggestion_only_checks_blacklist() {
        assert_eq!(check_suggestion(&sn("24s10101"), &[]), Ok(()));
        assert_eq!(check_suggestion(&sn("24s10101"), &[blacklisted("24s10101")]), Err(Rejection::Blacklisted));
    }

    #[test]
    fn test_application_follows_flag() {
        let closed = IntakeFlag { is_open: false, message: "모집 기간이 끝났습니다.".to_string() };
        let open = IntakeFlag { is_open: true, message: String::new() };
        assert_eq!(check_application(Some(&open)), Ok(()));
        assert_eq!(
            check_application(Some(&closed)).unwrap_err().to_string(),
            "모집 기간이 끝났습니다."
        );
        assert!(check_application(None).is_err());
    }

    #[test]
    fn test_verified_address_must_be_students_mailbox() {
        let number = sn("24s10203");
        assert_eq!(check_verified_address("s10203@seoun.sen.ms.kr", &number), Ok(()));
        assert_eq!(
            check_verified_address("s10204@seoun.sen.ms.kr", &number),
            Err(Rejection::VerificationMismatch)
        );
        // The domain does not count
        assert!(check_verified_address("someone@10203.kr", &number).is_err());
        // Nor does a mailbox that merely contains the number
        assert!(check_verified_address("s102031@seoun.sen.ms.kr", &number).is_err());
        assert!(check_verified_address("xs10203@seoun.sen.ms.kr", &number).is_err());
        assert!(check_verified_address("10203@seoun.sen.ms.kr", &number).is_err());
    }
}
