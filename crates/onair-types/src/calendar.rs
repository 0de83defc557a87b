use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};

/// The song boards the club runs. Each keeps its own daily buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Board {
    /// Lunchtime broadcast, bucketed by the local calendar day.
    Daily,
    /// Morning broadcast. Requests made in the evening count toward the next
    /// morning.
    Morning,
}

impl Board {
    pub fn as_str(&self) -> &'static str {
        match self {
            Board::Daily => "daily",
            Board::Morning => "morning",
        }
    }
}

/// The calendar day a bucket of requests belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketDate(NaiveDate);

impl BucketDate {
    /// The bucket a request made at `now` lands in for `board`.
    pub fn for_board(board: Board, now: DateTime<Utc>, zone: FixedOffset, morning_cutoff_hour: u32) -> Self {
        let local = now.with_timezone(&zone);
        let day = local.date_naive();
        match board {
            Board::Daily => Self(day),
            Board::Morning if local.hour() >= morning_cutoff_hour => {
                Self(day.succ_opt().unwrap_or(day))
            }
            Board::Morning => Self(day),
        }
    }
}

impl fmt::Display for BucketDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for BucketDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self)
    }
}

/// Builds a fixed zone from an offset in minutes east of UTC.
pub fn zone_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn kst() -> FixedOffset {
        zone_from_minutes(540).unwrap()
    }

    #[test]
    fn test_local_day_crosses_midnight_in_zone() {
        // 16:30 UTC is 01:30 the next day in Seoul
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 16, 30, 0).unwrap();
        let bucket = BucketDate::for_board(Board::Daily, now, kst(), 18);
        assert_eq!(bucket.to_string(), "2024-05-02");
    }

    #[test]
    fn test_morning_board_rolls_over_at_cutoff() {
        // 08:59 UTC = 17:59 KST, still today
        let before = Utc.with_ymd_and_hms(2024, 5, 1, 8, 59, 0).unwrap();
        // 09:00 UTC = 18:00 KST, counts for tomorrow morning
        let after = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        assert_eq!(BucketDate::for_board(Board::Morning, before, kst(), 18).to_string(), "2024-05-01");
        assert_eq!(BucketDate::for_board(Board::Morning, after, kst(), 18).to_string(), "2024-05-02");
        assert_eq!(BucketDate::for_board(Board::Daily, after, kst(), 18).to_string(), "2024-05-01");
    }

    #[test]
    fn test_parse_and_display_agree() {
        let bucket: BucketDate = "2024-02-29".parse().unwrap();
        assert_eq!(bucket.to_string(), "2024-02-29");
        assert!("02/29/2024".parse::<BucketDate>().is_err());
    }
}
