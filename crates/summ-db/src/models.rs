//! Database row types, mapped directly from SQLite rows.

use chrono::{DateTime, NaiveDateTime};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub id: i64,
    pub category_name: String,
}

/// A summary joined with its author's username and its category name.
#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub id: i64,
    pub yt_url: String,
    pub yt_title: Option<String>,
    pub yt_channel_name: Option<String>,
    pub transcript: String,
    pub summary_text: String,
    pub author_id: i64,
    pub author_username: String,
    pub category_id: i64,
    pub category_name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSummary {
    pub yt_url: String,
    pub yt_title: Option<String>,
    pub yt_channel_name: Option<String>,
    pub transcript: String,
    pub summary_text: String,
    pub author_id: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub struct SummaryUpdate {
    pub yt_title: String,
    pub yt_channel_name: String,
    pub summary_text: String,
    pub category_id: i64,
}

/// Listing filters, combined with AND. `None` disables a filter.
#[derive(Debug, Clone, Default)]
pub struct SummaryFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

/// SQLite stores `CURRENT_TIMESTAMP` as "YYYY-MM-DD HH:MM:SS" without a
/// timezone; rows written by other tools may carry RFC 3339 instead.
pub fn parse_timestamp(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.naive_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}': {}", raw, e);
            NaiveDateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_sqlite_default_timestamp() {
        let ts = parse_timestamp("2024-03-05 14:07:09");
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 5));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (14, 7, 9));
    }

    #[test]
    fn parses_rfc3339_timestamp() {
        let ts = parse_timestamp("2024-03-05T14:07:09+02:00");
        assert_eq!(ts.hour(), 12);
    }

    #[test]
    fn garbage_falls_back_to_epoch() {
        assert_eq!(parse_timestamp("not a date"), NaiveDateTime::default());
    }
}
