//! Normalization of legacy timestamps.
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const LEGACY_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a raw legacy timestamp, interpreted as UTC.
///
/// Returns `now` when the value is missing, unparseable (including the
/// all-zero `0000-00-00 00:00:00`) or earlier than the Unix epoch.
pub fn normalize_timestamp(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(parse_legacy)
        .filter(|ts| ts.timestamp() >= 0)
        .unwrap_or(now)
}

fn parse_legacy(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    LEGACY_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_valid_timestamp_is_kept() {
        let ts = normalize_timestamp(Some("2019-06-01 12:30:00"), now());
        assert_eq!(ts, Utc.with_ymd_and_hms(2019, 6, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_zero_and_garbage_become_now() {
        assert_eq!(normalize_timestamp(Some("0000-00-00 00:00:00"), now()), now());
        assert_eq!(normalize_timestamp(Some("yesterday"), now()), now());
        assert_eq!(normalize_timestamp(Some(""), now()), now());
        assert_eq!(normalize_timestamp(None, now()), now());
    }

    #[test]
    fn test_pre_epoch_becomes_now() {
        assert_eq!(normalize_timestamp(Some("1969-12-31 23:59:59"), now()), now());
        assert_eq!(
            normalize_timestamp(Some("1970-01-01 00:00:00"), now()),
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_date_only() {
        assert_eq!(
            normalize_timestamp(Some("2020-02-29"), now()),
            Utc.with_ymd_and_hms(2020, 2, 29, 0, 0, 0).unwrap()
        );
    }
}
