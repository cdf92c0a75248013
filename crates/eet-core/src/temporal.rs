//! # Temporal Types: Offset Timestamps at Second Precision
//!
//! Defines [`FiscalTimestamp`], the only timestamp shape the registration
//! service accepts for `dat_trzby` and `dat_odesl`.
//!
//! ## Wire Format
//!
//! `YYYY-MM-DDTHH:MM:SS+HH:MM`: RFC 3339 with seconds precision and an
//! explicit numeric offset. Sub-seconds are truncated at construction and a
//! UTC instant renders as `+00:00`, never `Z`.
//!
//! Only years 0000 through 9999 have a wire form; anything else is rejected
//! at construction.
//!
//! The offset of the caller's datetime is preserved. Two timestamps for the
//! same instant in different offsets produce different canonical strings and
//! therefore different control codes.

use chrono::{DateTime, Datelike, FixedOffset, Local, TimeZone, Timelike};
use serde::Serialize;

use crate::error::FieldError;

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

/// A timestamp with an explicit offset, truncated to seconds precision.
///
/// # Construction
///
/// - [`FiscalTimestamp::now()`]: current local time, truncated.
/// - [`FiscalTimestamp::from_datetime()`]: from any `DateTime<Tz>`, keeping its offset.
/// - [`FiscalTimestamp::parse()`]: from a string already in wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FiscalTimestamp(DateTime<FixedOffset>);

impl FiscalTimestamp {
    /// Current local time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Local::now().fixed_offset()))
    }

    /// Create a timestamp from a datetime in any timezone, keeping its
    /// offset and discarding sub-seconds.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidTimestamp`] if the local year (in the
    /// datetime's own offset) is outside 0000..=9999.
    pub fn from_datetime<Tz: TimeZone>(dt: DateTime<Tz>) -> Result<Self, FieldError> {
        let dt = dt.fixed_offset();
        if !(MIN_YEAR..=MAX_YEAR).contains(&dt.year()) {
            return Err(FieldError::InvalidTimestamp {
                value: dt.to_string(),
                reason: format!("year {} is outside {MIN_YEAR:04}..={MAX_YEAR}", dt.year()),
            });
        }
        Ok(Self(truncate_to_seconds(dt)))
    }

    /// Parse a timestamp in wire format.
    ///
    /// Only `YYYY-MM-DDTHH:MM:SS±HH:MM` is accepted. Fractional seconds, the
    /// `Z` suffix and a space separator are all rejected so that a parsed
    /// timestamp re-renders to the identical string.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidTimestamp`] if the string has another
    /// shape or names an impossible date or time.
    pub fn parse(s: &str) -> Result<Self, FieldError> {
        if !has_wire_shape(s) {
            return Err(FieldError::InvalidTimestamp {
                value: s.to_string(),
                reason: "expected YYYY-MM-DDTHH:MM:SS+HH:MM".to_string(),
            });
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| FieldError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(dt))
    }

    /// Access the inner datetime.
    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// Render in wire format (e.g. `2016-08-05T00:30:12+02:00`).
    pub fn to_wire(&self) -> String {
        self.0.format(WIRE_FORMAT).to_string()
    }
}

impl std::fmt::Display for FiscalTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire())
    }
}

fn truncate_to_seconds(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

fn has_wire_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 25
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            10 => *b == b'T',
            13 | 16 | 22 => *b == b':',
            19 => *b == b'+' || *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn prague_summer() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    #[test]
    fn renders_explicit_offset() {
        let dt = prague_summer()
            .with_ymd_and_hms(2016, 8, 5, 0, 30, 12)
            .unwrap();
        let ts = FiscalTimestamp::from_datetime(dt).unwrap();
        assert_eq!(ts.to_wire(), "2016-08-05T00:30:12+02:00");
    }

    #[test]
    fn utc_renders_plus_zero_not_z() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let ts = FiscalTimestamp::from_datetime(dt).unwrap();
        assert_eq!(ts.to_wire(), "2026-01-15T12:00:00+00:00");
    }

    #[test]
    fn negative_offset_renders() {
        let offset = FixedOffset::west_opt(4 * 3600 + 30 * 60).unwrap();
        let dt = offset.with_ymd_and_hms(2026, 3, 1, 8, 5, 9).unwrap();
        assert_eq!(
            FiscalTimestamp::from_datetime(dt).unwrap().to_wire(),
            "2026-03-01T08:05:09-04:30"
        );
    }

    #[test]
    fn truncates_subseconds() {
        let dt = prague_summer()
            .with_ymd_and_hms(2016, 8, 5, 0, 30, 12)
            .unwrap()
            .with_nanosecond(987_654_321)
            .unwrap();
        let ts = FiscalTimestamp::from_datetime(dt).unwrap();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
        assert_eq!(ts.to_wire(), "2016-08-05T00:30:12+02:00");
    }

    #[test]
    fn four_digit_years_only() {
        let last = prague_summer()
            .with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
            .unwrap();
        let ts = FiscalTimestamp::from_datetime(last).unwrap();
        assert_eq!(ts.to_wire(), "9999-12-31T23:59:59+02:00");
        assert_eq!(FiscalTimestamp::parse(&ts.to_wire()).unwrap(), ts);

        let beyond = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(10000, 1, 1, 0, 0, 0)
            .unwrap();
        let err = FiscalTimestamp::from_datetime(beyond).unwrap_err();
        assert!(matches!(err, FieldError::InvalidTimestamp { .. }));

        let before = prague_summer().with_ymd_and_hms(-1, 6, 1, 0, 0, 0).unwrap();
        assert!(FiscalTimestamp::from_datetime(before).is_err());
    }

    #[test]
    fn year_is_checked_in_the_datetime_offset() {
        // 9999-12-31T23:30:00Z is already year 10000 at +01:00.
        let utc = Utc.with_ymd_and_hms(9999, 12, 31, 23, 30, 0).unwrap();
        assert!(FiscalTimestamp::from_datetime(utc).is_ok());
        let prague = utc.with_timezone(&FixedOffset::east_opt(3600).unwrap());
        assert!(FiscalTimestamp::from_datetime(prague).is_err());
    }

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(FiscalTimestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn parse_accepts_wire_shape_and_round_trips() {
        let ts = FiscalTimestamp::parse("2016-08-05T00:30:12+02:00").unwrap();
        assert_eq!(ts.to_wire(), "2016-08-05T00:30:12+02:00");
        assert_eq!(format!("{ts}"), ts.to_wire());
    }

    #[test]
    fn parse_rejects_other_shapes() {
        assert!(FiscalTimestamp::parse("2016-08-05T00:30:12Z").is_err());
        assert!(FiscalTimestamp::parse("2016-08-05T00:30:12.5+02:00").is_err());
        assert!(FiscalTimestamp::parse("2016-08-05 00:30:12+02:00").is_err());
        assert!(FiscalTimestamp::parse("2016-08-05T00:30:12").is_err());
        assert!(FiscalTimestamp::parse(" 2016-08-05T00:30:12+02:00").is_err());
    }

    #[test]
    fn parse_rejects_impossible_date() {
        let err = FiscalTimestamp::parse("2016-02-30T00:30:12+02:00").unwrap_err();
        assert!(matches!(err, FieldError::InvalidTimestamp { .. }));
    }
}
