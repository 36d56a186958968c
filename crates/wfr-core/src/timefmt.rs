use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::CoreError;

/// Wire format of scheduler timestamps: `Tue, 01 Jan 2013 00:00:00 GMT`.
const WIRE_FORMAT: &[FormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Minute-resolution format entities use for start/end times: `2013-01-01T00:00Z`.
const SCHEDULER_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]Z");

pub fn parse_wire_time(raw: &str) -> Result<OffsetDateTime, CoreError> {
    PrimitiveDateTime::parse(raw.trim(), WIRE_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| CoreError::InvalidTimestamp { value: raw.to_string(), reason: e.to_string() })
}

pub fn format_wire_time(t: OffsetDateTime) -> String {
    t.to_offset(time::UtcOffset::UTC)
        .format(WIRE_FORMAT)
        .unwrap_or_else(|_| t.to_string())
}

pub fn format_scheduler_date(t: OffsetDateTime) -> String {
    t.to_offset(time::UtcOffset::UTC)
        .format(SCHEDULER_DATE_FORMAT)
        .unwrap_or_else(|_| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_wire_timestamps_as_utc() {
        let t = parse_wire_time("Tue, 01 Jan 2013 00:05:00 GMT").unwrap();
        assert_eq!(t, datetime!(2013-01-01 00:05:00 UTC));
        assert_eq!(format_wire_time(t), "Tue, 01 Jan 2013 00:05:00 GMT");
    }

    #[test]
    fn scheduler_date_has_minute_resolution() {
        let t = datetime!(2013-01-01 10:20:30 UTC);
        assert_eq!(format_scheduler_date(t), "2013-01-01T10:20Z");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(parse_wire_time("yesterday"), Err(CoreError::InvalidTimestamp { .. })));
    }
}
