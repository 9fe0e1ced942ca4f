use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use time::{OffsetDateTime, UtcOffset};

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> DateTime<Tz> {
    let utc = time.to_offset(UtcOffset::UTC);
    let seconds = utc.unix_timestamp();
    let nanos: u32 = utc.nanosecond();
    let datetime_utc = DateTime::<Utc>::from_timestamp(seconds, nanos)
        .or_else(|| DateTime::<Utc>::from_timestamp(seconds, 0))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    tz.from_utc_datetime(&datetime_utc.naive_utc())
}

/// Format a timestamp in the configured display zone, e.g. `2024/03/01 10:00:00`.
pub fn format_timestamp(time: OffsetDateTime, tz: Tz) -> String {
    localized_datetime(time, tz)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}
