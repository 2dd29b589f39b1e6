use chrono::{DateTime, Utc};

pub const FIXED_TIME_ENV: &str = "STATUSWATCH_FIXED_TIME";

/// Wall clock used to stamp notifications. `STATUSWATCH_FIXED_TIME` (RFC 3339) pins it.
pub fn now_utc() -> DateTime<Utc> {
    if let Ok(value) = std::env::var(FIXED_TIME_ENV) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
            return dt.with_timezone(&Utc);
        }
    }
    Utc::now()
}

pub fn display_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
