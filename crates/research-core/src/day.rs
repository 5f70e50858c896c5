use chrono::{Duration, NaiveDate, Utc};

/// All daily boundaries (cache keys, quota rows, "today" for the fallback
/// search) use a fixed UTC+8 day, not the server's local midnight, so the
/// daily reset is deterministic wherever the service is deployed.
pub const BUSINESS_DAY_UTC_OFFSET_HOURS: i64 = 8;

/// Today's business-day date.
pub fn business_today() -> NaiveDate {
    (Utc::now() + Duration::hours(BUSINESS_DAY_UTC_OFFSET_HOURS)).date_naive()
}

/// Today's business day as the `YYYY-MM-DD` key string used by the store.
pub fn business_day_str() -> String {
    business_today().format("%Y-%m-%d").to_string()
}
