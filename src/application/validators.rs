use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Phone numbers are stored as-is; the only rule is a minimum length of
/// five characters after trimming.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.trim().len() >= 5
}

/// Parses an ISO 8601 timestamp filter value. Accepts RFC 3339, a bare
/// datetime, or a plain date (midnight); bare values are taken as UTC.
/// Returns `None` for anything else so callers can turn it into a 400.
pub fn parse_date_filter(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = value.parse::<NaiveDateTime>() {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = value.parse::<NaiveDate>() {
        return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    None
}
