//! Time and timestamp utilities

use chrono::{SecondsFormat, Utc};

/// Current time as an RFC 3339 / ISO-8601 string with millisecond precision,
/// e.g. `2024-01-01T12:34:56.789Z`.
pub fn rfc3339_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_rfc3339_now_parses_back() {
        let stamp = rfc3339_now();
        let parsed = DateTime::parse_from_rfc3339(&stamp);
        assert!(parsed.is_ok(), "not RFC 3339: {stamp}");
        assert!(stamp.ends_with('Z'));
    }
}
