//! HTTP date parsing
//!
//! Accepts the three HTTP-date formats (IMF-fixdate, RFC 850, asctime) and
//! falls back to RFC 2822 / RFC 3339 for lenient clients.

use chrono::DateTime;
use std::time::SystemTime;

/// Parse an HTTP date header value, `None` if unparsable
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    httpdate::parse_http_date(value).ok().or_else(|| {
        DateTime::parse_from_rfc2822(value)
            .or_else(|_| DateTime::parse_from_rfc3339(value))
            .ok()
            .map(SystemTime::from)
    })
}

/// Format a timestamp as IMF-fixdate
pub fn format_http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    const SAMPLE: u64 = 784_111_777; // Sun, 06 Nov 1994 08:49:37 GMT

    #[test]
    fn test_http_date_formats() {
        let expected = UNIX_EPOCH + Duration::from_secs(SAMPLE);
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(expected));
    }

    #[test]
    fn test_lenient_formats() {
        let expected = UNIX_EPOCH + Duration::from_secs(SAMPLE);
        assert_eq!(parse_http_date("1994-11-06T08:49:37Z"), Some(expected));
        assert_eq!(parse_http_date("Sun, 6 Nov 1994 09:49:37 +0100"), Some(expected));
    }

    #[test]
    fn test_invalid_date() {
        assert_eq!(parse_http_date(""), None);
        assert_eq!(parse_http_date("yesterday"), None);
        assert_eq!(parse_http_date("\"etag\""), None);
    }

    #[test]
    fn test_format_roundtrip() {
        let time = UNIX_EPOCH + Duration::from_secs(SAMPLE);
        assert_eq!(format_http_date(time), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
