//! HTTP Range request parsing module
//!
//! `Range: bytes=...` parsing for partial responses (RFC 9110 section 14).

/// Inclusive byte range within a representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered
    #[inline]
    pub const fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeParseResult {
    /// At least one satisfiable range, in request order
    Satisfiable(Vec<ByteRange>),
    /// Syntactically valid but nothing overlaps the representation (416)
    Unsatisfiable,
    /// Absent, malformed or non-bytes unit (serve the full body)
    Ignored,
}

/// Parse an HTTP Range header against a representation size
///
/// Supported forms per range spec:
/// - `start-end` - Specific range, end clamped to the last byte
/// - `start-` - From start to the end
/// - `-suffix` - Last suffix bytes
///
/// # Examples
/// ```
/// use waymark::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-99"), 1000);
/// assert_eq!(result, RangeParseResult::Satisfiable(vec![ByteRange { start: 0, end: 99 }]));
///
/// assert_eq!(parse_range_header(None, 1000), RangeParseResult::Ignored);
/// ```
pub fn parse_range_header(range_header: Option<&str>, size: u64) -> RangeParseResult {
    let Some(header) = range_header else {
        return RangeParseResult::Ignored;
    };

    let Some(specs) = header.trim().strip_prefix("bytes=") else {
        return RangeParseResult::Ignored;
    };

    let mut ranges = Vec::new();
    for spec in specs.split(',') {
        let Some((start_str, end_str)) = spec.trim().split_once('-') else {
            return RangeParseResult::Ignored;
        };
        match parse_spec(start_str.trim(), end_str.trim(), size) {
            Spec::Range(range) => ranges.push(range),
            Spec::Unsatisfiable => {}
            Spec::Invalid => return RangeParseResult::Ignored,
        }
    }

    if ranges.is_empty() {
        RangeParseResult::Unsatisfiable
    } else {
        RangeParseResult::Satisfiable(ranges)
    }
}

enum Spec {
    Range(ByteRange),
    Unsatisfiable,
    Invalid,
}

fn parse_spec(start_str: &str, end_str: &str, size: u64) -> Spec {
    // Suffix range: "-500" means last 500 bytes
    if start_str.is_empty() {
        let Ok(suffix) = end_str.parse::<u64>() else {
            return Spec::Invalid;
        };
        if suffix == 0 || size == 0 {
            return Spec::Unsatisfiable;
        }
        return Spec::Range(ByteRange {
            start: size.saturating_sub(suffix),
            end: size - 1,
        });
    }

    let Ok(start) = start_str.parse::<u64>() else {
        return Spec::Invalid;
    };

    let end = if end_str.is_empty() {
        size.saturating_sub(1)
    } else {
        let Ok(end) = end_str.parse::<u64>() else {
            return Spec::Invalid;
        };
        if end < start {
            return Spec::Invalid;
        }
        end.min(size.saturating_sub(1))
    };

    if start >= size {
        return Spec::Unsatisfiable;
    }

    Spec::Range(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(start: u64, end: u64) -> RangeParseResult {
        RangeParseResult::Satisfiable(vec![ByteRange { start, end }])
    }

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, 100), RangeParseResult::Ignored);
    }

    #[test]
    fn test_standard_range() {
        assert_eq!(parse_range_header(Some("bytes=0-9"), 100), single(0, 9));
        assert_eq!(ByteRange { start: 0, end: 9 }.length(), 10);
    }

    #[test]
    fn test_open_range() {
        assert_eq!(parse_range_header(Some("bytes=50-"), 100), single(50, 99));
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(parse_range_header(Some("bytes=-20"), 100), single(80, 99));
        assert_eq!(parse_range_header(Some("bytes=-500"), 100), single(0, 99));
    }

    #[test]
    fn test_end_clamped() {
        assert_eq!(parse_range_header(Some("bytes=90-500"), 100), single(90, 99));
    }

    #[test]
    fn test_multiple_ranges() {
        assert_eq!(
            parse_range_header(Some("bytes=0-9, 20-29, 500-"), 100),
            RangeParseResult::Satisfiable(vec![
                ByteRange { start: 0, end: 9 },
                ByteRange { start: 20, end: 29 },
            ])
        );
    }

    #[test]
    fn test_not_satisfiable() {
        assert_eq!(
            parse_range_header(Some("bytes=200-"), 100),
            RangeParseResult::Unsatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=-0"), 100),
            RangeParseResult::Unsatisfiable
        );
    }

    #[test]
    fn test_invalid_format() {
        assert_eq!(parse_range_header(Some("bytes=a-b"), 100), RangeParseResult::Ignored);
        assert_eq!(parse_range_header(Some("items=0-9"), 100), RangeParseResult::Ignored);
        assert_eq!(parse_range_header(Some("bytes=9-0"), 100), RangeParseResult::Ignored);
        assert_eq!(parse_range_header(Some("bytes=5"), 100), RangeParseResult::Ignored);
    }

    #[test]
    fn test_content_range() {
        assert_eq!(
            ByteRange { start: 0, end: 9 }.content_range(100),
            "bytes 0-9/100"
        );
    }
}
