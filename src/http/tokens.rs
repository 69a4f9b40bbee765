//! Comma-separated header value handling
//!
//! Shared by `If-Match`, `If-None-Match`, `X-Forwarded-For` and `Vary`.

/// Split a header value into tokens
///
/// Leading and trailing spaces around each token are dropped, spaces inside
/// a token are kept, and empty tokens are skipped. Source order is preserved.
///
/// # Examples
/// ```
/// use waymark::http::tokens::parse_token_list;
///
/// assert_eq!(parse_token_list(" \"a\" ,, \"b\""), vec!["\"a\"", "\"b\""]);
/// ```
pub fn parse_token_list(value: &str) -> Vec<&str> {
    let mut list = Vec::new();
    let mut start = 0;
    let mut end = 0;

    for (i, byte) in value.bytes().enumerate() {
        match byte {
            b' ' => {
                if start == end {
                    start = i + 1;
                    end = i + 1;
                }
            }
            b',' => {
                if start != end {
                    list.push(&value[start..end]);
                }
                start = i + 1;
                end = i + 1;
            }
            _ => end = i + 1,
        }
    }

    if start != end {
        list.push(&value[start..end]);
    }
    list
}

/// Append a field name to a `Vary` header value
///
/// Names are compared case-insensitively and `*` absorbs everything.
pub fn append_vary(header: Option<&str>, field: &str) -> String {
    let current = header.unwrap_or_default();
    let existing = parse_token_list(current);

    if existing.contains(&"*") {
        return "*".to_string();
    }

    let mut value = current.trim().to_string();
    for name in parse_token_list(field) {
        if name == "*" {
            return "*".to_string();
        }
        let present = parse_token_list(&value)
            .iter()
            .any(|v| v.eq_ignore_ascii_case(name));
        if present {
            continue;
        }
        if value.is_empty() {
            value = name.to_string();
        } else {
            value = format!("{value}, {name}");
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_token_list_basic() {
        assert_eq!(parse_token_list("a, b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_token_list_spaces_and_empties() {
        assert_eq!(parse_token_list("  a  ,  , b  "), vec!["a", "b"]);
        assert_eq!(parse_token_list(",,,"), Vec::<&str>::new());
        assert_eq!(parse_token_list(""), Vec::<&str>::new());
    }

    #[test]
    fn test_token_list_keeps_inner_spaces() {
        assert_eq!(parse_token_list("a b , c"), vec!["a b", "c"]);
    }

    #[test]
    fn test_token_list_etags() {
        assert_eq!(
            parse_token_list("\"xyz\", W/\"abc\""),
            vec!["\"xyz\"", "W/\"abc\""]
        );
    }

    #[test]
    fn test_append_vary() {
        assert_eq!(append_vary(None, "Accept"), "Accept");
        assert_eq!(append_vary(Some("Accept"), "accept"), "Accept");
        assert_eq!(
            append_vary(Some("Accept"), "Origin, Accept-Encoding"),
            "Accept, Origin, Accept-Encoding"
        );
        assert_eq!(append_vary(Some("*"), "Origin"), "*");
        assert_eq!(append_vary(Some("Origin"), "*"), "*");
    }
}
