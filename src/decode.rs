//! Percent-decoding shared by path parameters and query strings

use std::borrow::Cow;
use thiserror::Error;

/// Captured path value could not be decoded
///
/// The router turns this into a 400 response without running a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathDecodeError {
    #[error("malformed percent-encoding in '{0}'")]
    MalformedEscape(String),
    #[error("percent-decoded value of '{0}' is not valid UTF-8")]
    InvalidUtf8(String),
}

/// Decode a URI component strictly
///
/// Every `%` must be followed by two hex digits and the decoded bytes must
/// form valid UTF-8. Values without `%` are borrowed as-is.
pub fn decode_component(raw: &str) -> Result<Cow<'_, str>, PathDecodeError> {
    if !raw.contains('%') {
        return Ok(Cow::Borrowed(raw));
    }
    if !has_valid_escapes(raw) {
        return Err(PathDecodeError::MalformedEscape(raw.to_string()));
    }
    urlencoding::decode(raw).map_err(|_| PathDecodeError::InvalidUtf8(raw.to_string()))
}

/// Decode a form-encoded component leniently
///
/// `+` becomes a space; if the escapes are malformed the space-substituted
/// raw text is returned unchanged.
pub fn decode_form_component(raw: &str) -> String {
    let spaced = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    let decoded = decode_component(&spaced).map(Cow::into_owned);
    decoded.unwrap_or_else(|_| spaced.into_owned())
}

fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3);
            if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_is_borrowed() {
        assert!(matches!(decode_component("abc"), Ok(Cow::Borrowed("abc"))));
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode_component("a%20b").unwrap(), "a b");
        assert_eq!(decode_component("caf%C3%A9").unwrap(), "café");
    }

    #[test]
    fn test_decode_malformed() {
        assert_eq!(
            decode_component("%zz"),
            Err(PathDecodeError::MalformedEscape("%zz".to_string()))
        );
        assert!(matches!(
            decode_component("abc%2"),
            Err(PathDecodeError::MalformedEscape(_))
        ));
        assert!(matches!(
            decode_component("%FF"),
            Err(PathDecodeError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_decode_form_component() {
        assert_eq!(decode_form_component("a+b%21"), "a b!");
        assert_eq!(decode_form_component("100%"), "100%");
        assert_eq!(decode_form_component("x+%zz"), "x %zz");
    }
}
