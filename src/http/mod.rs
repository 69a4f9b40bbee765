//! HTTP protocol layer module
//!
//! Header-level request semantics, decoupled from any listener:
//! entity tags and conditional requests, ranges, HTTP dates, token lists,
//! and the response builders that act on their verdicts.

pub mod cache;
pub mod date;
pub mod range;
pub mod response;
pub mod send;
pub mod tokens;

// Re-export commonly used types
pub use cache::{
    evaluate, generate_etag, is_fresh, is_precondition_failure, is_range_fresh,
    ConditionalVerdict, EntityTag, FileFingerprint, ResourceValidators, Validators,
};
pub use range::{parse_range_header, ByteRange, RangeParseResult};
pub use response::EntityHeaders;
pub use send::respond;
pub use tokens::{append_vary, parse_token_list};
