//! Proxy trust module
//!
//! Compiles the proxy-trust setting into a hop predicate and resolves the
//! client address from a forwarded-address chain.

pub mod forwarded;
pub mod ip_range;
pub mod trust;

pub use forwarded::{all_addrs, client_addr, forwarded_chain};
pub use ip_range::{IpRange, RangeError};
pub use trust::{compile, TrustConfig, TrustPredicate};
