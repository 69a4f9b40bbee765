//! Forwarded-address resolution
//!
//! The chain starts with the socket peer (hop 0) followed by
//! `X-Forwarded-For` entries from nearest to farthest. It is walked until the
//! first untrusted hop; the last address kept is the client.

use super::trust::TrustPredicate;
use crate::http::tokens::parse_token_list;

/// Build the address chain, nearest first
pub fn forwarded_chain(socket_addr: &str, x_forwarded_for: Option<&str>) -> Vec<String> {
    let mut chain = vec![socket_addr.to_string()];
    if let Some(header) = x_forwarded_for {
        chain.extend(parse_token_list(header).into_iter().rev().map(String::from));
    }
    chain
}

/// Addresses up to and including the first untrusted hop
pub fn all_addrs(
    socket_addr: &str,
    x_forwarded_for: Option<&str>,
    trust: &TrustPredicate,
) -> Vec<String> {
    let mut chain = forwarded_chain(socket_addr, x_forwarded_for);
    let untrusted = (0..chain.len().saturating_sub(1)).find(|&i| !trust.trusts(&chain[i], i));
    if let Some(i) = untrusted {
        chain.truncate(i + 1);
    }
    chain
}

/// Resolve the client address
pub fn client_addr(
    socket_addr: &str,
    x_forwarded_for: Option<&str>,
    trust: &TrustPredicate,
) -> String {
    all_addrs(socket_addr, x_forwarded_for, trust)
        .pop()
        .unwrap_or_else(|| socket_addr.to_string())
}
