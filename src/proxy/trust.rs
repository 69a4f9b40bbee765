//! Proxy trust compilation
//!
//! The trust setting accepts several shapes (flag, hop count, address list,
//! custom predicate). It is compiled once at startup into a [`TrustPredicate`]
//! that every request shares read-only.

use super::ip_range::IpRange;
use crate::logger;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

type TrustFn = dyn Fn(&str, usize) -> bool + Send + Sync;

/// Proxy trust configuration, one variant per accepted shape
#[derive(Clone, Default)]
pub enum TrustConfig {
    /// `true` trusts every hop, `false` none
    Flag(bool),
    /// Trust the first N hops
    Hops(usize),
    /// Comma-separated addresses, ranges or aliases
    Addresses(String),
    /// Addresses, ranges or aliases
    List(Vec<String>),
    /// Caller-supplied predicate, used unchanged
    Predicate(TrustPredicate),
    /// Nothing configured
    #[default]
    Unset,
}

impl fmt::Debug for TrustConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
            Self::Hops(n) => f.debug_tuple("Hops").field(n).finish(),
            Self::Addresses(s) => f.debug_tuple("Addresses").field(s).finish(),
            Self::List(list) => f.debug_tuple("List").field(list).finish(),
            Self::Predicate(p) => f.debug_tuple("Predicate").field(p).finish(),
            Self::Unset => f.write_str("Unset"),
        }
    }
}

#[derive(Clone)]
enum Rule {
    All,
    Nobody,
    Hops(usize),
    Ranges(Arc<[IpRange]>),
    Custom(Arc<TrustFn>),
}

/// Decides whether the hop at `hop_index` with address `addr` is a trusted proxy
#[derive(Clone)]
pub struct TrustPredicate {
    rule: Rule,
}

impl TrustPredicate {
    /// Wrap a custom predicate
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str, usize) -> bool + Send + Sync + 'static,
    {
        Self {
            rule: Rule::Custom(Arc::new(f)),
        }
    }

    pub const fn trust_all() -> Self {
        Self { rule: Rule::All }
    }

    pub const fn trust_nobody() -> Self {
        Self { rule: Rule::Nobody }
    }

    /// Returns true if the hop is trusted
    pub fn trusts(&self, addr: &str, hop_index: usize) -> bool {
        match &self.rule {
            Rule::All => true,
            Rule::Nobody => false,
            Rule::Hops(n) => hop_index < *n,
            Rule::Ranges(ranges) => addr
                .parse::<IpAddr>()
                .is_ok_and(|ip| ranges.iter().any(|range| range.contains(ip))),
            Rule::Custom(f) => f(addr, hop_index),
        }
    }
}

impl fmt::Debug for TrustPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Rule::All => f.write_str("TrustPredicate(all)"),
            Rule::Nobody => f.write_str("TrustPredicate(nobody)"),
            Rule::Hops(n) => write!(f, "TrustPredicate(hops < {n})"),
            Rule::Ranges(ranges) => write!(f, "TrustPredicate({} ranges)", ranges.len()),
            Rule::Custom(_) => f.write_str("TrustPredicate(custom)"),
        }
    }
}

/// Compile a trust configuration into a predicate
///
/// Never fails: entries that are not valid addresses, ranges or aliases are
/// logged and skipped, and every falsy shape trusts nobody.
pub fn compile(config: TrustConfig) -> TrustPredicate {
    match config {
        TrustConfig::Predicate(predicate) => predicate,
        TrustConfig::Flag(true) => TrustPredicate::trust_all(),
        TrustConfig::Hops(n) if n > 0 => TrustPredicate {
            rule: Rule::Hops(n),
        },
        TrustConfig::Addresses(list) if !list.trim().is_empty() => {
            compile_list(list.split(',').map(str::trim))
        }
        TrustConfig::List(list) if !list.is_empty() => compile_list(list.iter().map(|s| s.trim())),
        TrustConfig::Flag(false)
        | TrustConfig::Hops(_)
        | TrustConfig::Addresses(_)
        | TrustConfig::List(_)
        | TrustConfig::Unset => TrustPredicate::trust_nobody(),
    }
}

fn compile_list<'a>(entries: impl Iterator<Item = &'a str>) -> TrustPredicate {
    let mut ranges = Vec::new();
    for entry in entries {
        match IpRange::parse_entry(entry) {
            Ok(parsed) => ranges.extend(parsed),
            Err(err) => logger::log_trust_entry_ignored(entry, &err),
        }
    }

    if ranges.is_empty() {
        return TrustPredicate::trust_nobody();
    }
    TrustPredicate {
        rule: Rule::Ranges(ranges.into()),
    }
}
