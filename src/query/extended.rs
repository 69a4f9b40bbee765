//! Nested query parsing with bracket and dot notation
//!
//! Pairs with the same raw key are combined first, then each key is split
//! into a segment chain (`a[b][0]` -> `a`, `[b]`, `[0]`), the chain is folded
//! into a single-path tree and the trees are merged into the result.
//! Array indices are kept sparse until the end and compacted in index order.

use super::value::{ParsedQuery, QueryValue};
use super::{split_pairs, LimitPolicy, QueryError, QueryOptions};
use crate::decode::decode_form_component;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

enum Node {
    Leaf(String),
    Array(BTreeMap<usize, Node>),
    Object(BTreeMap<String, Node>),
}

/// Parse a query string into nested values
pub fn parse_nested(raw: &str, options: &QueryOptions) -> Result<ParsedQuery, QueryError> {
    let mut pairs: Vec<(String, Vec<String>)> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (key, value) in split_pairs(raw, options)? {
        let key = decode_form_component(key);
        if key.is_empty() {
            continue;
        }
        let value = decode_form_component(value);
        match seen.get(&key) {
            Some(&i) => pairs[i].1.push(value),
            None => {
                seen.insert(key.clone(), pairs.len());
                pairs.push((key, vec![value]));
            }
        }
    }

    let mut root = BTreeMap::new();
    for (key, values) in pairs {
        let chain = split_key(&key, options)?;
        let tree = fold_chain(&chain, leaf_node(values), options)?;
        merge_into_object(&mut root, tree);
    }

    Ok(root
        .into_iter()
        .map(|(key, node)| (key, into_value(node)))
        .collect())
}

fn leaf_node(mut values: Vec<String>) -> Node {
    if values.len() == 1 {
        if let Some(value) = values.pop() {
            return Node::Leaf(value);
        }
    }
    Node::Array(values.into_iter().map(Node::Leaf).enumerate().collect())
}

/// Split a key into its parent and bracket segments, honoring `depth`
fn split_key(key: &str, options: &QueryOptions) -> Result<Vec<String>, QueryError> {
    let key = if options.allow_dots {
        dots_to_brackets(key)
    } else {
        Cow::Borrowed(key)
    };
    let segments = bracket_segments(&key);

    if options.strict && has_unterminated_bracket(&key, &segments) {
        return Err(QueryError::Malformed {
            key: key.into_owned(),
        });
    }
    if options.depth == 0 {
        return Ok(vec![key.into_owned()]);
    }

    let parent_end = segments.first().map_or(key.len(), |s| s.start);
    let mut chain = Vec::with_capacity(segments.len() + 1);
    if parent_end > 0 {
        chain.push(key[..parent_end].to_string());
    }
    chain.extend(
        segments
            .iter()
            .take(options.depth)
            .map(|s| key[s.clone()].to_string()),
    );

    if let Some(rest) = segments.get(options.depth) {
        if options.on_limit == LimitPolicy::Reject {
            return Err(QueryError::DepthExceeded {
                depth: options.depth,
            });
        }
        chain.push(format!("[{}]", &key[rest.start..]));
    }
    Ok(chain)
}

/// `a.b.c` -> `a[b][c]`; a dot followed by `.`, `[` or nothing is kept
fn dots_to_brackets(key: &str) -> Cow<'_, str> {
    if !key.contains('.') {
        return Cow::Borrowed(key);
    }

    let mut out = String::with_capacity(key.len() + 4);
    let mut rest = key;
    while let Some(dot) = rest.find('.') {
        out.push_str(&rest[..dot]);
        let after = &rest[dot + 1..];
        let run = after.find(|c: char| c == '.' || c == '[').unwrap_or(after.len());
        if run == 0 {
            out.push('.');
        } else {
            out.push('[');
            out.push_str(&after[..run]);
            out.push(']');
        }
        rest = &after[run..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Byte ranges of every `[...]` segment without nested `[`
fn bracket_segments(key: &str) -> Vec<Range<usize>> {
    let bytes = key.as_bytes();
    let mut segments = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'[' {
            let close = bytes[i + 1..]
                .iter()
                .position(|&b| b == b'[' || b == b']')
                .map(|off| i + 1 + off);
            if let Some(end) = close.filter(|&end| bytes[end] == b']') {
                segments.push(i..end + 1);
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }
    segments
}

fn has_unterminated_bracket(key: &str, segments: &[Range<usize>]) -> bool {
    key.bytes()
        .enumerate()
        .any(|(i, b)| b == b'[' && !segments.iter().any(|s| s.start == i))
}

/// Fold a segment chain, innermost first, into a single-path tree
fn fold_chain(chain: &[String], leaf: Node, options: &QueryOptions) -> Result<Node, QueryError> {
    let mut node = leaf;
    for segment in chain.iter().rev() {
        node = if segment == "[]" {
            match node {
                Node::Array(items) => Node::Array(items),
                other => Node::Array(BTreeMap::from([(0, other)])),
            }
        } else {
            let inner = segment
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'));
            match inner.and_then(array_index) {
                Some(index) if index <= options.array_limit => {
                    Node::Array(BTreeMap::from([(index, node)]))
                }
                Some(_) if options.on_limit == LimitPolicy::Reject => {
                    return Err(QueryError::ArrayLimitExceeded {
                        limit: options.array_limit,
                    });
                }
                _ => {
                    let name = inner.unwrap_or(segment.as_str());
                    Node::Object(BTreeMap::from([(name.to_string(), node)]))
                }
            }
        };
    }
    Ok(node)
}

/// Canonical non-negative decimal index (`"01"` and `"+1"` are names)
fn array_index(segment: &str) -> Option<usize> {
    let index: usize = segment.parse().ok()?;
    (index.to_string() == segment).then_some(index)
}

fn merge(target: Node, source: Node) -> Node {
    match (target, source) {
        (Node::Object(mut entries), source) => {
            merge_into_object(&mut entries, source);
            Node::Object(entries)
        }
        (Node::Array(mut items), Node::Leaf(value)) => {
            push(&mut items, Node::Leaf(value));
            Node::Array(items)
        }
        (Node::Array(mut items), Node::Array(incoming)) => {
            for (index, item) in incoming {
                match items.remove(&index) {
                    None => {
                        items.insert(index, item);
                    }
                    Some(existing @ (Node::Array(_) | Node::Object(_)))
                        if !matches!(item, Node::Leaf(_)) =>
                    {
                        items.insert(index, merge(existing, item));
                    }
                    Some(existing) => {
                        items.insert(index, existing);
                        push(&mut items, item);
                    }
                }
            }
            Node::Array(items)
        }
        (Node::Array(items), source @ Node::Object(_)) => {
            let mut entries: BTreeMap<String, Node> = items
                .into_iter()
                .map(|(index, item)| (index.to_string(), item))
                .collect();
            merge_into_object(&mut entries, source);
            Node::Object(entries)
        }
        (Node::Leaf(value), Node::Array(items)) => {
            let mut merged = BTreeMap::from([(0, Node::Leaf(value))]);
            merged.extend(items.into_iter().map(|(index, item)| (index + 1, item)));
            Node::Array(merged)
        }
        (Node::Leaf(value), source) => {
            Node::Array(BTreeMap::from([(0, Node::Leaf(value)), (1, source)]))
        }
    }
}

fn merge_into_object(entries: &mut BTreeMap<String, Node>, source: Node) {
    match source {
        // a bare key next to nested ones becomes a flag member
        Node::Leaf(key) => {
            entries.insert(key, Node::Leaf("true".to_string()));
        }
        Node::Array(items) => {
            for (index, item) in items {
                merge_entry(entries, index.to_string(), item);
            }
        }
        Node::Object(incoming) => {
            for (key, value) in incoming {
                merge_entry(entries, key, value);
            }
        }
    }
}

fn merge_entry(entries: &mut BTreeMap<String, Node>, key: String, value: Node) {
    let merged = match entries.remove(&key) {
        Some(existing) => merge(existing, value),
        None => value,
    };
    entries.insert(key, merged);
}

fn push(items: &mut BTreeMap<usize, Node>, item: Node) {
    let next = items.keys().next_back().map_or(0, |last| last + 1);
    items.insert(next, item);
}

fn into_value(node: Node) -> QueryValue {
    match node {
        Node::Leaf(value) => QueryValue::String(value),
        Node::Array(items) => QueryValue::Array(items.into_values().map(into_value).collect()),
        Node::Object(entries) => QueryValue::Object(
            entries
                .into_iter()
                .map(|(key, node)| (key, into_value(node)))
                .collect(),
        ),
    }
}
