//! Route template compilation
//!
//! A template is tokenized into a small AST (literal text, named parameters,
//! wildcards), validated, classified and compiled into one of three matchers:
//! a literal comparison, a regex, or match-everything for root mounts.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Characters that force a template through regex conversion
const CONVERSION_CHARS: &[char] = &['*', '?', '+', '(', ')', ':', '{', '}', '[', ']'];

/// Characters that disqualify a template from the exact-match table.
/// `:` is intentionally absent, see [`is_optimizable`].
const NON_OPTIMIZABLE_CHARS: &[char] = &['*', '?', '+', '(', ')', '{', '}', '[', ']'];

/// Catch-all template, never optimizable
const MATCH_ALL: &str = "/*";

/// Default capture for a parameter without a sub-pattern
const SEGMENT_PATTERN: &str = "[^/]+";

/// Group name holding the consumed prefix in prefix mode
const PREFIX_GROUP: &str = "m";

/// Errors raised while compiling a route template
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("duplicate parameter name '{name}' in route '{pattern}'")]
    DuplicateParam { pattern: String, name: String },
    #[error("unbalanced parenthesis in route '{0}'")]
    UnbalancedGroup(String),
    #[error("invalid route expression for '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Raw route source as registered by the application
#[derive(Debug, Clone)]
pub enum PatternSource {
    /// Path template such as `/user/:id`
    Template(String),
    /// Precompiled expression, used as-is
    Regex(Regex),
}

impl From<&str> for PatternSource {
    fn from(value: &str) -> Self {
        Self::Template(value.to_string())
    }
}

impl From<String> for PatternSource {
    fn from(value: String) -> Self {
        Self::Template(value)
    }
}

impl From<Regex> for PatternSource {
    fn from(value: Regex) -> Self {
        Self::Regex(value)
    }
}

impl fmt::Display for PatternSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(t) => f.write_str(t),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Where a compiled route is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Eligible for the exact-match table
    Static,
    /// Matched by scanning
    Dynamic,
}

/// Template AST node
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param {
        name: String,
        pattern: Option<String>,
    },
    Wildcard,
}

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    Regex(Regex),
    Any,
}

/// Capture group feeding one parameter
#[derive(Debug, Clone)]
enum Group {
    Named(String),
    Index(usize),
}

#[derive(Debug, Clone)]
struct CaptureKey {
    key: String,
    group: Group,
}

/// Compiled route template
///
/// Built once at registration and immutable afterwards.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: PatternSource,
    is_prefix: bool,
    classification: Classification,
    matcher: Matcher,
    param_names: Vec<String>,
    keys: Vec<CaptureKey>,
}

/// Successful match of a path against a [`RoutePattern`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch<'a> {
    /// Portion of the path consumed by the pattern
    pub matched: &'a str,
    /// Raw (still percent-encoded) captures in declaration order
    pub captures: Vec<(&'a str, &'a str)>,
}

/// Returns true if the template text needs regex conversion
pub fn needs_conversion(source: &PatternSource) -> bool {
    match source {
        PatternSource::Template(t) => t.contains(CONVERSION_CHARS),
        PatternSource::Regex(_) => false,
    }
}

/// Returns true if the template may be served from the exact-match table
///
/// Unlike [`needs_conversion`] this does not look at `:`, so `/user/:id`
/// counts as optimizable. Callers rely on that.
pub fn is_optimizable(source: &PatternSource) -> bool {
    match source {
        PatternSource::Template(t) => t != MATCH_ALL && !t.contains(NON_OPTIMIZABLE_CHARS),
        PatternSource::Regex(_) => false,
    }
}

impl RoutePattern {
    /// Compile a route source
    ///
    /// # Arguments
    /// * `pattern` - Template string or precompiled regex
    /// * `is_prefix` - Match the template as a path prefix (mounts)
    pub fn compile(
        pattern: impl Into<PatternSource>,
        is_prefix: bool,
    ) -> Result<Self, PatternError> {
        match pattern.into() {
            PatternSource::Regex(re) => Ok(Self::from_regex(re, is_prefix)),
            PatternSource::Template(template) => {
                let source = PatternSource::Template(template.clone());
                let classification = if is_optimizable(&source) {
                    Classification::Static
                } else {
                    Classification::Dynamic
                };

                if is_prefix && template.is_empty() {
                    return Ok(Self {
                        source,
                        is_prefix,
                        classification,
                        matcher: Matcher::Any,
                        param_names: Vec::new(),
                        keys: Vec::new(),
                    });
                }

                if !needs_conversion(&source) {
                    return Ok(Self {
                        source,
                        is_prefix,
                        classification,
                        matcher: Matcher::Literal(template),
                        param_names: Vec::new(),
                        keys: Vec::new(),
                    });
                }

                Self::compile_regex(source, &template, is_prefix, classification)
            }
        }
    }

    /// Compile a template through the regex path regardless of its content
    pub fn compile_dynamic(template: &str, is_prefix: bool) -> Result<Self, PatternError> {
        let source = PatternSource::Template(template.to_string());
        Self::compile_regex(source, template, is_prefix, Classification::Dynamic)
    }

    fn compile_regex(
        source: PatternSource,
        template: &str,
        is_prefix: bool,
        classification: Classification,
    ) -> Result<Self, PatternError> {
        let tokens = tokenize(template)?;
        let param_names = param_names(&tokens);
        check_unique(template, &param_names)?;

        let expr = build_expression(&tokens, is_prefix);
        let regex = Regex::new(&expr).map_err(|source| PatternError::InvalidRegex {
            pattern: template.to_string(),
            source,
        })?;

        let keys = param_names
            .iter()
            .enumerate()
            .map(|(i, name)| CaptureKey {
                key: name.clone(),
                group: Group::Named(format!("p{i}")),
            })
            .collect();

        Ok(Self {
            source,
            is_prefix,
            classification,
            matcher: Matcher::Regex(regex),
            param_names,
            keys,
        })
    }

    fn from_regex(regex: Regex, is_prefix: bool) -> Self {
        let keys = (1..regex.captures_len())
            .map(|i| CaptureKey {
                key: (i - 1).to_string(),
                group: Group::Index(i),
            })
            .collect();
        Self {
            source: PatternSource::Regex(regex.clone()),
            is_prefix,
            classification: Classification::Dynamic,
            matcher: Matcher::Regex(regex),
            param_names: Vec::new(),
            keys,
        }
    }

    /// Attach names to the positional captures of a precompiled expression
    ///
    /// Captures beyond the supplied names keep their positional key.
    /// Template-sourced patterns already carry their names and are returned as-is.
    pub fn with_param_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self, PatternError> {
        if !matches!(self.source, PatternSource::Regex(_)) {
            return Ok(self);
        }
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        check_unique(&self.source.to_string(), &names)?;

        for (key, name) in self.keys.iter_mut().zip(&names) {
            key.key.clone_from(name);
        }
        self.param_names = names;
        Ok(self)
    }

    pub const fn source(&self) -> &PatternSource {
        &self.source
    }

    pub const fn is_prefix(&self) -> bool {
        self.is_prefix
    }

    pub const fn classification(&self) -> Classification {
        self.classification
    }

    /// Parameter names in declaration order
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Literal text when the matcher is a plain string comparison
    pub fn literal(&self) -> Option<&str> {
        match &self.matcher {
            Matcher::Literal(text) => Some(text),
            _ => None,
        }
    }

    /// Returns true if the path matches
    pub fn is_match(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Match a path and collect raw captures
    pub fn captures<'a>(&'a self, path: &'a str) -> Option<PatternMatch<'a>> {
        match &self.matcher {
            Matcher::Any => Some(PatternMatch {
                matched: "",
                captures: Vec::new(),
            }),
            Matcher::Literal(text) => {
                let rest = path.strip_prefix(text.as_str())?;
                let accepted = if self.is_prefix {
                    rest.is_empty() || rest.starts_with('/')
                } else {
                    rest.is_empty()
                };
                accepted.then(|| PatternMatch {
                    matched: &path[..text.len()],
                    captures: Vec::new(),
                })
            }
            Matcher::Regex(regex) => {
                let caps = regex.captures(path)?;
                let matched = caps
                    .name(PREFIX_GROUP)
                    .filter(|_| matches!(self.source, PatternSource::Template(_)))
                    .or_else(|| caps.get(0))
                    .map_or("", |m| m.as_str());

                let captures = self
                    .keys
                    .iter()
                    .filter_map(|key| {
                        let value = match &key.group {
                            Group::Named(group) => caps.name(group),
                            Group::Index(i) => caps.get(*i),
                        }?;
                        Some((key.key.as_str(), value.as_str()))
                    })
                    .collect();

                Some(PatternMatch { matched, captures })
            }
        }
    }
}

/// Split a template into AST tokens
fn tokenize(template: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                flush_literal(&mut literal, &mut tokens);
                tokens.push(Token::Wildcard);
            }
            ':' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if !(next.is_ascii_alphanumeric() || next == '_') {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                if name.is_empty() {
                    literal.push(':');
                    continue;
                }

                let pattern = if chars.peek() == Some(&'(') {
                    chars.next();
                    Some(read_group(&mut chars, template)?)
                } else {
                    None
                };
                flush_literal(&mut literal, &mut tokens);
                tokens.push(Token::Param { name, pattern });
            }
            _ => literal.push(c),
        }
    }

    flush_literal(&mut literal, &mut tokens);
    Ok(tokens)
}

/// Read a parenthesized sub-pattern; the opening `(` is already consumed
fn read_group(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    template: &str,
) -> Result<String, PatternError> {
    let mut depth = 1usize;
    let mut group = String::new();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                group.push(c);
                if let Some(escaped) = chars.next() {
                    group.push(escaped);
                }
            }
            '(' => {
                depth += 1;
                group.push(c);
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(group);
                }
                group.push(c);
            }
            _ => group.push(c),
        }
    }

    Err(PatternError::UnbalancedGroup(template.to_string()))
}

fn flush_literal(literal: &mut String, tokens: &mut Vec<Token>) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}

/// Public keys for each capture; wildcards are numbered in order of appearance
fn param_names(tokens: &[Token]) -> Vec<String> {
    let mut wildcards = 0usize;
    tokens
        .iter()
        .filter_map(|token| match token {
            Token::Literal(_) => None,
            Token::Param { name, .. } => Some(name.clone()),
            Token::Wildcard => {
                wildcards += 1;
                Some((wildcards - 1).to_string())
            }
        })
        .collect()
}

fn check_unique(pattern: &str, names: &[String]) -> Result<(), PatternError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(PatternError::DuplicateParam {
                pattern: pattern.to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

fn build_expression(tokens: &[Token], is_prefix: bool) -> String {
    let mut expr = String::from("^");
    if is_prefix {
        expr.push_str(&format!("(?P<{PREFIX_GROUP}>"));
    }

    let mut group = 0usize;
    for token in tokens {
        match token {
            Token::Literal(text) => push_literal(&mut expr, text),
            Token::Param { pattern, .. } => {
                let inner = pattern.as_deref().unwrap_or(SEGMENT_PATTERN);
                expr.push_str(&format!("(?P<p{group}>{inner})"));
                group += 1;
            }
            Token::Wildcard => {
                expr.push_str(&format!("(?P<p{group}>.*)"));
                group += 1;
            }
        }
    }

    if is_prefix {
        expr.push_str(")(?:/|$)");
    } else {
        expr.push('$');
    }
    expr
}

/// Append literal template text, keeping route regex syntax live
///
/// `? + ( ) { } [ ]` pass through as regex, as does `|` inside a group.
/// `.`, `-` and any other regex metacharacter match themselves.
fn push_literal(expr: &mut String, text: &str) {
    let mut buf = [0u8; 4];
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if CONVERSION_CHARS.contains(&c) || (c == '|' && depth > 0) {
            expr.push(c);
        } else {
            expr.push_str(&regex::escape(c.encode_utf8(&mut buf)));
        }
    }
}
