//! Path templates and their compiled matchers.
//!
//! # Responsibilities
//! - Normalize declared paths (collapse slashes, join group prefixes)
//! - Compile a template plus constraints into an anchored regex
//! - Extract named parameters from a matched path
//!
//! # Design Decisions
//! - Only a segment that is exactly `{name}` is a parameter; anything else
//!   is escaped and matched literally
//! - Compilation happens once, at registration or cache load
//! - A trailing slash is always optional

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Constraint used when a parameter has none: one or more non-slash characters.
pub const DEFAULT_CONSTRAINT: &str = "[^/]+";

/// Join path fragments into one normalized path.
///
/// Every fragment is split on `/`, empty segments are dropped and the rest is
/// re-joined under a single leading slash. No fragments (or only slashes)
/// yields `/`.
pub fn normalize_path<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let segments: Vec<&str> = fragments
        .into_iter()
        .flat_map(|fragment| fragment.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Returns the parameter name if `segment` is a `{name}` placeholder.
fn placeholder_name(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix('{')?.strip_suffix('}')?;
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(name)
    } else {
        None
    }
}

/// Names of every `{placeholder}` token anywhere in a template, in order.
///
/// Used for URL generation, which substitutes tokens textually.
pub fn template_placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open..];
        match after.find('}') {
            Some(close) => {
                if let Some(name) = placeholder_name(&after[..=close]) {
                    names.push(name);
                }
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    names
}

/// A route matcher compiled from a normalized path and its constraints.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
}

impl CompiledPattern {
    /// Build the regex source for `path`.
    ///
    /// `/users/{id}` with `id: \d+` becomes `^/users/(?P<id>\d+)/?$`.
    pub fn source_for(path: &str, constraints: &BTreeMap<String, String>) -> String {
        let parts: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match placeholder_name(segment) {
                Some(name) => {
                    let constraint = constraints
                        .get(name)
                        .map(String::as_str)
                        .unwrap_or(DEFAULT_CONSTRAINT);
                    format!("(?P<{}>{})", name, constraint)
                }
                None => regex::escape(segment),
            })
            .collect();
        format!("^/{}/?$", parts.join("/"))
    }

    /// Compile a normalized path.
    pub fn compile(path: &str, constraints: &BTreeMap<String, String>) -> Result<Self, regex::Error> {
        Self::from_source(&Self::source_for(path, constraints))
    }

    /// Compile an already-built regex source (as stored in the route cache).
    pub fn from_source(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(source)?,
        })
    }

    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and return its named captures in declaration order.
    ///
    /// Unnamed groups inside constraint fragments are ignored. A named group
    /// that did not participate in the match is skipped.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;
        let params = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.to_string(), ParamValue::coerce(m.as_str())))
            })
            .collect();
        Some(Params(params))
    }
}

/// A single extracted path parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Str(String),
}

impl ParamValue {
    /// All-digit text becomes an integer; everything else stays a string.
    ///
    /// Digit strings too large for `i64` are kept as strings.
    pub fn coerce(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = raw.parse::<i64>() {
                return ParamValue::Int(n);
            }
        }
        ParamValue::Str(raw.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(n) => Some(*n),
            ParamValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Int(_) => None,
            ParamValue::Str(s) => Some(s),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Int(n)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

/// Named parameters extracted from a match, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, ParamValue)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Values only, in declaration order. This is what handlers receive.
    pub fn values(&self) -> Vec<ParamValue> {
        self.0.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(&str, ParamValue); N]> for Params {
    fn from(pairs: [(&str, ParamValue); N]) -> Self {
        Params(pairs.into_iter().map(|(n, v)| (n.to_string(), v)).collect())
    }
}
