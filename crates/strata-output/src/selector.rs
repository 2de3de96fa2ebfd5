//! Label selectors
//!
//! Equality and set based requirements joined by commas:
//! `app`, `!legacy`, `tier=web`, `tier==web`, `env!=prod`,
//! `env in (dev, test)`, `env notin (prod)`. An empty selector matches
//! everything.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

static SET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<key>[^\s!=()]+)\s+(?P<op>in|notin)\s*\((?P<values>[^()]*)\)$")
        .expect("valid regex")
});

static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]([-A-Za-z0-9_./]*[A-Za-z0-9])?$").expect("valid regex"));

/// Selector parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// A requirement between commas is empty
    #[error("empty requirement in selector '{0}'")]
    EmptyRequirement(String),

    /// Label key is malformed
    #[error("invalid label key '{0}'")]
    InvalidKey(String),

    /// Value set is not closed or otherwise malformed
    #[error("invalid value set in '{0}'")]
    InvalidSet(String),
}

/// One selector requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Label is present
    Exists(String),
    /// Label is absent
    NotExists(String),
    /// Label equals the value
    Equals(String, String),
    /// Label is absent or differs from the value
    NotEquals(String, String),
    /// Label is present with one of the values
    In(String, Vec<String>),
    /// Label is absent or has none of the values
    NotIn(String, Vec<String>),
}

impl Requirement {
    /// Evaluate against a label set
    #[must_use]
    pub fn matches(&self, labels: &IndexMap<String, String>) -> bool {
        match self {
            Self::Exists(key) => labels.contains_key(key),
            Self::NotExists(key) => !labels.contains_key(key),
            Self::Equals(key, value) => labels.get(key) == Some(value),
            Self::NotEquals(key, value) => labels.get(key) != Some(value),
            Self::In(key, values) => labels.get(key).is_some_and(|v| values.contains(v)),
            Self::NotIn(key, values) => !labels.get(key).is_some_and(|v| values.contains(v)),
        }
    }
}

/// Conjunction of requirements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    /// Parse a selector string
    ///
    /// # Errors
    /// `SelectorError` describing the first malformed requirement
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Ok(Self::default());
        }
        let requirements = split_requirements(selector)
            .into_iter()
            .map(|term| parse_requirement(selector, term))
            .collect::<Result<_, _>>()?;
        Ok(Self { requirements })
    }

    /// Requirements in source order
    #[inline]
    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Check if every requirement holds
    #[must_use]
    pub fn matches(&self, labels: &IndexMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl FromStr for LabelSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split on commas outside parentheses
fn split_requirements(selector: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in selector.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                terms.push(&selector[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    terms.push(&selector[start..]);
    terms
}

fn key(text: &str) -> Result<String, SelectorError> {
    let text = text.trim();
    if KEY_RE.is_match(text) {
        Ok(text.to_string())
    } else {
        Err(SelectorError::InvalidKey(text.to_string()))
    }
}

fn parse_requirement(selector: &str, term: &str) -> Result<Requirement, SelectorError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(SelectorError::EmptyRequirement(selector.to_string()));
    }

    if let Some(caps) = SET_RE.captures(term) {
        let values: Vec<String> = caps["values"]
            .split(',')
            .map(|v| v.trim().to_string())
            .collect();
        if values.iter().any(String::is_empty) {
            return Err(SelectorError::InvalidSet(term.to_string()));
        }
        let key = key(&caps["key"])?;
        return Ok(match &caps["op"] {
            "in" => Requirement::In(key, values),
            _ => Requirement::NotIn(key, values),
        });
    }
    if term.contains('(') || term.contains(')') {
        return Err(SelectorError::InvalidSet(term.to_string()));
    }

    if let Some(rest) = term.strip_prefix('!') {
        return Ok(Requirement::NotExists(key(rest)?));
    }
    if let Some((k, v)) = term.split_once("!=") {
        return Ok(Requirement::NotEquals(key(k)?, v.trim().to_string()));
    }
    if let Some((k, v)) = term.split_once("==") {
        return Ok(Requirement::Equals(key(k)?, v.trim().to_string()));
    }
    if let Some((k, v)) = term.split_once('=') {
        return Ok(Requirement::Equals(key(k)?, v.trim().to_string()));
    }
    Ok(Requirement::Exists(key(term)?))
}
