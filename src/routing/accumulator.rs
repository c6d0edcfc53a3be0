//! Per-request record of path-matching decisions.
//!
//! # Responsibilities
//! - Hold one immutable `PathMatch` per successful matcher application
//! - Prepend in O(1) while routing descends the tree
//! - Hand the parent's records to derived request contexts
//!
//! # Design Decisions
//! - Most-recent-first storage; reducers read it in traversal order
//! - Records are `Arc`-shared so copying an accumulator is shallow
//! - No removal operation exists

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// A value extracted by a path matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Str(String),
    Int(i64),
    Opt(Option<Box<Extracted>>),
    /// Any other extracted value, kept in its display form.
    Other(String),
}

impl Extracted {
    /// The textual forms this value may take inside a request path.
    ///
    /// Integers also match their lowercase hexadecimal rendering; absent
    /// optionals have no form at all.
    pub fn path_forms(&self) -> Vec<String> {
        match self {
            Extracted::Str(s) | Extracted::Other(s) => vec![s.clone()],
            Extracted::Int(i) => vec![i.to_string(), format!("{i:x}")],
            Extracted::Opt(Some(inner)) => inner.path_forms(),
            Extracted::Opt(None) => Vec::new(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Extracted::Str(s) | Extracted::Other(s) => Some(s),
            Extracted::Opt(Some(inner)) => inner.as_str(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Extracted::Int(i) => Some(*i),
            Extracted::Opt(Some(inner)) => inner.as_int(),
            _ => None,
        }
    }
}

impl fmt::Display for Extracted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extracted::Str(s) | Extracted::Other(s) => f.write_str(s),
            Extracted::Int(i) => write!(f, "{i}"),
            Extracted::Opt(Some(inner)) => write!(f, "Some({inner})"),
            Extracted::Opt(None) => f.write_str("None"),
        }
    }
}

/// One routing-tree decision: the path seen by the matcher, how much of it
/// was consumed, and what was extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    full_path: String,
    consumed: usize,
    extracted: Vec<Extracted>,
}

impl PathMatch {
    pub fn new(full_path: impl Into<String>, consumed: usize, extracted: Vec<Extracted>) -> Self {
        let full_path = full_path.into();
        let consumed = consumed.min(full_path.len());
        Self {
            full_path,
            consumed,
            extracted,
        }
    }

    /// Build a record from the matcher's remaining path.
    pub fn from_remaining(full_path: &str, remaining: &str, extracted: Vec<Extracted>) -> Self {
        let consumed = full_path.len().saturating_sub(remaining.len());
        Self::new(full_path, consumed, extracted)
    }

    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn consumed_len(&self) -> usize {
        self.consumed
    }

    /// The prefix of the full path this match consumed.
    pub fn consumed_segment(&self) -> &str {
        self.full_path.get(..self.consumed).unwrap_or(&self.full_path)
    }

    pub fn extracted(&self) -> &[Extracted] {
        &self.extracted
    }
}

/// Accumulated path matches for one request-processing context.
#[derive(Debug, Clone, Default)]
pub struct MatchingContext {
    entries: VecDeque<Arc<PathMatch>>,
}

impl MatchingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new match in front of the existing ones.
    pub fn prepend(&mut self, record: PathMatch) {
        self.entries.push_front(Arc::new(record));
    }

    /// Copy of the current entries, most recent first.
    pub fn snapshot(&self) -> VecDeque<Arc<PathMatch>> {
        self.entries.clone()
    }

    /// Replace all entries, used when a derived context inherits its parent's.
    pub fn replace(&mut self, entries: VecDeque<Arc<PathMatch>>) {
        self.entries = entries;
    }

    /// Entries oldest first, in the order the routing tree was traversed.
    pub fn traversal_order(&self) -> impl Iterator<Item = &PathMatch> + '_ {
        self.entries.iter().rev().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
