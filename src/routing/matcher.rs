//! Path matchers.
//!
//! # Responsibilities
//! - Consume a prefix of the unmatched request path
//! - Extract typed values from the consumed prefix
//! - Report the remaining path so callers can record the match
//!
//! # Design Decisions
//! - Literal matching is case-sensitive, prefix-based
//! - Matchers are pure: same input always yields the same match
//! - No regex to guarantee O(n) matching

use std::fmt;

use crate::routing::accumulator::Extracted;

/// Result of a successful matcher application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matched<'p> {
    pub remaining: &'p str,
    pub extracted: Vec<Extracted>,
}

impl<'p> Matched<'p> {
    fn empty(remaining: &'p str) -> Self {
        Self {
            remaining,
            extracted: Vec::new(),
        }
    }

    fn with(remaining: &'p str, value: Extracted) -> Self {
        Self {
            remaining,
            extracted: vec![value],
        }
    }
}

/// Trait for matching a prefix of the request path.
pub trait PathMatcher: Send + Sync + fmt::Debug {
    /// Returns the match if this matcher accepts a prefix of `path`.
    fn apply<'p>(&self, path: &'p str) -> Option<Matched<'p>>;

    /// Sequence this matcher with another one.
    fn then<M: PathMatcher>(self, next: M) -> Then<Self, M>
    where
        Self: Sized,
    {
        Then { first: self, next }
    }
}

impl<M: PathMatcher + ?Sized> PathMatcher for Box<M> {
    fn apply<'p>(&self, path: &'p str) -> Option<Matched<'p>> {
        (**self).apply(path)
    }
}

impl<M: PathMatcher + ?Sized> PathMatcher for &M {
    fn apply<'p>(&self, path: &'p str) -> Option<Matched<'p>> {
        (**self).apply(path)
    }
}

/// Matches a single leading `/`.
#[derive(Debug, Clone, Copy)]
pub struct Slash;

impl PathMatcher for Slash {
    fn apply<'p>(&self, path: &'p str) -> Option<Matched<'p>> {
        path.strip_prefix('/').map(Matched::empty)
    }
}

/// Matches an exact literal prefix.
#[derive(Debug, Clone)]
pub struct Literal {
    prefix: String,
}

impl Literal {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl PathMatcher for Literal {
    fn apply<'p>(&self, path: &'p str) -> Option<Matched<'p>> {
        path.strip_prefix(self.prefix.as_str()).map(Matched::empty)
    }
}

fn split_segment(path: &str) -> (&str, &str) {
    match path.find('/') {
        Some(end) => path.split_at(end),
        None => (path, ""),
    }
}

/// Extracts one non-empty path segment as a string.
#[derive(Debug, Clone, Copy)]
pub struct Segment;

impl PathMatcher for Segment {
    fn apply<'p>(&self, path: &'p str) -> Option<Matched<'p>> {
        let (segment, rest) = split_segment(path);
        if segment.is_empty() {
            return None;
        }
        Some(Matched::with(rest, Extracted::Str(segment.to_string())))
    }
}

fn leading_digits(path: &str, radix: u32) -> usize {
    path.char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map(|(i, _)| i)
        .unwrap_or(path.len())
}

/// Extracts a decimal integer prefix.
#[derive(Debug, Clone, Copy)]
pub struct IntNumber;

impl PathMatcher for IntNumber {
    fn apply<'p>(&self, path: &'p str) -> Option<Matched<'p>> {
        let end = leading_digits(path, 10);
        if end == 0 {
            return None;
        }
        let value = path[..end].parse::<i64>().ok()?;
        Some(Matched::with(&path[end..], Extracted::Int(value)))
    }
}

/// Extracts a hexadecimal integer prefix.
#[derive(Debug, Clone, Copy)]
pub struct HexIntNumber;

impl PathMatcher for HexIntNumber {
    fn apply<'p>(&self, path: &'p str) -> Option<Matched<'p>> {
        let end = leading_digits(path, 16);
        if end == 0 {
            return None;
        }
        let value = i64::from_str_radix(&path[..end], 16).ok()?;
        Some(Matched::with(&path[end..], Extracted::Int(value)))
    }
}

/// Extracts everything that is left.
#[derive(Debug, Clone, Copy)]
pub struct Remaining;

impl PathMatcher for Remaining {
    fn apply<'p>(&self, path: &'p str) -> Option<Matched<'p>> {
        Some(Matched::with(&path[path.len()..], Extracted::Str(path.to_string())))
    }
}

/// Always matches; wraps the inner matcher's values as present optionals,
/// or yields one absent optional when the inner matcher fails.
#[derive(Debug, Clone)]
pub struct Optional<M> {
    inner: M,
}

impl<M> Optional<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M: PathMatcher> PathMatcher for Optional<M> {
    fn apply<'p>(&self, path: &'p str) -> Option<Matched<'p>> {
        match self.inner.apply(path) {
            Some(matched) => Some(Matched {
                remaining: matched.remaining,
                extracted: matched
                    .extracted
                    .into_iter()
                    .map(|v| Extracted::Opt(Some(Box::new(v))))
                    .collect(),
            }),
            None => Some(Matched::with(path, Extracted::Opt(None))),
        }
    }
}

/// Two matchers applied one after the other.
#[derive(Debug, Clone)]
pub struct Then<A, B> {
    first: A,
    next: B,
}

impl<A: PathMatcher, B: PathMatcher> PathMatcher for Then<A, B> {
    fn apply<'p>(&self, path: &'p str) -> Option<Matched<'p>> {
        let first = self.first.apply(path)?;
        let next = self.next.apply(first.remaining)?;
        let mut extracted = first.extracted;
        extracted.extend(next.extracted);
        Some(Matched {
            remaining: next.remaining,
            extracted,
        })
    }
}
