//! Reduction of accumulated path matches into an operation name.
//!
//! Each consumed segment is kept verbatim except that extracted values are
//! replaced with [`PLACEHOLDER`], which keeps operation names low-cardinality.

use crate::routing::accumulator::{Extracted, PathMatch};

/// Token substituted for every extracted value.
pub const PLACEHOLDER: &str = "{}";

/// Reduce path matches, given oldest first, to a variable-free operation name.
///
/// Returns an empty string when nothing was matched.
pub fn operation_name<'a, I>(matches: I) -> String
where
    I: IntoIterator<Item = &'a PathMatch>,
{
    matches.into_iter().map(segment_name).collect()
}

/// The contribution of a single match to the operation name.
pub fn segment_name(record: &PathMatch) -> String {
    let consumed = record.consumed_segment();
    record
        .extracted()
        .iter()
        .fold(consumed.to_string(), |segment, value| {
            substitute(&segment, value).unwrap_or(segment)
        })
}

/// Replace the leftmost bounded occurrence of any rendering of `value`.
fn substitute(segment: &str, value: &Extracted) -> Option<String> {
    let (start, len) = value
        .path_forms()
        .iter()
        .filter_map(|form| find_bounded(segment, form).map(|start| (start, form.len())))
        .min_by_key(|&(start, _)| start)?;

    let mut replaced = String::with_capacity(segment.len() - len + PLACEHOLDER.len());
    replaced.push_str(&segment[..start]);
    replaced.push_str(PLACEHOLDER);
    replaced.push_str(&segment[start + len..]);
    Some(replaced)
}

/// Start of the first occurrence of `needle` that sits between path
/// separators (or the ends of `haystack`), ignoring ASCII case.
fn find_bounded(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    let bytes = haystack.as_bytes();
    let len = needle.len();

    (0..=haystack.len() - len)
        .filter(|&start| haystack.is_char_boundary(start) && haystack.is_char_boundary(start + len))
        .find(|&start| {
            let end = start + len;
            let before = start == 0 || bytes[start - 1] == b'/';
            let after = end == bytes.len() || bytes[end] == b'/';
            before && after && bytes[start..end].eq_ignore_ascii_case(needle.as_bytes())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, consumed: usize, extracted: Vec<Extracted>) -> PathMatch {
        PathMatch::new(path, consumed, extracted)
    }

    #[test]
    fn literal_matches_are_kept_verbatim() {
        let matches = [record("/api/v1/users", 7, vec![])];
        assert_eq!(operation_name(&matches), "/api/v1");
    }

    #[test]
    fn empty_input_reduces_to_empty_name() {
        let none: [PathMatch; 0] = [];
        assert_eq!(operation_name(&none), "");
    }

    #[test]
    fn segments_tile_the_matched_path() {
        let matches = [
            record("/api/v1/users/42/orders", 8, vec![]),
            record("users/42/orders", 9, vec![Extracted::Int(42)]),
            record("orders", 6, vec![]),
        ];
        assert_eq!(operation_name(&matches), "/api/v1/users/{}/orders");
    }

    #[test]
    fn substitution_is_case_insensitive() {
        let matches = [record(
            "/users/Alice/posts",
            18,
            vec![Extracted::Str("alice".into())],
        )];
        assert_eq!(operation_name(&matches), "/users/{}/posts");
    }

    #[test]
    fn substitution_is_boundary_anchored() {
        // "4" occurs inside "42" but is not a whole segment there.
        let matches = [record("/42/4", 5, vec![Extracted::Int(4)])];
        assert_eq!(operation_name(&matches), "/42/{}");

        let matches = [record("/items/abc", 10, vec![Extracted::Str("b".into())])];
        assert_eq!(operation_name(&matches), "/items/abc");
    }

    #[test]
    fn integers_match_their_hex_rendering() {
        let matches = [record("/items/FF", 9, vec![Extracted::Int(255)])];
        assert_eq!(operation_name(&matches), "/items/{}");

        let matches = [record("/items/255", 10, vec![Extracted::Int(255)])];
        assert_eq!(operation_name(&matches), "/items/{}");
    }

    #[test]
    fn leftmost_rendering_is_replaced() {
        let matches = [record("/ff/255", 7, vec![Extracted::Int(255)])];
        assert_eq!(operation_name(&matches), "/{}/255");

        let matches = [record("/255/ff", 7, vec![Extracted::Int(255)])];
        assert_eq!(operation_name(&matches), "/{}/ff");
    }

    #[test]
    fn optionals_unwrap_or_skip() {
        let present = Extracted::Opt(Some(Box::new(Extracted::Str("draft".into()))));
        let matches = [record("/posts/draft", 12, vec![present, Extracted::Opt(None)])];
        assert_eq!(operation_name(&matches), "/posts/{}");
    }

    #[test]
    fn substitution_is_sequential() {
        // The second value sees the result of the first replacement.
        let matches = [record(
            "/a/b/a",
            6,
            vec![Extracted::Str("a".into()), Extracted::Str("a".into())],
        )];
        assert_eq!(operation_name(&matches), "/{}/b/{}");
    }

    #[test]
    fn unmatched_values_leave_segment_unchanged() {
        let matches = [record("/users/bob", 10, vec![Extracted::Str("carol".into())])];
        assert_eq!(operation_name(&matches), "/users/bob");
    }

    #[test]
    fn empty_values_never_match() {
        let matches = [record("/a//b", 5, vec![Extracted::Str(String::new())])];
        assert_eq!(operation_name(&matches), "/a//b");
    }
}
