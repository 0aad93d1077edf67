//! Span reconciliation: one authoritative error set from two detectors
//!
//! Local spans always win. A remote span survives only if it does not
//! intersect any local span. Output is stably sorted by `start`, so locals
//! precede remotes on equal starts and keep their rule order.

use super::span::ErrorSpan;

/// Merge local and remote spans into the ordered error set
pub fn merge(local: &[ErrorSpan], remote: &[ErrorSpan]) -> Vec<ErrorSpan> {
    let mut merged: Vec<ErrorSpan> = Vec::with_capacity(local.len() + remote.len());
    merged.extend_from_slice(local);
    merged.extend(
        remote
            .iter()
            .filter(|r| !local.iter().any(|l| r.overlaps(l)))
            .cloned(),
    );
    merged.sort_by_key(|span| span.start);
    merged
}

/// Number of remote spans `merge` would drop
pub fn shadowed_count(local: &[ErrorSpan], remote: &[ErrorSpan]) -> usize {
    remote
        .iter()
        .filter(|r| local.iter().any(|l| r.overlaps(l)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::span::{SpanKind, SpanOrigin};

    const TEXT: &str = "0123456789abcdef";

    fn local(start: usize, end: usize) -> ErrorSpan {
        ErrorSpan::local(TEXT, start..end, SpanKind::Error, None)
    }

    fn remote(start: usize, end: usize) -> ErrorSpan {
        ErrorSpan::remote(TEXT, start..end, SpanKind::Improve, Some("x".to_string()))
    }

    #[test]
    fn test_overlapping_remote_is_dropped() {
        let merged = merge(&[local(2, 5)], &[remote(4, 6)]);
        assert_eq!(merged, vec![local(2, 5)]);
    }

    #[test]
    fn test_disjoint_remote_is_kept() {
        let merged = merge(&[local(2, 5)], &[remote(6, 9)]);
        assert_eq!(merged, vec![local(2, 5), remote(6, 9)]);
    }

    #[test]
    fn test_adjacent_remote_is_kept() {
        let merged = merge(&[local(2, 5)], &[remote(5, 7)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_sorted_by_start_with_local_first_on_ties() {
        let merged = merge(&[local(8, 10), local(0, 1)], &[remote(3, 4), remote(1, 2)]);
        let starts: Vec<_> = merged.iter().map(|s| (s.start, s.origin)).collect();
        assert_eq!(
            starts,
            vec![
                (0, SpanOrigin::Local),
                (1, SpanOrigin::Remote),
                (3, SpanOrigin::Remote),
                (8, SpanOrigin::Local),
            ]
        );
    }

    #[test]
    fn test_equal_starts_keep_rule_order() {
        let filler = ErrorSpan::local(TEXT, 3..4, SpanKind::Improve, None);
        let locals = vec![local(3, 5), filler.clone()];
        let merged = merge(&locals, &[remote(12, 14)]);
        assert_eq!(merged, vec![local(3, 5), filler, remote(12, 14)]);
    }

    #[test]
    fn test_output_drawn_from_inputs_and_bounded() {
        let locals = vec![local(0, 2), local(10, 12)];
        let remotes = vec![remote(1, 3), remote(4, 6), remote(11, 14), remote(14, 16)];
        let merged = merge(&locals, &remotes);

        assert!(merged.len() <= locals.len() + remotes.len());
        for span in &merged {
            assert!(locals.contains(span) || remotes.contains(span));
        }
        assert_eq!(shadowed_count(&locals, &remotes), 2);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let locals = vec![local(6, 8), local(0, 3)];
        let remotes = vec![remote(2, 4), remote(9, 12), remote(4, 5)];
        assert_eq!(merge(&locals, &remotes), merge(&locals, &remotes));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(merge(&[], &[]).is_empty());
        assert_eq!(merge(&[], &[remote(1, 2)]), vec![remote(1, 2)]);
    }
}
