//! Bracketing lookups over time-ordered slices.
//!
//! Curve segments, sun events and tide anchors are all sorted by an instant.
//! Every "which element covers `t`" question in the crate goes through
//! [`bracket_index`] instead of a hand-written binary search per type.

/// Index of the last element whose key is at or before `t`.
///
/// `items` must be sorted ascending by `key`. Returns `None` when `t` precedes
/// every element (or `items` is empty). The caller decides whether the next
/// element, if any, still brackets `t`.
///
/// # Example
/// ```
/// use surf_dash_lib::search::bracket_index;
///
/// let starts = [10, 20, 30];
/// assert_eq!(bracket_index(&starts, 5, |s| *s), None);
/// assert_eq!(bracket_index(&starts, 20, |s| *s), Some(1));
/// assert_eq!(bracket_index(&starts, 25, |s| *s), Some(1));
/// assert_eq!(bracket_index(&starts, 99, |s| *s), Some(2));
/// ```
pub fn bracket_index<T, K, F>(items: &[T], t: K, key: F) -> Option<usize>
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    items.partition_point(|item| key(item) <= t).checked_sub(1)
}
