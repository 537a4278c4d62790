//! Aggregation policies.
//!
//! A policy fixes the element type together with the two pure callbacks the
//! tree needs: an associative `merge` and a `block` operation that resolves the
//! aggregate of a uniformly assigned subtree in O(1).

/// Merge/block configuration for a splay range tree.
///
/// Callers must uphold two laws, which are not checked at runtime:
/// - `merge` is associative.
/// - `block(v, k)` equals `merge` folded over `k` copies of `v` (`k >= 1`).
pub trait RangePolicy {
    type Value: Clone;

    /// Value returned for empty or out-of-range queries.
    fn default_value() -> Self::Value;

    /// Merge two adjacent aggregates, `left` preceding `right`.
    fn merge(left: &Self::Value, right: &Self::Value) -> Self::Value;

    fn block(value: &Self::Value, count: usize) -> Self::Value;
}

#[derive(Clone, Copy, Debug)]
pub enum RangeMin {}

impl RangePolicy for RangeMin {
    type Value = i64;

    #[inline(always)]
    fn default_value() -> Self::Value {
        i64::MAX
    }

    #[inline(always)]
    fn merge(left: &Self::Value, right: &Self::Value) -> Self::Value {
        *left.min(right)
    }

    #[inline(always)]
    fn block(value: &Self::Value, _count: usize) -> Self::Value {
        *value
    }
}

#[derive(Clone, Copy, Debug)]
pub enum RangeMax {}

impl RangePolicy for RangeMax {
    type Value = i64;

    #[inline(always)]
    fn default_value() -> Self::Value {
        i64::MIN
    }

    #[inline(always)]
    fn merge(left: &Self::Value, right: &Self::Value) -> Self::Value {
        *left.max(right)
    }

    #[inline(always)]
    fn block(value: &Self::Value, _count: usize) -> Self::Value {
        *value
    }
}

/// Sum with wrapping arithmetic, so huge blocks never panic in debug builds.
#[derive(Clone, Copy, Debug)]
pub enum RangeSum {}

impl RangePolicy for RangeSum {
    type Value = i64;

    #[inline(always)]
    fn default_value() -> Self::Value {
        0
    }

    #[inline(always)]
    fn merge(left: &Self::Value, right: &Self::Value) -> Self::Value {
        left.wrapping_add(*right)
    }

    #[inline(always)]
    fn block(value: &Self::Value, count: usize) -> Self::Value {
        value.wrapping_mul(count as i64)
    }
}
