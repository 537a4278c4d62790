use std::ops::RangeBounds;

use crate::arena::Handle;
use crate::engine::{Iter, SplayEngine, clamp_inclusive, normalize_range};
use crate::error::CapacityError;
use crate::policy::RangePolicy;
use crate::traits::{SequenceAssign, SequenceFold};

/// Sequence addressed by rank, with range aggregate and range assign.
///
/// Values are never compared; the in-order sequence is exactly the order
/// given to [`build`](Self::build) plus later rank-based edits. All bounds
/// are 0-indexed and inclusive, and out-of-range requests are clamped or
/// ignored instead of failing.
pub struct PositionalTree<P: RangePolicy> {
    engine: SplayEngine<P>,
}

impl<P: RangePolicy> PositionalTree<P> {
    pub fn new() -> Self {
        Self::with_default(P::default_value())
    }

    /// Use `default` instead of `P::default_value()` for empty answers.
    pub fn with_default(default: P::Value) -> Self {
        Self {
            engine: SplayEngine::new(default),
        }
    }

    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the contents with `values`, in order, in O(n).
    ///
    /// The result is a chain; it balances itself as it is accessed.
    pub fn build<I: IntoIterator<Item = P::Value>>(&mut self, values: I) {
        self.engine.build(values);
    }

    /// Replace the contents with `n` copies of the default value.
    pub fn build_default(&mut self, n: usize) {
        let default = self.engine.default_value().clone();
        self.engine.build(std::iter::repeat_n(default, n));
    }

    /// Like [`build`](Self::build), but reports storage exhaustion instead
    /// of aborting.
    pub fn try_build(&mut self, values: &[P::Value]) -> Result<(), CapacityError> {
        self.engine.clear();
        self.engine.try_reserve(values.len())?;
        self.engine.build(values.iter().cloned());
        Ok(())
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), CapacityError> {
        self.engine.try_reserve(additional)
    }

    pub fn clear(&mut self) {
        self.engine.clear();
    }

    /// Node at `index`, splayed to the root.
    pub fn get(&mut self, index: usize) -> Option<Handle> {
        self.engine.select(index).map(|x| self.engine.handle(x))
    }

    /// Current root, if any.
    pub fn root(&self) -> Option<Handle> {
        let root = self.engine.root();
        (!root.is_nil()).then(|| self.engine.handle(root))
    }

    /// Rank of the node behind `handle`, or `None` if it was removed.
    pub fn index_of(&self, handle: Handle) -> Option<usize> {
        self.engine.resolve(handle).map(|x| self.engine.index_of(x))
    }

    /// Current value of the node behind `handle`.
    pub fn value(&mut self, handle: Handle) -> Option<&P::Value> {
        let x = self.engine.resolve(handle)?;
        Some(self.engine.resolve_value(x))
    }

    pub fn point_query(&mut self, index: usize) -> P::Value {
        match self.engine.select(index) {
            Some(x) => self.engine.value(x).clone(),
            None => self.engine.default_value().clone(),
        }
    }

    /// Overwrite the value at `index`; ignored when out of range.
    pub fn point_update(&mut self, index: usize, value: P::Value) {
        self.engine.set(index, value);
    }

    /// Aggregate over `[left, right]`.
    pub fn range_query(&mut self, left: usize, right: usize) -> P::Value {
        match clamp_inclusive(left, right, self.len()) {
            Some((left, right)) => self.engine.fold(left, right),
            None => self.engine.default_value().clone(),
        }
    }

    /// Assign `value` to every position in `[left, right]`.
    pub fn range_update(&mut self, left: usize, right: usize, value: P::Value) {
        if let Some((left, right)) = clamp_inclusive(left, right, self.len()) {
            self.engine.assign(left, right, &value);
        }
    }

    /// Insert `value` so that it lands at `index`; `index` past the end
    /// appends.
    pub fn insert_at(&mut self, index: usize, value: P::Value) -> Handle {
        let index = index.min(self.len());
        let x = self.engine.insert_at(index, value);
        self.engine.handle(x)
    }

    pub fn push(&mut self, value: P::Value) -> Handle {
        self.insert_at(self.len(), value)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<P::Value> {
        self.engine.select(index)?;
        Some(self.engine.remove_root())
    }

    /// Values in index order, resolving pending assigns on the way.
    pub fn iter(&mut self) -> Iter<'_, P> {
        self.engine.iter()
    }

    pub fn serialize(&mut self) -> Vec<P::Value> {
        self.engine.serialize()
    }
}

impl<P: RangePolicy> Default for PositionalTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: RangePolicy> Clone for PositionalTree<P> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<P: RangePolicy> FromIterator<P::Value> for PositionalTree<P> {
    fn from_iter<I: IntoIterator<Item = P::Value>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.build(iter);
        tree
    }
}

impl<P: RangePolicy> Extend<P::Value> for PositionalTree<P> {
    fn extend<I: IntoIterator<Item = P::Value>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<P: RangePolicy> SequenceFold for PositionalTree<P> {
    type Value = P::Value;

    fn len(&self) -> usize {
        self.engine.len()
    }

    fn fold<R: RangeBounds<usize>>(&mut self, range: R) -> Self::Value {
        match normalize_range(range, self.engine.len()) {
            Some((left, right)) => self.engine.fold(left, right),
            None => self.engine.default_value().clone(),
        }
    }
}

impl<P: RangePolicy> SequenceAssign for PositionalTree<P> {
    fn assign<R: RangeBounds<usize>>(&mut self, range: R, value: Self::Value) {
        if let Some((left, right)) = normalize_range(range, self.engine.len()) {
            self.engine.assign(left, right, &value);
        }
    }
}
