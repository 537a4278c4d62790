use std::cmp::Ordering;
use std::ops::RangeBounds;

use crate::arena::{Handle, Id};
use crate::engine::{Iter, SplayEngine, clamp_inclusive, normalize_range};
use crate::error::CapacityError;
use crate::policy::RangePolicy;
use crate::traits::SequenceFold;

/// Ordered set of distinct values with rank access and range aggregates.
///
/// Every search splays the last node it compared against, found or not.
/// There is no range assignment here: overwriting values in place could
/// break the search order.
pub struct KeyedTree<P: RangePolicy>
where
    P::Value: Ord,
{
    engine: SplayEngine<P>,
}

impl<P: RangePolicy> KeyedTree<P>
where
    P::Value: Ord,
{
    pub fn new() -> Self {
        Self::with_default(P::default_value())
    }

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

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), CapacityError> {
        self.engine.try_reserve(additional)
    }

    pub fn clear(&mut self) {
        self.engine.clear();
    }

    pub fn root(&self) -> Option<Handle> {
        let root = self.engine.root();
        (!root.is_nil()).then(|| self.engine.handle(root))
    }

    /// Descend towards `key`, returning the last node visited and how `key`
    /// compares to it.
    fn search(&mut self, key: &P::Value) -> Option<(Id, Ordering)> {
        let mut x = self.engine.root();
        if x.is_nil() {
            return None;
        }
        loop {
            self.engine.push(x);
            let ord = key.cmp(self.engine.value(x));
            let next = match ord {
                Ordering::Equal => return Some((x, ord)),
                Ordering::Less => self.engine.child(x, 0),
                Ordering::Greater => self.engine.child(x, 1),
            };
            if next.is_nil() {
                return Some((x, ord));
            }
            x = next;
        }
    }

    pub fn find(&mut self, key: &P::Value) -> Option<Handle> {
        let (x, ord) = self.search(key)?;
        self.engine.splay(x);
        (ord == Ordering::Equal).then(|| self.engine.handle(x))
    }

    pub fn contains(&mut self, key: &P::Value) -> bool {
        self.find(key).is_some()
    }

    /// Insert `value` unless an equal one is present.
    ///
    /// Returns the node holding the value and whether it was newly inserted.
    pub fn insert(&mut self, value: P::Value) -> (Handle, bool) {
        let Some((x, ord)) = self.search(&value) else {
            let n = self.engine.alloc(value);
            self.engine.attach(Id::NIL, 0, n);
            return (self.engine.handle(n), true);
        };
        if ord == Ordering::Equal {
            self.engine.splay(x);
            return (self.engine.handle(x), false);
        }

        let n = self.engine.alloc(value);
        let dir = usize::from(ord == Ordering::Greater);
        self.engine.attach(x, dir, n);
        self.engine.splay(n);
        (self.engine.handle(n), true)
    }

    /// Remove `key`. Returns `false` if it was absent.
    pub fn erase(&mut self, key: &P::Value) -> bool {
        if self.find(key).is_none() {
            return false;
        }
        self.engine.remove_root();
        true
    }

    /// Node of rank `rank` in ascending order, splayed to the root.
    pub fn nth(&mut self, rank: usize) -> Option<Handle> {
        self.engine.select(rank).map(|x| self.engine.handle(x))
    }

    pub fn index_of(&self, handle: Handle) -> Option<usize> {
        self.engine.resolve(handle).map(|x| self.engine.index_of(x))
    }

    pub fn value(&mut self, handle: Handle) -> Option<&P::Value> {
        let x = self.engine.resolve(handle)?;
        Some(self.engine.resolve_value(x))
    }

    /// Aggregate over the ranks `[left, right]` of the sorted order.
    pub fn range_query(&mut self, left: usize, right: usize) -> P::Value {
        match clamp_inclusive(left, right, self.len()) {
            Some((left, right)) => self.engine.fold(left, right),
            None => self.engine.default_value().clone(),
        }
    }

    /// Values in ascending order.
    pub fn iter(&mut self) -> Iter<'_, P> {
        self.engine.iter()
    }

    pub fn serialize(&mut self) -> Vec<P::Value> {
        self.engine.serialize()
    }
}

impl<P: RangePolicy> Default for KeyedTree<P>
where
    P::Value: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P: RangePolicy> Clone for KeyedTree<P>
where
    P::Value: Ord,
{
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<P: RangePolicy> FromIterator<P::Value> for KeyedTree<P>
where
    P::Value: Ord,
{
    fn from_iter<I: IntoIterator<Item = P::Value>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<P: RangePolicy> Extend<P::Value> for KeyedTree<P>
where
    P::Value: Ord,
{
    fn extend<I: IntoIterator<Item = P::Value>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<P: RangePolicy> SequenceFold for KeyedTree<P>
where
    P::Value: Ord,
{
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
