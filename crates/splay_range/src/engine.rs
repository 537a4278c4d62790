//! Arena-backed splay tree with subtree sizes, in-order aggregates and a lazy
//! "assign" tag.
//!
//! Both addressing modes sit on top of this engine. Every node carries its
//! subtree size and the in-order aggregate of its subtree; a pending assign on
//! a node means its value and aggregate are already resolved, but its
//! children still have to receive the assignment. Any walk that reads a
//! node's children pushes the tag one level down first.

use std::ops::{Bound, RangeBounds};

use crate::arena::{Arena, Handle, Id};
use crate::error::CapacityError;
use crate::policy::RangePolicy;

/// Clamp the inclusive range `[left, right]` into `[0, len)`.
///
/// Returns `None` for an empty tree or a range with nothing inside it.
pub(crate) fn clamp_inclusive(left: usize, right: usize, len: usize) -> Option<(usize, usize)> {
    if len == 0 || left > right || left >= len {
        return None;
    }
    Some((left, right.min(len - 1)))
}

/// Convert any `RangeBounds` into a clamped inclusive range.
pub(crate) fn normalize_range<R: RangeBounds<usize>>(range: R, len: usize) -> Option<(usize, usize)> {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.checked_add(1)?,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&end) => end,
        Bound::Excluded(&end) => end.checked_sub(1)?,
        Bound::Unbounded => len.checked_sub(1)?,
    };
    clamp_inclusive(start, end, len)
}

pub(crate) struct SplayEngine<P: RangePolicy> {
    arena: Arena<P::Value>,
    root: Id,
    default: P::Value,
    stack: Vec<Id>,
}

impl<P: RangePolicy> Clone for SplayEngine<P> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            root: self.root,
            default: self.default.clone(),
            stack: Vec::new(),
        }
    }
}

impl<P: RangePolicy> SplayEngine<P> {
    pub(crate) fn new(default: P::Value) -> Self {
        Self {
            arena: Arena::new(),
            root: Id::NIL,
            default,
            stack: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.size(self.root)
    }

    pub(crate) fn default_value(&self) -> &P::Value {
        &self.default
    }

    pub(crate) fn root(&self) -> Id {
        self.root
    }

    #[inline(always)]
    pub(crate) fn child(&self, x: Id, dir: usize) -> Id {
        self.arena.node(x).ch[dir]
    }

    #[inline(always)]
    fn parent(&self, x: Id) -> Id {
        self.arena.node(x).p
    }

    #[inline(always)]
    pub(crate) fn value(&self, x: Id) -> &P::Value {
        &self.arena.node(x).value
    }

    #[inline(always)]
    fn size(&self, x: Id) -> usize {
        if x.is_nil() {
            0
        } else {
            self.arena.node(x).size as usize
        }
    }

    pub(crate) fn handle(&self, x: Id) -> Handle {
        self.arena.handle(x)
    }

    pub(crate) fn resolve(&self, handle: Handle) -> Option<Id> {
        self.arena.resolve(handle)
    }

    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), CapacityError> {
        self.arena.try_reserve(additional).inspect_err(|err| {
            log::warn!("splay tree reservation of {additional} nodes failed: {err}");
        })
    }

    /// Allocate a detached node holding `value`.
    pub(crate) fn alloc(&mut self, value: P::Value) -> Id {
        self.arena.alloc(value, self.default.clone())
    }

    /// Hang the detached node `x` below `parent` on side `dir`, or make it
    /// the root when `parent` is nil. Aggregates above are left stale.
    pub(crate) fn attach(&mut self, parent: Id, dir: usize, x: Id) {
        if parent.is_nil() {
            self.root = x;
        } else {
            debug_assert!(self.child(parent, dir).is_nil());
            self.arena.node_mut(parent).ch[dir] = x;
        }
        self.arena.node_mut(x).p = parent;
    }

    /// Recompute size and aggregate of `x` from its children.
    pub(crate) fn pull(&mut self, x: Id) {
        if x.is_nil() {
            return;
        }
        let [l, r] = self.arena.node(x).ch;
        let size = 1 + self.size(l) + self.size(r);
        let mut agg = self.arena.node(x).value.clone();
        if !l.is_nil() {
            agg = P::merge(&self.arena.node(l).agg, &agg);
        }
        if !r.is_nil() {
            agg = P::merge(&agg, &self.arena.node(r).agg);
        }
        let nx = self.arena.node_mut(x);
        nx.size = size as u32;
        nx.agg = agg;
    }

    /// Overwrite every value in the subtree of `x` in O(1).
    fn apply_assign(&mut self, x: Id, value: &P::Value) {
        if x.is_nil() {
            return;
        }
        let nx = self.arena.node_mut(x);
        nx.agg = P::block(value, nx.size as usize);
        nx.value = value.clone();
        nx.lazy = value.clone();
        nx.lazy_pending = true;
    }

    /// Hand a pending assign on `x` down to its children.
    pub(crate) fn push(&mut self, x: Id) {
        if x.is_nil() || !self.arena.node(x).lazy_pending {
            return;
        }
        let lazy = std::mem::replace(&mut self.arena.node_mut(x).lazy, self.default.clone());
        self.arena.node_mut(x).lazy_pending = false;
        let [l, r] = self.arena.node(x).ch;
        self.apply_assign(l, &lazy);
        self.apply_assign(r, &lazy);
    }

    /// Push every pending tag on the root-to-`x` path, top-down.
    fn push_path(&mut self, x: Id) {
        self.stack.clear();
        let mut y = x;
        while !y.is_nil() {
            self.stack.push(y);
            y = self.parent(y);
        }
        while let Some(v) = self.stack.pop() {
            self.push(v);
        }
    }

    fn rotate(&mut self, x: Id) {
        let p = self.parent(x);
        let g = self.parent(p);
        self.push(p);
        self.push(x);

        let dir = usize::from(self.child(p, 1) == x);
        let b = self.child(x, dir ^ 1);

        if g.is_nil() {
            self.root = x;
        } else if self.child(g, 0) == p {
            self.arena.node_mut(g).ch[0] = x;
        } else {
            self.arena.node_mut(g).ch[1] = x;
        }
        self.arena.node_mut(x).p = g;

        self.arena.node_mut(x).ch[dir ^ 1] = p;
        self.arena.node_mut(p).p = x;

        self.arena.node_mut(p).ch[dir] = b;
        if !b.is_nil() {
            self.arena.node_mut(b).p = p;
        }

        self.pull(p);
        self.pull(x);
    }

    /// Rotate `x` upward until its parent is `goal` (nil: to the root).
    fn splay_under(&mut self, x: Id, goal: Id) {
        self.push_path(x);

        while self.parent(x) != goal {
            let p = self.parent(x);
            let g = self.parent(p);
            if g != goal {
                let zigzig = (self.child(g, 0) == p) == (self.child(p, 0) == x);
                if zigzig {
                    self.rotate(p);
                } else {
                    self.rotate(x);
                }
            }
            self.rotate(x);
        }
    }

    pub(crate) fn splay(&mut self, x: Id) {
        self.splay_under(x, Id::NIL);
    }

    /// Walk down from `start` to the node of rank `k` within its subtree.
    fn locate(&mut self, start: Id, mut k: usize) -> Id {
        debug_assert!(k < self.size(start));
        let mut x = start;
        loop {
            self.push(x);
            let l = self.child(x, 0);
            let left_size = self.size(l);
            if k < left_size {
                x = l;
            } else if k == left_size {
                return x;
            } else {
                k -= left_size + 1;
                x = self.child(x, 1);
            }
        }
    }

    /// Find the node at rank `k` and splay it to the root.
    pub(crate) fn select(&mut self, k: usize) -> Option<Id> {
        if k >= self.len() {
            return None;
        }
        let x = self.locate(self.root, k);
        self.splay(x);
        Some(x)
    }

    /// Rank of `x`, accumulated along parent links. Does not restructure.
    pub(crate) fn index_of(&self, x: Id) -> usize {
        let mut rank = self.size(self.child(x, 0));
        let mut y = x;
        let mut p = self.parent(y);
        while !p.is_nil() {
            if self.child(p, 1) == y {
                rank += self.size(self.child(p, 0)) + 1;
            }
            y = p;
            p = self.parent(y);
        }
        rank
    }

    /// Materialize pending tags above `x` so `value(x)` is current.
    pub(crate) fn resolve_value(&mut self, x: Id) -> &P::Value {
        self.push_path(x);
        self.value(x)
    }

    /// Restructure so the ranks `[left, right]` form exactly one subtree and
    /// return its root. Requires `left <= right < len`.
    fn interval(&mut self, left: usize, right: usize) -> Id {
        let len = self.len();
        debug_assert!(left <= right && right < len);

        match (left > 0, right + 1 < len) {
            (false, false) => self.root,
            (false, true) => {
                let Some(upper) = self.select(right + 1) else {
                    unreachable!("rank {} is inside the tree", right + 1);
                };
                self.child(upper, 0)
            }
            (true, false) => {
                let Some(lower) = self.select(left - 1) else {
                    unreachable!("rank {} is inside the tree", left - 1);
                };
                self.child(lower, 1)
            }
            (true, true) => {
                let Some(lower) = self.select(left - 1) else {
                    unreachable!("rank {} is inside the tree", left - 1);
                };
                let upper = self.locate(self.child(lower, 1), right - left + 1);
                self.splay_under(upper, lower);
                self.child(upper, 0)
            }
        }
    }

    /// Aggregate over the inclusive ranks `[left, right]`.
    pub(crate) fn fold(&mut self, left: usize, right: usize) -> P::Value {
        let x = self.interval(left, right);
        self.arena.node(x).agg.clone()
    }

    /// Assign `value` to every rank in `[left, right]`.
    pub(crate) fn assign(&mut self, left: usize, right: usize, value: &P::Value) {
        let x = self.interval(left, right);
        self.apply_assign(x, value);
        let mut y = self.parent(x);
        while !y.is_nil() {
            self.pull(y);
            y = self.parent(y);
        }
    }

    /// Overwrite the value at rank `k`. Returns `false` if out of range.
    pub(crate) fn set(&mut self, k: usize, value: P::Value) -> bool {
        let Some(x) = self.select(k) else {
            return false;
        };
        self.arena.node_mut(x).value = value;
        self.pull(x);
        true
    }

    /// Insert a fresh node so that it ends up at rank `k` (`k <= len`).
    pub(crate) fn insert_at(&mut self, k: usize, value: P::Value) -> Id {
        debug_assert!(k <= self.len());
        let n = self.alloc(value);
        match self.select(k) {
            Some(x) => {
                let l = self.child(x, 0);
                self.arena.node_mut(x).ch[0] = Id::NIL;
                if !l.is_nil() {
                    self.arena.node_mut(l).p = n;
                }
                self.arena.node_mut(n).ch[0] = l;
                self.attach(x, 0, n);
                self.pull(n);
                self.pull(x);
            }
            None => match self.len().checked_sub(1).and_then(|last| self.select(last)) {
                Some(last) => {
                    self.attach(last, 1, n);
                    self.pull(last);
                }
                None => self.attach(Id::NIL, 0, n),
            },
        }
        self.splay(n);
        n
    }

    /// Unlink the current root, join its subtrees and retire it.
    pub(crate) fn remove_root(&mut self) -> P::Value {
        let x = self.root;
        debug_assert!(!x.is_nil());
        self.push(x);
        let [l, r] = self.arena.node(x).ch;

        if l.is_nil() || r.is_nil() {
            let rest = if l.is_nil() { r } else { l };
            self.root = rest;
            if !rest.is_nil() {
                self.arena.node_mut(rest).p = Id::NIL;
            }
        } else {
            self.arena.node_mut(l).p = Id::NIL;
            self.arena.node_mut(r).p = Id::NIL;
            self.root = l;
            let join = self.locate(l, self.size(l) - 1);
            self.splay(join);
            self.attach(join, 1, r);
            self.pull(join);
        }
        self.arena.retire(x, &self.default)
    }

    /// Replace the contents with a right-leaning chain in sequence order.
    pub(crate) fn build<I: IntoIterator<Item = P::Value>>(&mut self, values: I) {
        self.clear();
        let mut last = Id::NIL;
        for value in values {
            let x = self.alloc(value);
            self.attach(last, 1, x);
            last = x;
        }

        let mut y = last;
        while !y.is_nil() {
            self.pull(y);
            y = self.parent(y);
        }
        log::debug!("built splay tree chain of {} nodes", self.len());
    }

    pub(crate) fn clear(&mut self) {
        if !self.root.is_nil() {
            log::debug!("releasing {} splay tree nodes", self.arena.live());
        }
        self.arena.clear();
        self.root = Id::NIL;
    }

    pub(crate) fn iter(&mut self) -> Iter<'_, P> {
        Iter {
            cur: self.root,
            remaining: self.len(),
            stack: Vec::new(),
            engine: self,
        }
    }

    pub(crate) fn serialize(&mut self) -> Vec<P::Value> {
        let mut out = Vec::with_capacity(self.len());
        out.extend(self.iter());
        out
    }
}

/// In-order traversal that resolves pending assigns as it descends.
///
/// Uses an explicit stack, so chain-shaped trees cost no call depth.
pub struct Iter<'a, P: RangePolicy> {
    engine: &'a mut SplayEngine<P>,
    stack: Vec<Id>,
    cur: Id,
    remaining: usize,
}

impl<P: RangePolicy> Iterator for Iter<'_, P> {
    type Item = P::Value;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.cur.is_nil() {
            self.engine.push(self.cur);
            self.stack.push(self.cur);
            self.cur = self.engine.child(self.cur, 0);
        }
        let x = self.stack.pop()?;
        self.cur = self.engine.child(x, 1);
        self.remaining -= 1;
        Some(self.engine.value(x).clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<P: RangePolicy> ExactSizeIterator for Iter<'_, P> {}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Id, SplayEngine, clamp_inclusive, normalize_range};
    use crate::policy::{RangeMin, RangePolicy, RangeSum};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    type Snapshot = Vec<(usize, [Id; 2], Id, u32, i64, i64, i64, bool)>;

    fn snapshot<P: RangePolicy<Value = i64>>(engine: &SplayEngine<P>) -> Snapshot {
        let mut out = Vec::new();
        let mut stack = vec![engine.root];
        while let Some(x) = stack.pop() {
            if x.is_nil() {
                continue;
            }
            let n = engine.arena.node(x);
            out.push((x.idx(), n.ch, n.p, n.size, n.value, n.agg, n.lazy, n.lazy_pending));
            stack.extend(n.ch);
        }
        out.sort_by_key(|entry| entry.0);
        out
    }

    /// Verify parent links, sizes and aggregates against pending tags.
    ///
    /// Returns the resolved in-order values.
    pub(crate) fn check_invariants<P: RangePolicy<Value = i64>>(
        engine: &SplayEngine<P>,
    ) -> Vec<i64> {
        fn walk<P: RangePolicy<Value = i64>>(
            engine: &SplayEngine<P>,
            x: Id,
            parent: Id,
            assigned: Option<i64>,
            out: &mut Vec<i64>,
        ) -> (usize, Option<i64>) {
            if x.is_nil() {
                return (0, None);
            }
            let n = engine.arena.node(x);
            assert_eq!(n.p, parent, "parent link of {x:?}");
            let below = assigned.or(n.lazy_pending.then_some(n.lazy));
            let value = assigned.unwrap_or(n.value);

            let (left_size, left_agg) = walk(engine, n.ch[0], x, below, out);
            out.push(value);
            let (right_size, right_agg) = walk(engine, n.ch[1], x, below, out);

            let size = 1 + left_size + right_size;
            assert_eq!(n.size as usize, size, "size of {x:?}");
            let mut agg = value;
            if let Some(l) = left_agg {
                agg = P::merge(&l, &agg);
            }
            if let Some(r) = right_agg {
                agg = P::merge(&agg, &r);
            }
            match assigned {
                Some(v) => assert_eq!(agg, P::block(&v, size)),
                None => assert_eq!(n.agg, agg, "aggregate of {x:?}"),
            }
            (size, Some(agg))
        }

        let mut out = Vec::new();
        walk(engine, engine.root, Id::NIL, None, &mut out);
        assert_eq!(out.len(), engine.len());
        out
    }

    #[test]
    fn clamping() {
        assert_eq!(clamp_inclusive(0, 0, 0), None);
        assert_eq!(clamp_inclusive(2, 1, 5), None);
        assert_eq!(clamp_inclusive(5, 9, 5), None);
        assert_eq!(clamp_inclusive(1, 9, 5), Some((1, 4)));
        assert_eq!(normalize_range(.., 4), Some((0, 3)));
        assert_eq!(normalize_range(1..3, 4), Some((1, 2)));
        assert_eq!(normalize_range(2..2, 4), None);
        assert_eq!(normalize_range(..0, 4), None);
        assert_eq!(normalize_range(2..=10, 4), Some((2, 3)));
        assert_eq!(normalize_range(.., 0), None);
    }

    #[test]
    fn build_makes_a_consistent_chain() {
        let mut engine = SplayEngine::<RangeSum>::new(0);
        engine.build(1..=6);
        assert_eq!(check_invariants(&engine), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(engine.arena.node(engine.root).agg, 21);
        let mut depth = 0;
        let mut x = engine.root;
        while !x.is_nil() {
            assert!(engine.child(x, 0).is_nil());
            depth += 1;
            x = engine.child(x, 1);
        }
        assert_eq!(depth, 6);
    }

    #[test]
    fn select_splays_to_root_and_index_of_inverts_it() {
        let mut engine = SplayEngine::<RangeSum>::new(0);
        engine.build(0..50);
        for k in [17, 0, 49, 25, 3] {
            let x = engine.select(k).unwrap();
            assert_eq!(engine.root(), x);
            assert_eq!(*engine.value(x), k as i64);
            assert_eq!(engine.index_of(x), k);
            check_invariants(&engine);
        }
        for k in 0..50 {
            let x = engine.locate(engine.root, k);
            assert_eq!(engine.index_of(x), k);
        }
        assert_eq!(engine.select(50), None);
    }

    #[test]
    fn push_is_idempotent() {
        let mut engine = SplayEngine::<RangeSum>::new(0);
        engine.build(0..20);
        engine.select(10);
        engine.assign(3, 15, &7);
        check_invariants(&engine);

        let mut pending = Vec::new();
        let mut stack = vec![engine.root];
        while let Some(x) = stack.pop() {
            if x.is_nil() {
                continue;
            }
            if engine.arena.node(x).lazy_pending {
                pending.push(x);
            }
            stack.extend(engine.arena.node(x).ch);
        }
        assert!(!pending.is_empty());

        for x in pending {
            engine.push(x);
            let once = snapshot(&engine);
            engine.push(x);
            assert_eq!(snapshot(&engine), once);
            check_invariants(&engine);
        }
    }

    #[test]
    fn remove_root_joins_subtrees() {
        let mut engine = SplayEngine::<RangeMin>::new(i64::MAX);
        engine.build([4, 8, 15, 16, 23, 42]);
        engine.select(3);
        assert_eq!(engine.remove_root(), 16);
        assert_eq!(check_invariants(&engine), vec![4, 8, 15, 23, 42]);
        engine.select(0);
        assert_eq!(engine.remove_root(), 4);
        engine.select(3);
        assert_eq!(engine.remove_root(), 42);
        assert_eq!(check_invariants(&engine), vec![8, 15, 23]);
        assert_eq!(engine.arena.live(), 3);
    }

    #[test]
    fn random_rank_operations_match_vec() {
        let mut rng = StdRng::seed_from_u64(0x5EED_2026);
        let mut engine = SplayEngine::<RangeSum>::new(0);
        let mut vec: Vec<i64> = (0..40).map(|_| rng.random_range(-100..=100)).collect();
        engine.build(vec.iter().copied());

        for step in 0..3000 {
            match rng.random_range(0..6) {
                0 => {
                    let k = rng.random_range(0..=vec.len());
                    let v = rng.random_range(-100..=100);
                    engine.insert_at(k, v);
                    vec.insert(k, v);
                }
                1 => {
                    if vec.is_empty() {
                        continue;
                    }
                    let k = rng.random_range(0..vec.len());
                    engine.select(k);
                    assert_eq!(engine.remove_root(), vec.remove(k));
                }
                2 => {
                    if vec.is_empty() {
                        continue;
                    }
                    let l = rng.random_range(0..vec.len());
                    let r = rng.random_range(l..vec.len());
                    let v = rng.random_range(-100..=100);
                    engine.assign(l, r, &v);
                    vec[l..=r].fill(v);
                }
                3 => {
                    if vec.is_empty() {
                        continue;
                    }
                    let k = rng.random_range(0..vec.len());
                    let v = rng.random_range(-100..=100);
                    assert!(engine.set(k, v));
                    vec[k] = v;
                }
                _ => {
                    if vec.is_empty() {
                        continue;
                    }
                    let l = rng.random_range(0..vec.len());
                    let r = rng.random_range(l..vec.len());
                    assert_eq!(engine.fold(l, r), vec[l..=r].iter().sum::<i64>());
                }
            }
            if step % 97 == 0 {
                assert_eq!(check_invariants(&engine), vec);
            }
        }
        assert_eq!(engine.serialize(), vec);
    }
}
