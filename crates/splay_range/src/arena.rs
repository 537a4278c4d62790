use crate::error::CapacityError;

/// Largest number of live slots; `u32::MAX` itself is reserved for `Id::NIL`.
pub(crate) const MAX_NODES: usize = u32::MAX as usize;

#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Id(u32);

impl Id {
    pub(crate) const NIL: Self = Self(u32::MAX);

    #[inline(always)]
    pub(crate) fn is_nil(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline(always)]
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Generation-checked reference to a node.
///
/// A handle stays valid until its node is removed or the tree is cleared;
/// after that every lookup through it returns `None`, even if the slot has
/// been reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct Node<V> {
    pub(crate) ch: [Id; 2],
    pub(crate) p: Id,
    pub(crate) size: u32,

    pub(crate) value: V,
    pub(crate) agg: V,

    pub(crate) lazy: V,
    pub(crate) lazy_pending: bool,
}

impl<V: Clone> Node<V> {
    fn new(value: V, lazy: V) -> Self {
        Self {
            ch: [Id::NIL, Id::NIL],
            p: Id::NIL,
            size: 1,
            agg: value.clone(),
            value,
            lazy,
            lazy_pending: false,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Arena<V> {
    nodes: Vec<Node<V>>,
    generations: Vec<u32>,
    free: Vec<Id>,
}

impl<V: Clone> Arena<V> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn live(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    #[inline(always)]
    pub(crate) fn node(&self, x: Id) -> &Node<V> {
        debug_assert!(!x.is_nil());
        &self.nodes[x.idx()]
    }

    #[inline(always)]
    pub(crate) fn node_mut(&mut self, x: Id) -> &mut Node<V> {
        debug_assert!(!x.is_nil());
        &mut self.nodes[x.idx()]
    }

    pub(crate) fn alloc(&mut self, value: V, lazy: V) -> Id {
        if let Some(x) = self.free.pop() {
            self.nodes[x.idx()] = Node::new(value, lazy);
            return x;
        }
        let idx = self.nodes.len();
        assert!(idx < MAX_NODES, "splay tree node ids exhausted");
        self.nodes.push(Node::new(value, lazy));
        if self.generations.len() <= idx {
            self.generations.push(0);
        }
        Id(idx as u32)
    }

    /// Retire `x`, returning its value. Outstanding handles to it go stale.
    pub(crate) fn retire(&mut self, x: Id, filler: &V) -> V {
        let generation = &mut self.generations[x.idx()];
        *generation = generation.wrapping_add(1);
        self.free.push(x);

        let node = &mut self.nodes[x.idx()];
        node.ch = [Id::NIL, Id::NIL];
        node.p = Id::NIL;
        node.lazy_pending = false;
        node.agg = filler.clone();
        node.lazy = filler.clone();
        std::mem::replace(&mut node.value, filler.clone())
    }

    /// Drop every node and invalidate every handle handed out so far.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        for generation in &mut self.generations {
            *generation = generation.wrapping_add(1);
        }
    }

    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), CapacityError> {
        let requested = self.live().saturating_add(additional);
        if requested > MAX_NODES {
            return Err(CapacityError::HandleSpace {
                requested,
                max: MAX_NODES,
            });
        }
        let fresh = additional.saturating_sub(self.free.len());
        self.nodes.try_reserve(fresh)?;
        let missing = (self.nodes.len() + fresh).saturating_sub(self.generations.len());
        self.generations.try_reserve(missing)?;
        Ok(())
    }

    pub(crate) fn handle(&self, x: Id) -> Handle {
        Handle {
            index: x.0,
            generation: self.generations[x.idx()],
        }
    }

    pub(crate) fn resolve(&self, handle: Handle) -> Option<Id> {
        let idx = handle.index as usize;
        if idx >= self.nodes.len() || self.generations[idx] != handle.generation {
            return None;
        }
        Some(Id(handle.index))
    }
}
