//! Self-adjusting (splay) trees with subtree aggregates and lazy range
//! assignment.
//!
//! Two front ends share one arena-backed engine:
//! - [`PositionalTree`] addresses elements by rank and supports point/range
//!   queries and point/range assignment.
//! - [`KeyedTree`] keeps distinct values in sorted order with
//!   find/insert/erase, plus read-only rank access and range aggregates.
//!
//! Aggregation is configured at compile time through a [`RangePolicy`].
//! All operations run in amortized O(log n), except bulk build, traversal
//! and clear, which are O(n).

mod arena;
mod engine;
mod error;
mod keyed;
mod positional;

pub mod policy;
pub mod traits;

pub use arena::Handle;
pub use engine::Iter;
pub use error::CapacityError;
pub use keyed::KeyedTree;
pub use policy::{RangeMax, RangeMin, RangePolicy, RangeSum};
pub use positional::PositionalTree;
pub use traits::{SequenceAssign, SequenceFold};
