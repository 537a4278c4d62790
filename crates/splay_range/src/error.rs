use std::collections::TryReserveError;

use thiserror::Error;

/// Failure to make room for more nodes.
#[derive(Debug, Error)]
pub enum CapacityError {
    #[error("node ids are 32-bit: cannot hold {requested} nodes (max {max})")]
    HandleSpace { requested: usize, max: usize },

    #[error("node storage allocation failed")]
    Alloc(#[from] TryReserveError),
}
