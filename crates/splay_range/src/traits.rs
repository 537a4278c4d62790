use std::ops::RangeBounds;

/// Read access to range aggregates by rank.
pub trait SequenceFold {
    type Value;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate over `range`, clamped to the sequence.
    ///
    /// An empty or inverted range yields the default value.
    fn fold<R: RangeBounds<usize>>(&mut self, range: R) -> Self::Value;
}

/// Uniform assignment over a rank range.
pub trait SequenceAssign: SequenceFold {
    fn assign<R: RangeBounds<usize>>(&mut self, range: R, value: Self::Value);
}
