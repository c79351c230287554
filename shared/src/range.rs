use std::fmt;

/// A half-open range of list indices `[start, end)`.
///
/// Ranges are plain data; arithmetic that could push an endpoint past the
/// open-bound sentinels is the caller's responsibility to avoid.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IndexRange {
    pub start: i64,
    pub end: i64,
}

impl IndexRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// An empty range anchored at `position`.
    pub fn empty_at(position: i64) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, index: i64) -> bool {
        index >= self.start && index < self.end
    }

    pub fn contains_range(&self, other: &IndexRange) -> bool {
        other.is_empty() || (other.start >= self.start && other.end <= self.end)
    }

    /// The overlap of two ranges. Empty results are anchored at the
    /// clamped start so callers can still tell where the miss happened.
    pub fn intersect(&self, other: &IndexRange) -> IndexRange {
        let start = self.start.max(other.start);
        IndexRange::new(start, self.end.min(other.end))
    }

    pub fn overlaps(&self, other: &IndexRange) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    /// True when the two ranges overlap or sit flush against each other,
    /// i.e. their union is one contiguous span.
    pub fn touches(&self, other: &IndexRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn shift(&self, delta: i64) -> IndexRange {
        IndexRange::new(self.start + delta, self.end + delta)
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
