use std::fmt;

use crate::range::IndexRange;

/// The known valid index range `[minimum_inclusive, maximum_exclusive)` of a
/// remote list. Either end may be open (unconstrained) until a response
/// narrows it; open ends are carried as the `OPEN_MIN` / `OPEN_MAX`
/// sentinels so bounds always compare with plain integer ordering.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ListBounds {
    minimum_inclusive: i64,
    maximum_exclusive: i64,
}

/// What a bounds update did to each end. Shrinks are protocol anomalies the
/// window tolerates; the caller is expected to report them.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BoundsUpdate {
    pub changed: bool,
    pub shrunk_min: bool,
    pub shrunk_max: bool,
}

impl ListBounds {
    pub const OPEN_MIN: i64 = i64::MIN;
    pub const OPEN_MAX: i64 = i64::MAX;

    pub fn unbounded() -> Self {
        Self {
            minimum_inclusive: Self::OPEN_MIN,
            maximum_exclusive: Self::OPEN_MAX,
        }
    }

    /// Bounds from optional declared ends; an absent end stays open.
    pub fn from_declared(minimum_inclusive: Option<i64>, maximum_exclusive: Option<i64>) -> Self {
        Self {
            minimum_inclusive: minimum_inclusive.unwrap_or(Self::OPEN_MIN),
            maximum_exclusive: maximum_exclusive.unwrap_or(Self::OPEN_MAX),
        }
    }

    pub fn minimum_inclusive(&self) -> i64 {
        self.minimum_inclusive
    }

    pub fn maximum_exclusive(&self) -> i64 {
        self.maximum_exclusive
    }

    pub fn is_bounded_below(&self) -> bool {
        self.minimum_inclusive != Self::OPEN_MIN
    }

    pub fn is_bounded_above(&self) -> bool {
        self.maximum_exclusive != Self::OPEN_MAX
    }

    pub fn contains(&self, index: i64) -> bool {
        index >= self.minimum_inclusive && index < self.maximum_exclusive
    }

    /// Clamp `range` to these bounds. Avoids length arithmetic so open-end
    /// sentinels never overflow.
    pub fn clip(&self, range: &IndexRange) -> IndexRange {
        IndexRange::new(
            range.start.max(self.minimum_inclusive),
            range.end.min(self.maximum_exclusive),
        )
    }

    /// Apply declared ends from a load response, classifying each end as an
    /// expansion (silent) or a shrink (tolerated anomaly). Ends absent from
    /// the response are left as they were; the first constraint of an open
    /// end is a plain change, not a shrink.
    pub fn reconcile(
        &mut self,
        minimum_inclusive: Option<i64>,
        maximum_exclusive: Option<i64>,
    ) -> BoundsUpdate {
        let mut update = BoundsUpdate::default();
        if let Some(new_min) = minimum_inclusive {
            if new_min != self.minimum_inclusive {
                update.changed = true;
                update.shrunk_min = self.is_bounded_below() && new_min > self.minimum_inclusive;
                self.minimum_inclusive = new_min;
            }
        }
        if let Some(new_max) = maximum_exclusive {
            if new_max != self.maximum_exclusive {
                update.changed = true;
                update.shrunk_max = self.is_bounded_above() && new_max < self.maximum_exclusive;
                self.maximum_exclusive = new_max;
            }
        }
        update
    }

    /// Shift the upper bound by an applied insert/delete delta. An open
    /// upper bound stays open.
    pub fn shift_max(&mut self, delta: i64) {
        if self.is_bounded_above() {
            self.maximum_exclusive += delta;
        }
    }
}

impl fmt::Display for ListBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_bounded_below(), self.is_bounded_above()) {
            (true, true) => write!(f, "[{}, {})", self.minimum_inclusive, self.maximum_exclusive),
            (true, false) => write!(f, "[{}, +inf)", self.minimum_inclusive),
            (false, true) => write!(f, "[-inf, {})", self.maximum_exclusive),
            (false, false) => write!(f, "[-inf, +inf)"),
        }
    }
}
