use std::collections::VecDeque;

use dynlist_shared::{IndexRange, ListBounds, Value};

use crate::error::WindowError;

/// The locally materialized portion of a remote list.
///
/// Items are held as one contiguous span starting at `span_start`; every
/// load, mutation, and eviction preserves that contiguity, so a single
/// deque plus an offset is the whole representation. Indices are list
/// indices, which may be negative.
pub struct ItemWindow {
    bounds: ListBounds,
    span_start: i64,
    items: VecDeque<Value>,
    visible: Option<IndexRange>,
}

/// What applying declared bounds did: which ends moved, and which
/// materialized ranges fell outside the new bounds.
pub struct BoundsOutcome {
    pub changed: bool,
    pub shrunk_min: bool,
    pub shrunk_max: bool,
    pub evicted: Vec<IndexRange>,
}

impl ItemWindow {
    pub fn new(bounds: ListBounds, start_index: i64, items: Vec<Value>) -> Self {
        Self {
            bounds,
            span_start: start_index,
            items: VecDeque::from(items),
            visible: None,
        }
    }

    pub fn bounds(&self) -> ListBounds {
        self.bounds
    }

    /// The contiguous range of indices currently materialized.
    pub fn span(&self) -> IndexRange {
        IndexRange::new(self.span_start, self.span_start + self.items.len() as i64)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, index: i64) -> Option<&Value> {
        if self.span().contains(index) {
            self.items.get((index - self.span_start) as usize)
        } else {
            None
        }
    }

    pub fn set_visible(&mut self, range: IndexRange) {
        self.visible = Some(range);
    }

    pub fn visible(&self) -> Option<IndexRange> {
        self.visible
    }

    /// The sub-ranges of `wanted` not currently materialized, clipped to
    /// the bounds. At most two: one below the span, one above it.
    pub fn missing_in(&self, wanted: &IndexRange) -> Vec<IndexRange> {
        let clipped = self.bounds.clip(wanted);
        if clipped.is_empty() {
            return Vec::new();
        }
        let span = self.span();
        if span.is_empty() || !clipped.overlaps(&span) {
            return vec![clipped];
        }
        let mut missing = Vec::new();
        if clipped.start < span.start {
            missing.push(IndexRange::new(clipped.start, span.start));
        }
        if clipped.end > span.end {
            missing.push(IndexRange::new(span.end, clipped.end));
        }
        missing
    }

    /// Merge a fetched or pushed run of items into the window. The run is
    /// clipped to the current bounds; whatever lands must overlap or sit
    /// flush against the span, otherwise contiguity would break.
    pub fn apply_load(
        &mut self,
        start_index: i64,
        incoming: Vec<Value>,
    ) -> Result<IndexRange, WindowError> {
        if incoming.is_empty() {
            return Ok(IndexRange::empty_at(start_index));
        }
        let offered = IndexRange::new(
            start_index,
            start_index.saturating_add(incoming.len() as i64),
        );
        let landed = self.bounds.clip(&offered);
        if landed.is_empty() {
            return Err(WindowError::OutOfBounds {
                range: offered,
                bounds: self.bounds,
            });
        }
        if self.items.is_empty() {
            self.span_start = landed.start;
            self.items.extend(
                incoming
                    .into_iter()
                    .skip((landed.start - offered.start) as usize)
                    .take(landed.len()),
            );
            return Ok(landed);
        }
        let span = self.span();
        if !span.touches(&landed) {
            return Err(WindowError::Disjoint {
                range: landed,
                span,
            });
        }
        let mut below = Vec::new();
        for (offset, item) in incoming.into_iter().enumerate() {
            let index = offered.start + offset as i64;
            if !landed.contains(index) {
                continue;
            }
            if index < span.start {
                below.push(item);
            } else if index < span.end {
                self.items[(index - self.span_start) as usize] = item;
            } else {
                self.items.push_back(item);
            }
        }
        for item in below.into_iter().rev() {
            self.items.push_front(item);
        }
        self.span_start = self.span_start.min(landed.start);
        Ok(landed)
    }

    /// Apply declared ends from a response, evicting whatever the new
    /// bounds strand. Eviction is keyed off the resulting bounds rather
    /// than the shrink flags so that the first constraint of an open end
    /// also clears items that turn out to be out of range.
    pub fn reconcile_bounds(
        &mut self,
        minimum_inclusive: Option<i64>,
        maximum_exclusive: Option<i64>,
    ) -> BoundsOutcome {
        let update = self.bounds.reconcile(minimum_inclusive, maximum_exclusive);
        let mut evicted = Vec::new();
        if let Some(range) = self.trim_front_to(self.bounds.minimum_inclusive()) {
            evicted.push(range);
        }
        if let Some(range) = self.trim_back_to(self.bounds.maximum_exclusive()) {
            evicted.push(range);
        }
        if self.items.is_empty() {
            let minimum = self.bounds.minimum_inclusive();
            let maximum = self.bounds.maximum_exclusive();
            self.span_start = self.span_start.clamp(minimum, maximum.max(minimum));
        }
        BoundsOutcome {
            changed: update.changed,
            shrunk_min: update.shrunk_min,
            shrunk_max: update.shrunk_max,
            evicted,
        }
    }

    /// Insert items at `index`, shifting everything at and above it up.
    /// Valid only inside or flush against the span; a detached insert
    /// would leave a hole.
    pub fn insert_at(&mut self, index: i64, new_items: Vec<Value>) -> Result<IndexRange, WindowError> {
        let span = self.span();
        let count = new_items.len() as i64;
        if index < span.start || index > span.end {
            return Err(WindowError::OutOfSpan {
                target: IndexRange::new(index, index + count),
                span,
            });
        }
        let mut position = (index - self.span_start) as usize;
        for item in new_items {
            self.items.insert(position, item);
            position += 1;
        }
        self.bounds.shift_max(count);
        Ok(IndexRange::new(index, index + count))
    }

    pub fn replace_at(&mut self, index: i64, item: Value) -> Result<IndexRange, WindowError> {
        let span = self.span();
        if !span.contains(index) {
            return Err(WindowError::OutOfSpan {
                target: IndexRange::new(index, index + 1),
                span,
            });
        }
        self.items[(index - self.span_start) as usize] = item;
        Ok(IndexRange::new(index, index + 1))
    }

    /// Delete `[index, index + count)`, shifting everything above it down.
    /// The whole target must be materialized.
    pub fn delete_at(&mut self, index: i64, count: i64) -> Result<IndexRange, WindowError> {
        let target = IndexRange::new(index, index + count);
        let span = self.span();
        if !span.contains_range(&target) {
            return Err(WindowError::OutOfSpan { target, span });
        }
        let from = (index - self.span_start) as usize;
        self.items.drain(from..from + target.len());
        self.bounds.shift_max(-count);
        Ok(target)
    }

    /// Drop materialized items outside `retained`, keeping anything the
    /// host currently has visible. Trims edges only, so the span stays
    /// contiguous.
    pub fn evict_outside(&mut self, retained: &IndexRange) -> Vec<IndexRange> {
        let mut keep = *retained;
        if let Some(visible) = self.visible {
            keep = IndexRange::new(keep.start.min(visible.start), keep.end.max(visible.end));
        }
        let mut evicted = Vec::new();
        if let Some(range) = self.trim_front_to(keep.start) {
            evicted.push(range);
        }
        if let Some(range) = self.trim_back_to(keep.end) {
            evicted.push(range);
        }
        evicted
    }

    fn trim_front_to(&mut self, minimum: i64) -> Option<IndexRange> {
        let span = self.span();
        if span.is_empty() || minimum <= span.start {
            return None;
        }
        let cut = minimum.min(span.end);
        let removed = IndexRange::new(span.start, cut);
        self.items.drain(..removed.len());
        self.span_start = cut;
        Some(removed)
    }

    fn trim_back_to(&mut self, maximum: i64) -> Option<IndexRange> {
        let span = self.span();
        if span.is_empty() || maximum >= span.end {
            return None;
        }
        let cut = maximum.max(span.start);
        let removed = IndexRange::new(cut, span.end);
        let keep = self.items.len() - removed.len();
        self.items.truncate(keep);
        Some(removed)
    }
}
