//! Non-overlapping style intervals over the character buffer.
//!
//! An [`IntervalStore`] keeps half-open `[offset, offset + len)` intervals
//! sorted by offset. Intervals never overlap inside one store; a new
//! interval replaces whatever it covers ("last writer wins") and adjacent
//! intervals with equal payloads coalesce.

use crate::error::{Error, Result};
use crate::style::StyleEffect;
use std::ops::Range;

/// One interval carrying a payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interval<P> {
    pub offset: usize,
    pub len: usize,
    pub payload: P,
}

impl<P> Interval<P> {
    /// Create an interval.
    #[must_use]
    pub const fn new(offset: usize, len: usize, payload: P) -> Self {
        Self {
            offset,
            len,
            payload,
        }
    }

    /// Exclusive end offset.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Character range covered by this interval.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Check if this interval contains a position.
    #[must_use]
    pub const fn contains(&self, pos: usize) -> bool {
        pos >= self.offset && pos < self.end()
    }

    /// Check if this interval intersects a range.
    #[must_use]
    pub const fn overlaps(&self, range: &Range<usize>) -> bool {
        self.offset < range.end && range.start < self.end()
    }
}

/// Ordered set of non-overlapping intervals.
#[derive(Clone, Debug)]
pub struct IntervalStore<P> {
    intervals: Vec<Interval<P>>,
    bound: usize,
}

/// The interval store used for style layers.
pub type OverlayStore = IntervalStore<StyleEffect>;

impl<P> Default for IntervalStore<P> {
    fn default() -> Self {
        Self {
            intervals: Vec::new(),
            bound: 0,
        }
    }
}

impl<P: Clone + PartialEq> IntervalStore<P> {
    /// Create an empty store over a buffer of `bound` characters.
    #[must_use]
    pub const fn new(bound: usize) -> Self {
        Self {
            intervals: Vec::new(),
            bound,
        }
    }

    /// Buffer length intervals are validated against.
    #[must_use]
    pub const fn bound(&self) -> usize {
        self.bound
    }

    /// Reset the buffer length, dropping or clipping intervals beyond it.
    pub fn set_bound(&mut self, bound: usize) {
        self.bound = bound;
        self.intervals.retain(|iv| iv.offset < bound);
        if let Some(last) = self.intervals.last_mut() {
            if last.end() > bound {
                last.len = bound - last.offset;
            }
        }
    }

    /// Number of intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Add an interval, replacing whatever it overlaps.
    pub fn add(&mut self, offset: usize, len: usize, payload: P) -> Result<()> {
        if len == 0 || offset.checked_add(len).is_none_or(|end| end > self.bound) {
            return Err(Error::InvalidInterval {
                offset,
                len,
                bound: self.bound,
            });
        }

        self.carve(offset, offset + len);
        let idx = self.intervals.partition_point(|iv| iv.offset < offset);
        self.intervals.insert(idx, Interval::new(offset, len, payload));
        self.coalesce_around(idx);
        Ok(())
    }

    /// Remove coverage of `[offset, offset + len)`, splitting intervals
    /// that straddle the range edges. Returns whether anything was covered.
    pub fn remove(&mut self, offset: usize, len: usize) -> Result<bool> {
        if offset.checked_add(len).is_none_or(|end| end > self.bound) {
            return Err(Error::InvalidInterval {
                offset,
                len,
                bound: self.bound,
            });
        }
        Ok(len > 0 && self.carve(offset, offset + len))
    }

    /// Remove one interval equal to `interval`. Returns whether it existed.
    pub fn remove_exact(&mut self, interval: &Interval<P>) -> bool {
        let Some(idx) = self.intervals.iter().position(|iv| iv == interval) else {
            return false;
        };
        self.intervals.remove(idx);
        true
    }

    /// Remove all intervals.
    pub fn clear(&mut self) {
        self.intervals.clear();
    }

    /// The interval containing `offset`, if any.
    #[must_use]
    pub fn query_at(&self, offset: usize) -> Option<&Interval<P>> {
        let idx = self.intervals.partition_point(|iv| iv.end() <= offset);
        self.intervals.get(idx).filter(|iv| iv.contains(offset))
    }

    /// Iterate intervals in offset order. Each call starts a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = &Interval<P>> + '_ {
        self.intervals.iter()
    }

    /// Iterate intervals intersecting `range`, in offset order.
    pub fn in_range(&self, range: Range<usize>) -> impl Iterator<Item = &Interval<P>> + '_ {
        let start = self.intervals.partition_point(|iv| iv.end() <= range.start);
        self.intervals[start..]
            .iter()
            .take_while(move |iv| iv.offset < range.end)
    }

    /// Account for `count` characters inserted at `at`.
    ///
    /// Intervals after the insertion point move right; an interval strictly
    /// containing it grows.
    pub fn on_insert(&mut self, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        for iv in &mut self.intervals {
            if iv.offset >= at {
                iv.offset += count;
            } else if at < iv.end() {
                iv.len += count;
            }
        }
        self.bound += count;
    }

    /// Account for `count` characters deleted at `at`.
    ///
    /// Intervals inside the deleted range disappear, straddling ones shrink
    /// and later ones move left.
    pub fn on_delete(&mut self, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        let end = at + count;
        self.intervals.retain_mut(|iv| {
            let start = iv.offset;
            let stop = iv.end();
            let kept_before = start.min(at)..stop.min(at);
            let kept_after = start.max(end)..stop.max(end);
            let kept = kept_before.len() + kept_after.len();
            if kept == 0 {
                return false;
            }
            iv.offset = if start < at { start } else { start.max(end) - count };
            iv.len = kept;
            true
        });
        self.bound = self.bound.saturating_sub(count);
        let mut idx = 1;
        while idx < self.intervals.len() {
            idx = self.coalesce_around(idx) + 1;
        }
    }

    /// Cut `[start, end)` out of every interval. Returns whether anything changed.
    fn carve(&mut self, start: usize, end: usize) -> bool {
        let first = self.intervals.partition_point(|iv| iv.end() <= start);
        let mut changed = false;
        let mut idx = first;
        while idx < self.intervals.len() && self.intervals[idx].offset < end {
            changed = true;
            let iv = &self.intervals[idx];
            let (iv_start, iv_end) = (iv.offset, iv.end());
            let head = (iv_start < start)
                .then(|| Interval::new(iv_start, start - iv_start, iv.payload.clone()));
            let tail = (iv_end > end).then(|| Interval::new(end, iv_end - end, iv.payload.clone()));
            self.intervals.remove(idx);
            if let Some(head) = head {
                self.intervals.insert(idx, head);
                idx += 1;
            }
            if let Some(tail) = tail {
                self.intervals.insert(idx, tail);
                idx += 1;
            }
        }
        changed
    }

    /// Merge the interval at `idx` with equal adjacent neighbours.
    /// Returns the index the merged interval ends up at.
    fn coalesce_around(&mut self, mut idx: usize) -> usize {
        if idx + 1 < self.intervals.len() {
            let (cur, next) = (&self.intervals[idx], &self.intervals[idx + 1]);
            if cur.end() == next.offset && cur.payload == next.payload {
                let extra = next.len;
                self.intervals[idx].len += extra;
                self.intervals.remove(idx + 1);
            }
        }
        if idx > 0 {
            let (prev, cur) = (&self.intervals[idx - 1], &self.intervals[idx]);
            if prev.end() == cur.offset && prev.payload == cur.payload {
                let extra = cur.len;
                self.intervals[idx - 1].len += extra;
                self.intervals.remove(idx);
                idx -= 1;
            }
        }
        idx
    }
}

/// Identifier of an overlay layer. Layers cascade in ascending id order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub usize);

impl LayerId {
    /// Base styling (markup of the text itself).
    pub const BASE: Self = Self(0);
    /// Selection highlight.
    pub const SELECTION: Self = Self(1);
    /// Search-result highlight.
    pub const HIGHLIGHT: Self = Self(2);
    /// Number of stock layers every controller starts with.
    pub const STOCK_COUNT: usize = 3;
}
