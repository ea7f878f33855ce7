//! Cascading style resolution across overlay layers.

use super::StyleDescriptor;
use crate::text::OverlayStore;
use std::ops::Range;

/// A maximal character range sharing one resolved style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRun {
    pub range: Range<usize>,
    pub style: StyleDescriptor,
}

/// Resolves the style at an offset by folding every layer, base first,
/// onto the root descriptor.
///
/// The resolver only borrows the layers for the duration of one layout or
/// render pass. For an unchanged set of layers, `resolve` always returns
/// descriptors with equal content.
#[derive(Clone, Debug)]
pub struct StyleResolver<'a> {
    root: &'a StyleDescriptor,
    layers: Vec<&'a OverlayStore>,
}

impl<'a> StyleResolver<'a> {
    /// Create a resolver with no overlay layers.
    #[must_use]
    pub const fn new(root: &'a StyleDescriptor) -> Self {
        Self {
            root,
            layers: Vec::new(),
        }
    }

    /// Create a resolver over a slice of layers, lowest first.
    #[must_use]
    pub fn from_layers(root: &'a StyleDescriptor, layers: &'a [OverlayStore]) -> Self {
        Self {
            root,
            layers: layers.iter().collect(),
        }
    }

    /// The root descriptor every resolution starts from.
    #[must_use]
    pub const fn root(&self) -> &StyleDescriptor {
        self.root
    }

    /// Resolve the style at `offset`.
    #[must_use]
    pub fn resolve(&self, offset: usize) -> StyleDescriptor {
        self.layers
            .iter()
            .filter_map(|layer| layer.query_at(offset))
            .fold(*self.root, |style, interval| style.merge(&interval.payload))
    }

    /// True if no layer has an interval intersecting `range`.
    #[must_use]
    pub fn is_plain(&self, range: &Range<usize>) -> bool {
        self.layers
            .iter()
            .all(|layer| layer.in_range(range.clone()).next().is_none())
    }

    /// Offsets inside `range` where the style may change, including both ends.
    #[must_use]
    pub fn boundaries(&self, range: &Range<usize>) -> Vec<usize> {
        let mut points = vec![range.start, range.end];
        for layer in &self.layers {
            for interval in layer.in_range(range.clone()) {
                if interval.offset > range.start {
                    points.push(interval.offset);
                }
                if interval.end() < range.end {
                    points.push(interval.end());
                }
            }
        }
        points.sort_unstable();
        points.dedup();
        points
    }

    /// Split `range` into maximal runs of identical resolved style.
    ///
    /// An empty range yields no runs.
    #[must_use]
    pub fn runs(&self, range: Range<usize>) -> Vec<StyleRun> {
        if range.is_empty() {
            return Vec::new();
        }
        if self.is_plain(&range) {
            return vec![StyleRun {
                range,
                style: *self.root,
            }];
        }

        let points = self.boundaries(&range);
        let mut runs: Vec<StyleRun> = Vec::with_capacity(points.len());
        for pair in points.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let style = self.resolve(start);
            match runs.last_mut() {
                Some(last) if last.style == style && last.range.end == start => {
                    last.range.end = end;
                }
                _ => runs.push(StyleRun {
                    range: start..end,
                    style,
                }),
            }
        }
        runs
    }
}
