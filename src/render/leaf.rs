//! Splitting lines into uniformly styled draw runs.

use crate::layout::LineDescriptor;
use crate::style::{StyleDescriptor, StyleResolver};
use std::collections::HashMap;
use std::ops::Range;

/// One draw run: a character range of one line in one style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderLeaf {
    /// Index of the line in the controller's line table.
    pub line: usize,
    /// Window offsets of the characters drawn.
    pub range: Range<usize>,
    /// Index into [`LeafSet::styles`].
    pub style: usize,
    /// Left edge relative to the line origin.
    pub x: u32,
    pub width: u32,
    /// Substituted glyphs drawn instead of the buffer character; empty
    /// text draws nothing.
    pub text: Option<String>,
}

/// Leaves of a render pass plus the arena of styles they reference.
#[derive(Clone, Debug, Default)]
pub struct LeafSet {
    pub styles: Vec<StyleDescriptor>,
    pub leaves: Vec<RenderLeaf>,
    index: HashMap<StyleDescriptor, usize>,
}

impl LeafSet {
    /// Build leaves for `line_range`, clipped to the characters in `window`.
    ///
    /// Leaves break at style changes and around every substituted
    /// character. On justified lines every space gets its own leaf so
    /// words keep their natural spacing.
    #[must_use]
    pub fn build(
        lines: &[LineDescriptor],
        line_range: Range<usize>,
        window: &Range<usize>,
        chars: &[char],
        resolver: &StyleResolver<'_>,
        widths: &[u32],
    ) -> Self {
        let mut set = Self::default();
        for line_index in line_range {
            let Some(line) = lines.get(line_index) else {
                break;
            };
            let visible = line.offset.max(window.start)..line.end().min(window.end);
            if visible.is_empty() {
                continue;
            }
            let advances = line.advances(widths);
            let mut x: u32 = advances[..visible.start - line.offset].iter().sum();

            for run in resolver.runs(visible) {
                let style = set.intern(run.style);
                let mut start = run.range.start;
                for idx in run.range.clone() {
                    let sub = line.substitution(idx);
                    let lone_space = line.is_justified() && chars.get(idx) == Some(&' ');
                    if sub.is_none() && !lone_space {
                        continue;
                    }
                    x = set.push(line_index, line, &advances, start..idx, style, x, None);
                    let text = sub.map(|sub| sub.text.clone());
                    x = set.push(line_index, line, &advances, idx..idx + 1, style, x, text);
                    start = idx + 1;
                }
                x = set.push(line_index, line, &advances, start..run.range.end, style, x, None);
            }
        }
        set
    }

    fn intern(&mut self, style: StyleDescriptor) -> usize {
        if let Some(&idx) = self.index.get(&style) {
            return idx;
        }
        let idx = self.styles.len();
        self.styles.push(style);
        self.index.insert(style, idx);
        idx
    }

    /// Append a leaf unless `range` is empty; returns the new pen position.
    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        line_index: usize,
        line: &LineDescriptor,
        advances: &[u32],
        range: Range<usize>,
        style: usize,
        x: u32,
        text: Option<String>,
    ) -> u32 {
        if range.is_empty() {
            return x;
        }
        let width = advances[range.start - line.offset..range.end - line.offset]
            .iter()
            .sum();
        self.leaves.push(RenderLeaf {
            line: line_index,
            range,
            style,
            x,
            width,
            text,
        });
        x + width
    }

    /// Style of a leaf.
    #[must_use]
    pub fn style_of(&self, leaf: &RenderLeaf) -> &StyleDescriptor {
        &self.styles[leaf.style]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::layout::{LineFlags, Substitution};
    use crate::style::StyleEffect;
    use crate::text::OverlayStore;

    fn line(offset: usize, len: usize) -> LineDescriptor {
        LineDescriptor {
            offset,
            len,
            width: len as u32 * 10,
            height: 12,
            ..LineDescriptor::default()
        }
    }

    #[test]
    fn test_leaves_split_at_style_changes() {
        let chars: Vec<char> = "abcdef".chars().collect();
        let root = StyleDescriptor::base(&StyleEffect::new());
        let mut layer = OverlayStore::new(6);
        layer
            .add(2, 2, StyleEffect::new().with_color(Rgba::RED))
            .unwrap();
        let layers = vec![layer];
        let resolver = StyleResolver::from_layers(&root, &layers);
        let lines = vec![line(0, 6)];

        let set = LeafSet::build(&lines, 0..1, &(0..6), &chars, &resolver, &[10; 6]);
        let ranges: Vec<_> = set.leaves.iter().map(|l| l.range.clone()).collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..6]);
        assert_eq!(set.leaves[1].x, 20);
        // Equal styles share one arena slot.
        assert_eq!(set.styles.len(), 2);
        assert_eq!(set.leaves[0].style, set.leaves[2].style);
    }

    #[test]
    fn test_leaves_split_around_substitutions() {
        let chars: Vec<char> = "a\tb".chars().collect();
        let root = StyleDescriptor::base(&StyleEffect::new());
        let resolver = StyleResolver::new(&root);
        let mut tabbed = line(0, 3);
        tabbed.substitutions = Some(vec![Substitution {
            index: 1,
            text: "    ".to_string(),
            width: 40,
        }]);
        let lines = vec![tabbed];

        let set = LeafSet::build(&lines, 0..1, &(0..3), &chars, &resolver, &[10; 3]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.leaves[1].text.as_deref(), Some("    "));
        assert_eq!(set.leaves[1].width, 40);
        assert_eq!(set.leaves[2].x, 50);
    }

    #[test]
    fn test_justified_spaces_are_lone_leaves() {
        let chars: Vec<char> = "ab cd".chars().collect();
        let root = StyleDescriptor::base(&StyleEffect::new());
        let resolver = StyleResolver::new(&root);
        let mut justified = line(0, 5);
        justified.char_widths = Some(vec![10, 10, 25, 10, 10]);
        justified.flags = LineFlags::JUSTIFIED;
        let lines = vec![justified];

        let set = LeafSet::build(&lines, 0..1, &(0..5), &chars, &resolver, &[10; 5]);
        let spans: Vec<_> = set.leaves.iter().map(|l| (l.x, l.width)).collect();
        assert_eq!(spans, vec![(0, 20), (20, 25), (45, 20)]);
    }

    #[test]
    fn test_char_window_clips_leaves() {
        let chars: Vec<char> = "abcdef".chars().collect();
        let root = StyleDescriptor::base(&StyleEffect::new());
        let resolver = StyleResolver::new(&root);
        let lines = vec![line(0, 6)];
        let set = LeafSet::build(&lines, 0..1, &(2..4), &chars, &resolver, &[10; 6]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.leaves[0].range, 2..4);
        assert_eq!(set.leaves[0].x, 20);
    }
}
