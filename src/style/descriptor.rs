//! Resolved style of one rendering run.

use super::{
    Attr, FigureRef, FontSpec, MaskRef, Scope, Spacing, StyleEffect, TextColor, VerticalShift,
};

/// Resolved, immutable view of the style of one run.
///
/// A descriptor is never mutated: merging produces a new one. Attributes
/// that no layer defined fall back to [`StyleEffect::DEFAULTS`] through the
/// accessors, while [`defined`](Self::defined) still reports them as
/// undefined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StyleDescriptor {
    effect: StyleEffect,
}

impl StyleDescriptor {
    /// Wrap an already merged effect.
    #[must_use]
    pub const fn new(effect: StyleEffect) -> Self {
        Self { effect }
    }

    /// Resolve a text style against the defaults, keeping its scope.
    #[must_use]
    pub fn base(text_style: &StyleEffect) -> Self {
        let mut effect = StyleEffect::DEFAULTS.merge(text_style);
        effect.scope = text_style.scope;
        Self { effect }
    }

    /// The underlying merged effect.
    #[must_use]
    pub const fn effect(&self) -> &StyleEffect {
        &self.effect
    }

    /// Produce a new descriptor with `upper` cascaded on top.
    #[must_use]
    pub fn merge(&self, upper: &StyleEffect) -> Self {
        Self {
            effect: self.effect.merge(upper),
        }
    }

    /// Resolved font reference.
    #[must_use]
    pub fn font(&self) -> FontSpec {
        let defaults = FontSpec::DEFAULT;
        FontSpec {
            face: self.effect.face.unwrap_or(defaults.face),
            style: self.effect.style.unwrap_or(defaults.style),
            size: self.effect.size.unwrap_or(defaults.size),
        }
    }

    /// Resolved glyph color.
    #[must_use]
    pub fn color(&self) -> TextColor {
        self.effect.color.unwrap_or_default()
    }

    /// Glyph mask, if one is active.
    #[must_use]
    pub fn mask(&self) -> Option<MaskRef> {
        self.effect.mask.filter(|mask| !mask.is_none())
    }

    /// Background figure, if one is active.
    #[must_use]
    pub fn figure(&self) -> Option<FigureRef> {
        self.effect.figure.filter(|figure| !figure.is_none())
    }

    /// Extra pixels around each character.
    #[must_use]
    pub fn spacing(&self) -> Spacing {
        self.effect.spacing.unwrap_or(Spacing::ZERO)
    }

    /// Vertical shift, if one moves glyphs.
    #[must_use]
    pub fn shift(&self) -> Option<VerticalShift> {
        self.effect.shift.filter(|shift| !shift.is_identity())
    }

    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.effect.scope
    }

    /// Attributes defined by some layer in the cascade.
    #[must_use]
    pub fn defined(&self) -> Attr {
        self.effect.defined()
    }

    /// True if any attribute stayed undefined after merging.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.effect.is_incomplete()
    }

    /// True if drawing this run needs more than a plain glyph draw.
    #[must_use]
    pub fn has_effects(&self) -> bool {
        self.mask().is_some()
            || self.figure().is_some()
            || self.shift().is_some()
            || matches!(self.color(), TextColor::Function(_))
    }
}
