//! Style effects, cascading merge and resolved descriptors.
//!
//! This module provides the style model consumed by layout and rendering:
//!
//! - [`StyleEffect`]: an overlay payload where every attribute is optional
//!   (`None` means "inherit from the layer below")
//! - [`StyleDescriptor`]: the resolved, immutable style of one run
//! - [`StyleResolver`]: cascades overlay layers at an offset
//!
//! # Examples
//!
//! ```
//! use textfx::style::{Scope, StyleDescriptor, StyleEffect};
//! use textfx::Rgba;
//!
//! let base = StyleDescriptor::base(&StyleEffect::new().with_scope(Scope::Line));
//! let merged = base.merge(&StyleEffect::new().with_color(Rgba::RED));
//!
//! // The root scope survives, the override color wins.
//! assert_eq!(merged.scope(), Scope::Line);
//! assert_eq!(merged.color(), textfx::style::TextColor::Solid(Rgba::RED));
//! ```

mod descriptor;
mod resolver;

pub use descriptor::StyleDescriptor;
pub use resolver::{StyleResolver, StyleRun};

use crate::color::Rgba;
use crate::error::{Error, Result};
use bitflags::bitflags;

bitflags! {
    /// Font style flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct FontStyle: u8 {
        /// Bold weight.
        const BOLD       = 0x01;
        /// Italic slant.
        const ITALIC     = 0x02;
        /// Underlined glyphs.
        const UNDERLINED = 0x04;
    }
}

bitflags! {
    /// Style attributes that a layer may define or leave transparent.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct Attr: u16 {
        const FACE    = 0x0001;
        const STYLE   = 0x0002;
        const SIZE    = 0x0004;
        const COLOR   = 0x0008;
        const MASK    = 0x0010;
        const FIGURE  = 0x0020;
        const SPACING = 0x0040;
        const SHIFT   = 0x0080;
    }
}

impl Attr {
    /// The attributes that make up a font.
    pub const FONT: Self = Self::FACE.union(Self::STYLE).union(Self::SIZE);
}

/// Font family class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontFace {
    #[default]
    System,
    Monospace,
    Proportional,
}

/// Font size class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// A concrete font reference: face, style and size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontSpec {
    pub face: FontFace,
    pub style: FontStyle,
    pub size: FontSize,
}

impl FontSpec {
    /// System face, plain style, medium size.
    pub const DEFAULT: Self = Self {
        face: FontFace::System,
        style: FontStyle::empty(),
        size: FontSize::Medium,
    };

    /// Create a font reference.
    #[must_use]
    pub const fn new(face: FontFace, style: FontStyle, size: FontSize) -> Self {
        Self { face, style, size }
    }

    /// Check if the bold flag is set.
    #[must_use]
    pub const fn is_bold(&self) -> bool {
        self.style.contains(FontStyle::BOLD)
    }
}

/// Granularity a style effect applies at.
///
/// Only background figures are painted differently per scope: character
/// and word scopes paint behind each run, line scope behind the whole
/// line, paragraph and text scopes once behind the covered block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    #[default]
    Char,
    Word,
    Line,
    Paragraph,
    Text,
}

impl Scope {
    /// Stable numeric code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Char => 0,
            Self::Word => 1,
            Self::Line => 2,
            Self::Paragraph => 3,
            Self::Text => 4,
        }
    }
}

impl TryFrom<u8> for Scope {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Char),
            1 => Ok(Self::Word),
            2 => Ok(Self::Line),
            3 => Ok(Self::Paragraph),
            4 => Ok(Self::Text),
            _ => Err(Error::InvalidConfig(format!("unknown scope code {code}"))),
        }
    }
}

/// Opaque reference to a color function owned by the graphics sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorFnRef(pub u32);

/// Opaque reference to a glyph mask owned by the figure/mask painter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaskRef(pub u32);

impl MaskRef {
    /// Explicitly "no mask"; lets an upper layer cancel a lower mask.
    pub const NONE: Self = Self(0);

    /// Check if this is the explicit "no mask" reference.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Opaque reference to a background figure owned by the figure painter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FigureRef(pub u32);

impl FigureRef {
    /// Explicitly "no figure"; lets an upper layer cancel a lower figure.
    pub const NONE: Self = Self(0);

    /// Check if this is the explicit "no figure" reference.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Glyph color: a solid color or a sink-side color function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextColor {
    Solid(Rgba),
    Function(ColorFnRef),
}

impl Default for TextColor {
    fn default() -> Self {
        Self::Solid(Rgba::BLACK)
    }
}

/// Extra pixels added on each side of every character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Spacing {
    pub left: u16,
    pub right: u16,
}

impl Spacing {
    pub const ZERO: Self = Self { left: 0, right: 0 };

    /// Total horizontal padding per character.
    #[must_use]
    pub const fn total(self) -> u32 {
        self.left as u32 + self.right as u32
    }
}

/// Per-character vertical displacement applied while drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VerticalShift {
    /// Constant offset (negative raises the glyph).
    Rise(i32),
    /// Triangle wave over the character index.
    Wave { amplitude: u16, period: u16 },
}

impl VerticalShift {
    /// Vertical offset of the character at `index`.
    #[must_use]
    pub fn offset(self, index: usize) -> i32 {
        match self {
            Self::Rise(dy) => dy,
            Self::Wave { amplitude, period } => {
                let period = usize::from(period.max(1));
                let phase = index % (2 * period);
                let tri = if phase < period {
                    phase
                } else {
                    2 * period - phase
                };
                (usize::from(amplitude) * tri / period) as i32
            }
        }
    }

    /// Check if this shift never moves a glyph.
    #[must_use]
    pub const fn is_identity(self) -> bool {
        match self {
            Self::Rise(dy) => dy == 0,
            Self::Wave { amplitude, .. } => amplitude == 0,
        }
    }
}

/// One overlay payload.
///
/// Every attribute is optional: `Some` defines it explicitly, `None` leaves
/// it transparent so the value from the layer below shows through. The
/// scope is never inherited from an upper layer; see [`StyleEffect::merge`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StyleEffect {
    pub face: Option<FontFace>,
    pub style: Option<FontStyle>,
    pub size: Option<FontSize>,
    pub color: Option<TextColor>,
    pub mask: Option<MaskRef>,
    pub figure: Option<FigureRef>,
    pub spacing: Option<Spacing>,
    pub shift: Option<VerticalShift>,
    pub scope: Scope,
}

impl StyleEffect {
    /// Fully transparent character-scoped effect.
    pub const EMPTY: Self = Self {
        face: None,
        style: None,
        size: None,
        color: None,
        mask: None,
        figure: None,
        spacing: None,
        shift: None,
        scope: Scope::Char,
    };

    /// Fully defined defaults every base style cascades onto.
    pub const DEFAULTS: Self = Self {
        face: Some(FontFace::System),
        style: Some(FontStyle::empty()),
        size: Some(FontSize::Medium),
        color: Some(TextColor::Solid(Rgba::BLACK)),
        mask: Some(MaskRef::NONE),
        figure: Some(FigureRef::NONE),
        spacing: Some(Spacing::ZERO),
        shift: Some(VerticalShift::Rise(0)),
        scope: Scope::Char,
    };

    /// Create a transparent effect.
    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Define all three font attributes at once.
    #[must_use]
    pub const fn with_font(self, font: FontSpec) -> Self {
        Self {
            face: Some(font.face),
            style: Some(font.style),
            size: Some(font.size),
            ..self
        }
    }

    #[must_use]
    pub const fn with_face(self, face: FontFace) -> Self {
        Self {
            face: Some(face),
            ..self
        }
    }

    #[must_use]
    pub const fn with_font_style(self, style: FontStyle) -> Self {
        Self {
            style: Some(style),
            ..self
        }
    }

    /// Shorthand for a bold font style.
    #[must_use]
    pub const fn bold(self) -> Self {
        self.with_font_style(FontStyle::BOLD)
    }

    #[must_use]
    pub const fn with_size(self, size: FontSize) -> Self {
        Self {
            size: Some(size),
            ..self
        }
    }

    /// Define a solid glyph color.
    #[must_use]
    pub const fn with_color(self, color: Rgba) -> Self {
        Self {
            color: Some(TextColor::Solid(color)),
            ..self
        }
    }

    /// Define a color function resolved by the graphics sink.
    #[must_use]
    pub const fn with_color_fn(self, function: ColorFnRef) -> Self {
        Self {
            color: Some(TextColor::Function(function)),
            ..self
        }
    }

    #[must_use]
    pub const fn with_mask(self, mask: MaskRef) -> Self {
        Self {
            mask: Some(mask),
            ..self
        }
    }

    #[must_use]
    pub const fn with_figure(self, figure: FigureRef) -> Self {
        Self {
            figure: Some(figure),
            ..self
        }
    }

    #[must_use]
    pub const fn with_spacing(self, left: u16, right: u16) -> Self {
        Self {
            spacing: Some(Spacing { left, right }),
            ..self
        }
    }

    #[must_use]
    pub const fn with_shift(self, shift: VerticalShift) -> Self {
        Self {
            shift: Some(shift),
            ..self
        }
    }

    #[must_use]
    pub const fn with_scope(self, scope: Scope) -> Self {
        Self { scope, ..self }
    }

    /// Attributes this effect defines explicitly.
    #[must_use]
    pub fn defined(&self) -> Attr {
        let mut attrs = Attr::empty();
        attrs.set(Attr::FACE, self.face.is_some());
        attrs.set(Attr::STYLE, self.style.is_some());
        attrs.set(Attr::SIZE, self.size.is_some());
        attrs.set(Attr::COLOR, self.color.is_some());
        attrs.set(Attr::MASK, self.mask.is_some());
        attrs.set(Attr::FIGURE, self.figure.is_some());
        attrs.set(Attr::SPACING, self.spacing.is_some());
        attrs.set(Attr::SHIFT, self.shift.is_some());
        attrs
    }

    /// True if any attribute is still undefined.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        !self.defined().is_all()
    }

    /// True if no attribute is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defined().is_empty()
    }

    /// Cascade `upper` onto `self`.
    ///
    /// Attributes defined by `upper` replace the ones below; undefined
    /// attributes keep this effect's value and definedness. Masks and
    /// figures are replaced wholesale. The result keeps `self.scope`:
    /// two different scopes never combine into a new one.
    #[must_use]
    pub fn merge(&self, upper: &Self) -> Self {
        Self {
            face: upper.face.or(self.face),
            style: upper.style.or(self.style),
            size: upper.size.or(self.size),
            color: upper.color.or(self.color),
            mask: upper.mask.or(self.mask),
            figure: upper.figure.or(self.figure),
            spacing: upper.spacing.or(self.spacing),
            shift: upper.shift.or(self.shift),
            scope: self.scope,
        }
    }
}
