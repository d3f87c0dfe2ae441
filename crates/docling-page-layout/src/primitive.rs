// Positioned visual atoms
//
// A primitive is one glyph, image, vector path, background fill or synthetic
// separator. Geometry is fixed at creation; classification flags are set by
// the labeling collaborator and propagated by the assembler.

use crate::config::MAX_RULER_SIZE;
use crate::geometry::{BoundingBox, Bounded, PageMargins};
use serde::{Deserialize, Serialize};

/// Stand-in for a non-text object sitting on the text baseline.
pub const OBJECT_CHAR: char = '\u{FFFC}';
/// Opens a superscript run.
pub const SUPER_SCRIPT_START: char = '\u{207D}';
/// Closes a superscript run.
pub const SUPER_SCRIPT_END: char = '\u{207E}';
/// Opens a subscript run.
pub const SUB_SCRIPT_START: char = '\u{208D}';
/// Closes a subscript run.
pub const SUB_SCRIPT_END: char = '\u{208E}';
/// Opens a list identifier (bullet or numbering).
pub const LIST_START: char = '\u{02E1}';
/// Closes a list identifier.
pub const LIST_END: char = '\u{2097}';

const BULLET: char = '\u{2022}';

const ALL_SPACES: &[char] = &[
    '\u{0020}', '\u{00A0}', '\u{1680}', '\u{180E}', '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}',
    '\u{2004}', '\u{2005}', '\u{2006}', '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}', '\u{202F}',
    '\u{205F}', '\u{3000}',
];

const ALL_DOTS: &[char] = &['.', '\u{FF0E}', '\u{0387}', '\u{2024}', '\u{FE52}'];

#[inline]
#[must_use]
pub fn is_space(code: char) -> bool {
    ALL_SPACES.contains(&code)
}

#[inline]
#[must_use]
pub fn is_dot(code: char) -> bool {
    ALL_DOTS.contains(&code)
}

/// ASCII capitals plus Greek capital epsilon, which some fonts map Latin `E` to.
#[inline]
#[must_use]
pub fn is_uppercase_alpha(code: char) -> bool {
    code == '\u{0395}' || code.is_ascii_uppercase()
}

#[inline]
#[must_use]
pub fn is_lowercase_alpha(code: char) -> bool {
    code.is_ascii_lowercase()
}

#[inline]
#[must_use]
pub fn is_decimal_digit(code: char) -> bool {
    code.is_ascii_digit()
}

#[inline]
#[must_use]
pub fn is_alphanumeric(code: char) -> bool {
    code.is_ascii_alphanumeric()
}

/// True for the virtual markers synthesized around scripts and list identifiers.
#[inline]
#[must_use]
pub fn is_marker(code: char) -> bool {
    matches!(
        code,
        SUB_SCRIPT_START | SUB_SCRIPT_END | SUPER_SCRIPT_START | SUPER_SCRIPT_END | LIST_START | LIST_END
    )
}

/// Opaque font identity handed out by the page source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontId(pub u32);

/// Glyph payload of a `Char` primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub code: char,
    pub baseline: f32,
    pub font: Option<FontId>,
    pub font_size: f32,
    pub angle: f32,
    pub italic: bool,
    /// Synthesized by the engine rather than extracted from the page
    pub is_virtual: bool,
}

impl Glyph {
    #[must_use]
    pub fn new(code: char, baseline: f32, font: Option<FontId>, font_size: f32) -> Self {
        Self {
            code,
            baseline,
            font,
            font_size,
            angle: 0.0,
            italic: false,
            is_virtual: false,
        }
    }

    /// Zero-metric virtual glyph used for markers.
    #[must_use]
    pub fn marker(code: char, baseline: f32) -> Self {
        Self {
            is_virtual: true,
            ..Self::new(code, baseline, None, 0.0)
        }
    }

    #[inline]
    #[must_use]
    pub fn is_space(&self) -> bool {
        is_space(self.code)
    }

    #[inline]
    #[must_use]
    pub fn is_dot(&self) -> bool {
        is_dot(self.code)
    }

    #[inline]
    #[must_use]
    pub fn is_alphanumeric(&self) -> bool {
        is_alphanumeric(self.code)
    }

    /// Visible character that may be raised or lowered relative to the line.
    #[inline]
    #[must_use]
    pub fn can_be_super_or_subscript(&self) -> bool {
        self.code > ' ' && self.code != BULLET && !is_marker(self.code)
    }
}

/// Variant tag shared by primitives and lines.
///
/// A line takes the tag of its members, or `None` when they are mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrimitiveType {
    #[default]
    None,
    Image,
    Path,
    VirtualLine,
    Char,
    Background,
}

/// Closed set of primitive variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Char(Glyph),
    Image,
    Path,
    Background,
    VirtualLine,
}

/// Classification labels set by the header/footer/watermark pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemFlags {
    pub header: bool,
    pub footer: bool,
    pub sidebar: bool,
    pub watermark: bool,
    pub repeated: bool,
    /// Page distance to the repetition this item was matched against
    pub repetition_page_offset: i32,
    pub main_content: bool,
}

impl ItemFlags {
    pub fn mark_repeated(&mut self, page_offset: i32) {
        self.repeated = true;
        self.repetition_page_offset = page_offset;
    }
}

/// One positioned visual atom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub bbox: BoundingBox,
    pub kind: PrimitiveKind,
    pub flags: ItemFlags,
}

impl Bounded for Primitive {
    #[inline]
    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl Primitive {
    #[must_use]
    pub fn new(bbox: BoundingBox, kind: PrimitiveKind) -> Self {
        Self {
            bbox,
            kind,
            flags: ItemFlags::default(),
        }
    }

    #[must_use]
    pub fn glyph(bbox: BoundingBox, glyph: Glyph) -> Self {
        Self::new(bbox, PrimitiveKind::Char(glyph))
    }

    #[must_use]
    pub fn image(bbox: BoundingBox) -> Self {
        Self::new(bbox, PrimitiveKind::Image)
    }

    #[must_use]
    pub fn path(bbox: BoundingBox) -> Self {
        Self::new(bbox, PrimitiveKind::Path)
    }

    #[must_use]
    pub fn background(bbox: BoundingBox) -> Self {
        Self::new(bbox, PrimitiveKind::Background)
    }

    #[must_use]
    pub fn virtual_line(bbox: BoundingBox) -> Self {
        Self::new(bbox, PrimitiveKind::VirtualLine)
    }

    #[inline]
    #[must_use]
    pub fn item_type(&self) -> PrimitiveType {
        match self.kind {
            PrimitiveKind::Char(_) => PrimitiveType::Char,
            PrimitiveKind::Image => PrimitiveType::Image,
            PrimitiveKind::Path => PrimitiveType::Path,
            PrimitiveKind::Background => PrimitiveType::Background,
            PrimitiveKind::VirtualLine => PrimitiveType::VirtualLine,
        }
    }

    #[inline]
    #[must_use]
    pub fn glyph_data(&self) -> Option<&Glyph> {
        match &self.kind {
            PrimitiveKind::Char(glyph) => Some(glyph),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn glyph_mut(&mut self) -> Option<&mut Glyph> {
        match &mut self.kind {
            PrimitiveKind::Char(glyph) => Some(glyph),
            _ => None,
        }
    }

    /// Code point of a `Char`, `None` for every other variant.
    #[inline]
    #[must_use]
    pub fn code(&self) -> Option<char> {
        self.glyph_data().map(|glyph| glyph.code)
    }

    #[inline]
    #[must_use]
    pub fn is_char(&self) -> bool {
        matches!(self.kind, PrimitiveKind::Char(_))
    }

    #[inline]
    #[must_use]
    pub fn is_background(&self) -> bool {
        matches!(self.kind, PrimitiveKind::Background)
    }

    #[inline]
    #[must_use]
    pub fn is_virtual_char(&self) -> bool {
        self.glyph_data().is_some_and(|glyph| glyph.is_virtual)
    }

    #[inline]
    #[must_use]
    pub fn is_vertical_ruler(&self) -> bool {
        !self.is_char() && self.bbox.width() < MAX_RULER_SIZE && self.bbox.height() > 8.0
    }

    #[inline]
    #[must_use]
    pub fn is_horizontal_ruler(&self) -> bool {
        !self.is_char()
            && self.bbox.height() < 2.0 * MAX_RULER_SIZE
            && self.bbox.width() > 8.0_f32.max(4.0 * self.bbox.height())
    }

    /// Whether this item belongs on a line with the given band and baseline.
    ///
    /// Virtual separators never conform; glyphs also conform when their
    /// baseline matches the line's within 0.3 units.
    #[must_use]
    pub fn conforms_to_line(&self, ascent: f32, descent: f32, baseline: f32) -> bool {
        match &self.kind {
            PrimitiveKind::VirtualLine => false,
            PrimitiveKind::Char(glyph) => {
                (glyph.baseline - baseline).abs() < 0.3 || self.bbox.conforms_to_band(ascent, descent, baseline)
            }
            _ => self.bbox.conforms_to_band(ascent, descent, baseline),
        }
    }

    /// Same item at the same place on another page; glyphs must also share a code point.
    #[must_use]
    pub fn is_same(&self, margins: &PageMargins, other: &Self, other_margins: &PageMargins) -> bool {
        if let Some(code) = self.code() {
            if other.code() != Some(code) {
                return false;
            }
        }
        self.bbox.is_same(margins, &other.bbox, other_margins)
    }
}
