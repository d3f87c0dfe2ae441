// Font metrics collaborator
//
// Glyph advances are only needed to re-synthesize word spacing. When no
// metrics are known for a font the glyph's own box width is used instead.

use crate::primitive::{FontId, Glyph};
use crate::geometry::BoundingBox;

/// Glyph metric lookup supplied by the document parser.
pub trait FontMetrics {
    /// Advance of the glyph box for `code` in `font`, in 1/1000 em units.
    fn glyph_box_advance(&self, font: FontId, code: char) -> Option<f32>;
}

impl<T: FontMetrics + ?Sized> FontMetrics for &T {
    #[inline]
    fn glyph_box_advance(&self, font: FontId, code: char) -> Option<f32> {
        (**self).glyph_box_advance(font, code)
    }
}

/// Metrics source that knows no fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFontMetrics;

impl FontMetrics for NoFontMetrics {
    #[inline]
    fn glyph_box_advance(&self, _font: FontId, _code: char) -> Option<f32> {
        None
    }
}

/// Advance in 1/1000 em, falling back to the measured box width.
pub(crate) fn glyph_box_advance(metrics: &dyn FontMetrics, glyph: &Glyph, bbox: &BoundingBox) -> f32 {
    glyph
        .font
        .and_then(|font| metrics.glyph_box_advance(font, glyph.code))
        .unwrap_or_else(|| {
            if glyph.font_size > 0.0 {
                bbox.width() * 1000.0 / glyph.font_size
            } else {
                0.0
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f32);

    impl FontMetrics for Fixed {
        fn glyph_box_advance(&self, _font: FontId, _code: char) -> Option<f32> {
            Some(self.0)
        }
    }

    #[test]
    fn test_fallback_uses_box_width() {
        let glyph = Glyph::new('a', 10.0, Some(FontId(3)), 10.0);
        let bbox = BoundingBox::new(0.0, 0.0, 5.0, 10.0);
        assert!((glyph_box_advance(&NoFontMetrics, &glyph, &bbox) - 500.0).abs() < 1e-3);
        assert!((glyph_box_advance(&Fixed(600.0), &glyph, &bbox) - 600.0).abs() < 1e-3);
    }

    #[test]
    fn test_fallback_without_font_size() {
        let glyph = Glyph::marker('x', 0.0);
        let bbox = BoundingBox::new(0.0, 0.0, 5.0, 10.0);
        assert_eq!(glyph_box_advance(&NoFontMetrics, &glyph, &bbox), 0.0);
    }
}
