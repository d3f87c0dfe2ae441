// Page geometry primitives
//
// Every positioned entity carries two vertical bands: the loose band
// (y0 = ascent, y1 = descent) and the tight ink band (top, bottom). Horizontal
// extent is shared. Coordinates are page units with y growing downwards.

#![allow(clippy::float_cmp)]

use serde::{Deserialize, Serialize};

/// Axis-aligned box with a loose and a tight vertical band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x0: f32,
    /// Loose top edge (ascent)
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Loose bottom edge (descent)
    pub y1: f32,
    /// Tight (ink) top edge
    pub top: f32,
    /// Tight (ink) bottom edge
    pub bottom: f32,
}

impl Default for BoundingBox {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// Box whose loose and tight bands coincide.
    #[inline]
    #[must_use]
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            top: y0,
            bottom: y1,
        }
    }

    /// Box with distinct tight and loose vertical bands.
    #[inline]
    #[must_use]
    pub const fn with_bands(x0: f32, top: f32, x1: f32, bottom: f32, ascent: f32, descent: f32) -> Self {
        Self {
            x0,
            y0: ascent,
            x1,
            y1: descent,
            top,
            bottom,
        }
    }

    /// Inverted box; the identity element of [`BoundingBox::union_with`].
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            x0: f32::MAX,
            y0: f32::MAX,
            x1: -f32::MAX,
            y1: -f32::MAX,
            top: f32::MAX,
            bottom: -f32::MAX,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    #[inline]
    #[must_use]
    pub fn tight_height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    #[must_use]
    pub fn center_x(&self) -> f32 {
        0.5 * (self.x0 + self.x1)
    }

    /// Vertical center of the tight band.
    #[inline]
    #[must_use]
    pub fn center_y(&self) -> f32 {
        0.5 * (self.top + self.bottom)
    }

    #[inline]
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Grow in place to cover `other` (both bands).
    #[inline]
    pub fn union_with(&mut self, other: &Self) {
        self.x0 = self.x0.min(other.x0);
        self.top = self.top.min(other.top);
        self.x1 = self.x1.max(other.x1);
        self.bottom = self.bottom.max(other.bottom);
        self.y0 = self.y0.min(other.y0);
        self.y1 = self.y1.max(other.y1);
    }

    #[inline]
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut result = *self;
        result.union_with(other);
        result
    }

    /// Shrink in place to the common part with `other` (both bands).
    #[inline]
    pub fn intersect_with(&mut self, other: &Self) {
        self.x0 = self.x0.max(other.x0);
        self.top = self.top.max(other.top);
        self.x1 = self.x1.min(other.x1);
        self.bottom = self.bottom.min(other.bottom);
        self.y0 = self.y0.max(other.y0);
        self.y1 = self.y1.min(other.y1);
    }

    #[inline]
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = *self;
        result.intersect_with(other);
        result
    }

    /// Emptiness is judged on the tight box.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.top >= self.bottom
    }

    /// A box that was never grown from [`BoundingBox::empty`].
    #[inline]
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.x0 > self.x1 && self.y0 > self.y1
    }

    #[inline]
    #[must_use]
    pub fn is_very_thin(&self) -> bool {
        self.tight_height() > 4.0 * self.width()
    }

    #[inline]
    #[must_use]
    pub fn is_very_fat(&self) -> bool {
        self.width() > 4.0 * self.tight_height()
    }

    /// True when `other` lies inside `self`, allowing `margin` of slack per axis.
    ///
    /// A negative margin tolerates `other` sticking out by that amount.
    #[inline]
    #[must_use]
    pub fn contains(&self, other: &Self, margin: f32) -> bool {
        let inter = self.intersection(other);
        inter.width() >= other.width() + margin && inter.height() >= other.height() + margin
    }

    #[inline]
    #[must_use]
    pub fn touches(&self, other: &Self) -> bool {
        !self.intersection(other).is_empty()
    }

    #[inline]
    #[must_use]
    pub fn horz_overlap(&self, other: &Self) -> f32 {
        self.x1.min(other.x1) - self.x0.max(other.x0)
    }

    /// Overlap of the loose bands.
    #[inline]
    #[must_use]
    pub fn vert_overlap(&self, other: &Self) -> f32 {
        self.y1.min(other.y1) - self.y0.max(other.y0)
    }

    /// Overlap of the tight bands.
    #[inline]
    #[must_use]
    pub fn tight_vert_overlap(&self, other: &Self) -> f32 {
        self.bottom.min(other.bottom) - self.top.max(other.top)
    }

    /// Gap between two boxes laid out horizontally.
    ///
    /// Spans from the leftmost right edge to the rightmost left edge and covers
    /// both tight bands vertically; empty when the boxes overlap horizontally.
    #[must_use]
    pub fn horz_spacer(&self, other: &Self) -> Self {
        let top = self.top.min(other.top);
        let bottom = self.bottom.max(other.bottom);
        Self::with_bands(
            self.x1.min(other.x1),
            top,
            self.x0.max(other.x0),
            bottom,
            top,
            bottom,
        )
    }

    /// Gap between two boxes stacked vertically.
    #[must_use]
    pub fn vert_spacer(&self, other: &Self) -> Self {
        let top = self.y1.min(other.y1);
        let bottom = self.y0.max(other.y0);
        Self::with_bands(
            self.x0.min(other.x0),
            top,
            self.x1.max(other.x1),
            bottom,
            top,
            bottom,
        )
    }

    /// Geometric part of line conformance: the box sits inside the band, or
    /// matches its height within 10% with the baseline passing through it.
    #[must_use]
    pub fn conforms_to_band(&self, ascent: f32, descent: f32, baseline: f32) -> bool {
        if self.y0 >= ascent && self.y1 <= descent {
            return true;
        }
        let line_height = descent - ascent;
        if (line_height - self.height()).abs() > 0.1 * line_height {
            return false;
        }
        baseline > self.y0 && baseline < self.y1
    }

    /// Same position on two pages, either absolutely or relative to the page margins.
    #[must_use]
    pub fn is_same(&self, margins: &PageMargins, other: &Self, other_margins: &PageMargins) -> bool {
        const MAX_ACCEPTABLE_OFFSET: f32 = 0.5;
        let close = |a: f32, b: f32| (a - b).abs() < MAX_ACCEPTABLE_OFFSET;

        let horizontal = (close(self.x0 - margins.left, other.x0 - other_margins.left)
            && close(self.x1 - margins.left, other.x1 - other_margins.left))
            || (close(self.x0, other.x0) && close(self.x1, other.x1));
        let vertical = (close(self.y0 - margins.top, other.y0 - other_margins.top)
            && close(self.y1 - margins.top, other.y1 - other_margins.top))
            || (close(self.y0 + margins.bottom, other.y0 + other_margins.bottom)
                && close(self.y1 + margins.bottom, other.y1 + other_margins.bottom))
            || (close(self.y0, other.y0) && close(self.y1, other.y1));
        horizontal && vertical
    }
}

/// Anything positioned on a page.
pub trait Bounded {
    fn bbox(&self) -> &BoundingBox;

    /// Horizontal tolerance used when ordering items on one visual row.
    #[inline]
    fn horz_jitter_threshold(&self) -> f32 {
        self.bbox().height()
    }
}

impl Bounded for BoundingBox {
    #[inline]
    fn bbox(&self) -> &BoundingBox {
        self
    }
}

/// Page dimensions in page units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    #[inline]
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Distance from each page edge to the nearest content.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageMargins {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PageMargins {
    /// Margins that any real content will shrink.
    #[inline]
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            left: f32::MAX,
            top: f32::MAX,
            right: f32::MAX,
            bottom: f32::MAX,
        }
    }

    /// Keep the smaller margin on each side.
    #[inline]
    pub fn update(&mut self, other: &Self) {
        self.left = self.left.min(other.left);
        self.top = self.top.min(other.top);
        self.right = self.right.min(other.right);
        self.bottom = self.bottom.min(other.bottom);
    }

    /// Replace sides never shrunk by content with zero.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let fix = |v: f32| if v > f32::MAX - 10.0 { 0.0 } else { v };
        self.left = fix(self.left);
        self.top = fix(self.top);
        self.right = fix(self.right);
        self.bottom = fix(self.bottom);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_of_contained_box_is_identity() {
        let outer = BoundingBox::new(10.0, 10.0, 100.0, 50.0);
        let inner = BoundingBox::new(20.0, 15.0, 90.0, 40.0);
        assert_eq!(outer.union(&inner), outer);
    }

    #[test]
    fn test_empty_is_union_identity() {
        let b = BoundingBox::with_bands(1.0, 2.0, 3.0, 4.0, 1.5, 4.5);
        assert_eq!(BoundingBox::empty().union(&b), b);
        assert!(BoundingBox::empty().is_unset());
    }

    #[test]
    fn test_contains_with_margin() {
        let outer = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let sticking_out = BoundingBox::new(95.0, 10.0, 103.0, 20.0);
        assert!(!outer.contains(&sticking_out, -1.0));
        assert!(outer.contains(&sticking_out, -8.0));
    }

    #[test]
    fn test_touches_uses_tight_band() {
        let a = BoundingBox::with_bands(0.0, 10.0, 10.0, 20.0, 5.0, 25.0);
        let b = BoundingBox::with_bands(5.0, 21.0, 15.0, 30.0, 18.0, 32.0);
        assert!(a.vert_overlap(&b) > 0.0);
        assert!(!a.touches(&b));
    }

    #[test]
    fn test_horz_spacer() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(14.0, 2.0, 20.0, 12.0);
        let spacer = a.horz_spacer(&b);
        assert_eq!(spacer.x0, 10.0);
        assert_eq!(spacer.x1, 14.0);
        assert_eq!(spacer.width(), 4.0);
        assert_eq!(spacer.top, 0.0);
        assert_eq!(spacer.bottom, 12.0);
        assert!(a.horz_spacer(&BoundingBox::new(5.0, 0.0, 20.0, 10.0)).is_empty());
    }

    #[test]
    fn test_conforms_to_band() {
        let glyph = BoundingBox::new(0.0, 102.0, 5.0, 110.0);
        assert!(glyph.conforms_to_band(100.0, 112.0, 108.0));
        let tall = BoundingBox::new(0.0, 90.0, 5.0, 130.0);
        assert!(!tall.conforms_to_band(100.0, 112.0, 108.0));
    }

    #[test]
    fn test_margins_sanitized() {
        let mut margins = PageMargins::unbounded();
        margins.update(&PageMargins {
            left: 20.0,
            top: f32::MAX,
            right: 30.0,
            bottom: f32::MAX,
        });
        let clean = margins.sanitized();
        assert_eq!(clean.left, 20.0);
        assert_eq!(clean.top, 0.0);
        assert_eq!(clean.right, 30.0);
    }
}
