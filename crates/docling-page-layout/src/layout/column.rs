// Column candidates
//
// A column starts as the box of one XY-cut leaf and accumulates merge
// bookkeeping as neighbouring candidates are folded into it. The slack on
// each side records how far the box was widened beyond its content.

use crate::config::{MAX_RULER_SIZE, MIN_ITEM_SIZE};
use crate::geometry::{BoundingBox, Bounded};

/// Edges of a leaf region that are occupied by an image; `-1` when not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageEdges {
    /// Top of the topmost line, when that line is a non-ruler image
    pub top: f32,
    /// Bottom of the lowest line, when that line is a non-ruler image
    pub bottom: f32,
    /// Left of the leftmost line, when that line is a non-ruler image
    pub left: f32,
    /// Right of the rightmost line, when that line is a non-ruler image
    pub right: f32,
}

impl Default for ImageEdges {
    fn default() -> Self {
        Self {
            top: -1.0,
            bottom: -1.0,
            left: -1.0,
            right: -1.0,
        }
    }
}

/// Candidate region with merge bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub bbox: BoundingBox,
    /// Width added on the left by margin expansion
    pub space_to_left: f32,
    /// Width added on the right by margin expansion
    pub space_to_right: f32,
    /// Sum of the widths of the side-by-side columns merged into this one
    pub sum_merged_width: f32,
    /// Narrowest side-by-side column merged into this one
    pub min_merged_width: f32,
    /// Number of side-by-side columns merged into this one
    pub merged_count: u16,
    pub is_merged: bool,
    images: ImageEdges,
}

impl Bounded for Column {
    #[inline]
    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl Column {
    /// Column covering `bbox` whose merge statistics start at the box width.
    #[must_use]
    pub fn new(bbox: BoundingBox, images: ImageEdges) -> Self {
        let width = bbox.width();
        Self {
            bbox,
            space_to_left: 0.0,
            space_to_right: 0.0,
            sum_merged_width: width,
            min_merged_width: width,
            merged_count: 1,
            is_merged: false,
            images,
        }
    }

    pub fn expand_to_left(&mut self, x0: f32) {
        debug_assert!(x0 <= self.bbox.x0);
        self.space_to_left += self.bbox.x0 - x0;
        self.bbox.x0 = x0;
    }

    pub fn expand_to_right(&mut self, x1: f32) {
        debug_assert!(x1 >= self.bbox.x1);
        self.space_to_right += x1 - self.bbox.x1;
        self.bbox.x1 = x1;
    }

    /// Undo every margin expansion.
    pub fn reset_expansion(&mut self) {
        self.bbox.x0 += self.space_to_left;
        self.bbox.x1 -= self.space_to_right;
        self.space_to_left = 0.0;
        self.space_to_right = 0.0;
    }

    /// Width without the expansion slack.
    #[inline]
    #[must_use]
    pub fn content_width(&self) -> f32 {
        self.bbox.width() - self.space_to_left - self.space_to_right
    }

    #[inline]
    #[must_use]
    pub fn is_horizontal_ruler(&self) -> bool {
        let (width, height) = (self.bbox.width(), self.bbox.height());
        height < 2.0 * MAX_RULER_SIZE && width > 8.0_f32.max(4.0 * height)
    }

    /// Fold `other` into this column.
    ///
    /// A column lying entirely to one side adds to the side-by-side statistics
    /// and hands over its outer slack. An overlapping column keeps the slack of
    /// whichever content edge is outermost and resets the side-by-side count
    /// unless it is a ruler. With `tight`, `other` is first pulled to this
    /// column's edges minus its own slack.
    pub fn merge_with(&mut self, other: &mut Column, tight: bool) {
        if other.bbox.x1 < self.bbox.x0 {
            self.space_to_left = other.space_to_left;
            self.absorb_side_by_side(other);
        } else if other.bbox.x0 > self.bbox.x1 {
            self.space_to_right = other.space_to_right;
            self.absorb_side_by_side(other);
        } else {
            if self.bbox.x0 + self.space_to_left >= other.bbox.x0 + other.space_to_left {
                self.space_to_left = other.space_to_left;
            }
            if self.bbox.x1 - self.space_to_right <= other.bbox.x1 - other.space_to_right {
                self.space_to_right = other.space_to_right;
            }
            if !other.is_horizontal_ruler() {
                self.merged_count = 1;
                self.sum_merged_width = self
                    .sum_merged_width
                    .max(other.sum_merged_width - other.space_to_left - other.space_to_right);
                self.min_merged_width = self.min_merged_width.max(other.min_merged_width);
            }
        }

        if tight {
            other.bbox.x0 = self.bbox.x0 + other.space_to_left;
            other.bbox.x1 = self.bbox.x1 - other.space_to_right;
        }
        self.bbox.union_with(&other.bbox);

        self.images.bottom = self.images.bottom.max(other.images.bottom);
        if other.images.top > 0.0 {
            self.images.top = self.images.top.min(other.images.top);
        }
    }

    fn absorb_side_by_side(&mut self, other: &Column) {
        self.merged_count += other.merged_count;
        self.sum_merged_width += other.sum_merged_width;
        self.min_merged_width = self.min_merged_width.min(other.min_merged_width);
    }

    #[must_use]
    pub fn top_is_image(&self) -> bool {
        (self.images.top - self.bbox.y0).abs() < MIN_ITEM_SIZE
    }

    #[must_use]
    pub fn bottom_is_image(&self) -> bool {
        (self.images.bottom - self.bbox.y1).abs() < MIN_ITEM_SIZE
    }
}
