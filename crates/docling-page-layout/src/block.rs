// Page blocks
//
// A block is a rectangle of the page holding either line segments or inner
// blocks, never both. Blocks are classified by where they sit on the page and
// by what they contain, and carry the paragraph geometry (justification and
// indents) estimated from their lines.

#![allow(clippy::cast_possible_truncation)]

use crate::config::{MAX_RULER_SIZE, MIN_ITEM_SIZE};
use crate::geometry::{BoundingBox, Bounded};
use crate::histogram::FloatHistogram;
use crate::line::{Association, LineSegment};
use crate::ordering::{insertion_sort_by, naive_sort_by_reading_order};
use crate::primitive::{Primitive, PrimitiveType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a block sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Location {
    #[default]
    None,
    Main,
    Header,
    Footer,
    SidebarLeft,
    SidebarRight,
    Footnote,
    Watermark,
}

/// What a block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    None,
    Image,
    Table,
    TableCaption,
    ImageCaption,
    ImageText,
    List,
    Text,
}

/// Horizontal alignment of a block's lines.
///
/// `Left` and `Right` are bits; `Justified` is both of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Justification {
    #[default]
    None = 0,
    Left = 1,
    Right = 2,
    Justified = 3,
    Center = 4,
}

impl Justification {
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Justification::bits`]; unknown combinations map to `None`.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Left,
            2 => Self::Right,
            3 => Self::Justified,
            4 => Self::Center,
            _ => Self::None,
        }
    }

    /// Bitwise union of two alignments.
    #[inline]
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self::from_bits(self.bits() | other.bits())
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.bits() & other.bits() == other.bits()
    }
}

/// Classified rectangle of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub bbox: BoundingBox,
    pub location: Location,
    pub content_type: ContentType,
    pub justification: Justification,
    lines: Vec<LineSegment>,
    inner_blocks: Vec<Block>,
    /// Number of inner columns found when the block's region was segmented
    pub inner_cols_count: u16,
    /// Last paragraph line was recognized as such, so no later line can continue it
    pub certainly_finished: bool,
    /// Indent of the first paragraph line, relative to the block's left edge
    pub first_line_indent: f32,
    /// Indent of the remaining paragraph lines, relative to the block's left edge
    pub text_indent: f32,
    pub space_to_left: f32,
    pub space_to_right: f32,
}

impl Default for Block {
    fn default() -> Self {
        Self::new(Location::None, ContentType::None)
    }
}

impl Bounded for Block {
    #[inline]
    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl Block {
    #[must_use]
    pub fn new(location: Location, content_type: ContentType) -> Self {
        Self {
            bbox: BoundingBox::empty(),
            location,
            content_type,
            justification: Justification::None,
            lines: Vec::new(),
            inner_blocks: Vec::new(),
            inner_cols_count: 0,
            certainly_finished: false,
            first_line_indent: 0.0,
            text_indent: 0.0,
            space_to_left: 0.0,
            space_to_right: 0.0,
        }
    }

    #[must_use]
    pub fn with_justification(location: Location, content_type: ContentType, justification: Justification) -> Self {
        Self {
            justification,
            ..Self::new(location, content_type)
        }
    }

    #[inline]
    #[must_use]
    pub fn lines(&self) -> &[LineSegment] {
        &self.lines
    }

    #[inline]
    pub(crate) fn lines_mut(&mut self) -> &mut Vec<LineSegment> {
        &mut self.lines
    }

    /// Move the lines out, leaving the box untouched.
    pub(crate) fn take_lines(&mut self) -> Vec<LineSegment> {
        std::mem::take(&mut self.lines)
    }

    /// Replace the lines without touching the box.
    pub fn replace_lines(&mut self, lines: Vec<LineSegment>) {
        self.lines = lines;
    }

    #[inline]
    #[must_use]
    pub fn inner_blocks(&self) -> &[Block] {
        &self.inner_blocks
    }

    #[inline]
    pub(crate) fn inner_blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.inner_blocks
    }

    pub fn append_inner_block(&mut self, block: Block) {
        self.bbox.union_with(&block.bbox);
        self.inner_blocks.push(block);
    }

    /// True when the block has neither lines nor inner blocks.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.inner_blocks.is_empty()
    }

    /// Add a line and grow the box around it.
    ///
    /// With `merge_overlapping`, the block's lines are re-scanned left to right
    /// until no more merges apply:
    /// - a line inside an image is merged into it when both are images, and is
    ///   otherwise marked as text inside that image;
    /// - a line whose tight band overlaps another's by more than half the
    ///   smaller tight height is merged into it, unless the horizontal gap
    ///   exceeds ten times their font size.
    ///
    /// Virtual hairlines and backgrounds are never merged.
    pub fn append_line_segment(&mut self, line: LineSegment, merge_overlapping: bool) {
        debug_assert!(self.inner_blocks.is_empty());
        let line_box = *line.bbox();
        let mergeable = !matches!(line.item_type(), PrimitiveType::VirtualLine | PrimitiveType::Background);

        if merge_overlapping && mergeable {
            let mut all = std::mem::take(&mut self.lines);
            all.push(line);
            insertion_sort_by(&mut all, |a, b| a.bbox().x0 < b.bbox().x0);
            loop {
                let (improved, merged) = absorb_overlapping_lines(all);
                all = improved;
                if !merged {
                    break;
                }
            }
            self.lines = all;
        } else {
            self.lines.push(line);
        }
        self.bbox.union_with(&line_box);
    }

    /// Horizontal rulers of the block, fused when they share a vertical
    /// position (within 2 units), keeping only those wider than `min_width`.
    #[must_use]
    pub fn horz_rulers(&self, min_width: f32) -> Vec<BoundingBox> {
        let mut merged: Vec<BoundingBox> = Vec::new();
        for line in self.lines.iter().filter(|line| line.is_horizontal_ruler()) {
            let bbox = line.bbox();
            match merged
                .iter_mut()
                .find(|ruler| (ruler.center_y() - bbox.center_y()).abs() < 2.0)
            {
                Some(ruler) => ruler.union_with(bbox),
                None => merged.push(*bbox),
            }
        }
        merged.retain(|ruler| ruler.width() > min_width);
        merged
    }

    /// Non-ruler images cover more than half of the block.
    #[must_use]
    pub fn mostly_image(&self) -> bool {
        let mut image = BoundingBox::empty();
        for line in &self.lines {
            if line.is_pure_image() && !line.is_horizontal_ruler() {
                image.union_with(line.bbox());
            }
        }
        image.width() > 0.0 && image.width() * image.height() > 0.5 * self.bbox.height() * self.tight_width()
    }

    #[must_use]
    pub fn is_pure_image(&self) -> bool {
        self.lines.iter().all(LineSegment::is_pure_image)
    }

    /// Most common text line height, weighted by line length; `-1` without text.
    #[must_use]
    pub fn approx_line_height(&self) -> f32 {
        let mut heights: BTreeMap<i16, usize> = BTreeMap::new();
        self.collect_line_heights(&mut heights);
        mode_of(&heights)
    }

    fn collect_line_heights(&self, heights: &mut BTreeMap<i16, usize>) {
        if !self.inner_blocks.is_empty() {
            for inner in &self.inner_blocks {
                inner.collect_line_heights(heights);
            }
            return;
        }
        for line in self.lines.iter().filter(|line| !line.is_pure_image()) {
            let rounded = ((line.bbox().height() * 10.0).round() / 10.0) as i16;
            *heights.entry(rounded).or_insert(0) += line.len();
        }
    }

    /// Most common baseline distance between consecutive text lines; `-1` when unknown.
    #[must_use]
    pub fn approx_line_spacing(&self) -> f32 {
        let mut spacings: BTreeMap<i16, usize> = BTreeMap::new();
        self.collect_line_spacings(&mut spacings);
        mode_of(&spacings)
    }

    fn collect_line_spacings(&self, spacings: &mut BTreeMap<i16, usize>) {
        if !self.inner_blocks.is_empty() {
            for inner in &self.inner_blocks {
                inner.collect_line_spacings(spacings);
            }
            return;
        }
        let inside_text = |line: &LineSegment| line.association() == Association::InsideTextOf;
        for pair in self.lines.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            if prev.is_pure_image() || curr.is_pure_image() || inside_text(prev) || inside_text(curr) {
                continue;
            }
            let rounded = (curr.baseline() - prev.baseline()).round() as i16;
            *spacings.entry(rounded).or_insert(0) += curr.len();
        }
    }

    #[inline]
    #[must_use]
    pub fn tight_left(&self) -> f32 {
        self.bbox.x0 + self.space_to_left
    }

    #[inline]
    #[must_use]
    pub fn tight_right(&self) -> f32 {
        self.bbox.x1 - self.space_to_right
    }

    #[inline]
    #[must_use]
    pub fn tight_width(&self) -> f32 {
        self.tight_right() - self.tight_left()
    }

    /// Absolute position of the text indent.
    #[inline]
    #[must_use]
    pub fn text_indent_pos(&self) -> f32 {
        self.bbox.x0 + self.text_indent
    }

    /// Some line of `self` shares a font with some line of `other`.
    ///
    /// When either side has inner blocks, only this block's inner blocks are
    /// compared against `other`.
    #[must_use]
    pub fn shares_fonts_with(&self, other: &Block) -> bool {
        if !self.inner_blocks.is_empty() || !other.inner_blocks.is_empty() {
            return self.inner_blocks.iter().any(|inner| inner.shares_fonts_with(other));
        }
        self.lines
            .iter()
            .any(|line| other.lines.iter().any(|other_line| line.shares_fonts_with(other_line)))
    }

    #[must_use]
    pub fn shares_fonts_with_line(&self, other: &LineSegment) -> bool {
        if !self.inner_blocks.is_empty() {
            return self.inner_blocks.iter().any(|inner| inner.shares_fonts_with_line(other));
        }
        self.lines.iter().any(|line| line.shares_fonts_with(other))
    }

    /// No glyph anywhere in the block.
    #[must_use]
    pub fn is_non_text(&self) -> bool {
        if !self.inner_blocks.is_empty() {
            return self.inner_blocks.iter().all(Block::is_non_text);
        }
        !self
            .lines
            .iter()
            .any(|line| line.items().iter().any(Primitive::is_char))
    }

    #[inline]
    #[must_use]
    pub fn is_main_text_block(&self) -> bool {
        self.location == Location::Main && matches!(self.content_type, ContentType::Text | ContentType::List)
    }

    #[inline]
    #[must_use]
    pub fn is_horizontal_ruler(&self) -> bool {
        let (width, height) = (self.bbox.width(), self.bbox.height());
        height < 2.0 * MAX_RULER_SIZE && width > 8.0_f32.max(4.0 * height)
    }

    /// Reading-order sort of the lines and, recursively, of the inner blocks.
    pub fn naive_sort_by_reading_order(&mut self) {
        if !self.inner_blocks.is_empty() {
            for inner in &mut self.inner_blocks {
                inner.naive_sort_by_reading_order();
            }
            self.inner_blocks = naive_sort_by_reading_order(std::mem::take(&mut self.inner_blocks));
        }
        self.lines = naive_sort_by_reading_order(std::mem::take(&mut self.lines));
    }

    /// Lines sharing a tight band go left to right, otherwise top to bottom.
    /// Inner blocks go left to right, except rulers which go by height.
    pub fn sort_lines_top_to_bottom(&mut self) {
        if !self.inner_blocks.is_empty() {
            insertion_sort_by(&mut self.inner_blocks, |a, b| {
                if a.is_horizontal_ruler() || b.is_horizontal_ruler() {
                    a.bbox.center_y() < b.bbox.center_y()
                } else {
                    a.bbox.x0 < b.bbox.x0
                }
            });
            let location = self.location;
            for inner in &mut self.inner_blocks {
                inner.location = location;
                inner.sort_lines_top_to_bottom();
            }
            return;
        }
        insertion_sort_by(&mut self.lines, |a, b| {
            let (a, b) = (a.bbox(), b.bbox());
            if a.tight_vert_overlap(b) >= a.tight_height().min(b.tight_height()) {
                a.x0 < b.x0
            } else {
                a.y0 < b.y0
            }
        });
    }

    /// Give every inner block this block's location, recursively.
    pub fn propagate_location(&mut self) {
        let location = self.location;
        for inner in &mut self.inner_blocks {
            inner.location = location;
            inner.propagate_location();
        }
    }

    /// Vote on the alignment of the block's lines.
    ///
    /// Lines sharing a row count once, spanning the row. A left (right) edge
    /// shared by more than three quarters of the rows makes the block `Left`
    /// (`Right`); both make it `Justified`. Blocks with neither whose rows are
    /// all centered are `Center`, anything else falls back to `Justified`.
    pub fn estimate_paragraph_params(&mut self) {
        self.sort_lines_top_to_bottom();
        self.justification = Justification::None;
        self.first_line_indent = 0.0;
        self.text_indent = 0.0;

        if self.lines.is_empty() {
            self.justification = Justification::Justified;
            return;
        }

        let (x0, x1) = (self.bbox.x0, self.bbox.x1);
        let mut left_histogram = FloatHistogram::new(1.0);
        let mut right_histogram = FloatHistogram::new(1.0);
        let mut is_center_aligned = true;

        for (i, line) in self.lines.iter().enumerate() {
            let overlaps = |other: &LineSegment| other.bbox().vert_overlap(line.bbox()) > MIN_ITEM_SIZE;
            if self.lines[..i].iter().any(|other| overlaps(other)) {
                continue;
            }
            let (mut left, mut right) = (line.bbox().x0, line.bbox().x1);
            for other in self.lines[i + 1..].iter().filter(|other| overlaps(*other)) {
                left = left.min(other.bbox().x0);
                right = right.max(other.bbox().x1);
            }
            left_histogram.insert(left);
            right_histogram.insert(right);
            is_center_aligned &= (left - x0 - x1 + right).abs() < 2.0;
        }

        let mut winner_left = (x0, 0usize);
        for &(value, count) in left_histogram.items() {
            if count > winner_left.1 || (count == winner_left.1 && value < winner_left.0) {
                winner_left = (value, count);
            }
        }
        let mut winner_right = (x1, 0usize);
        for &(value, count) in right_histogram.items() {
            if count > winner_right.1 || (count == winner_right.1 && value > winner_right.0) {
                winner_right = (value, count);
            }
        }

        let rows = left_histogram.total();
        if winner_left.1 > 3 * rows / 4 {
            self.justification = self.justification.with(Justification::Left);
            self.text_indent = winner_left.0 - x0;
        }
        if winner_right.0 >= self.tight_right() - 2.0 && winner_right.1 > 3 * rows / 4 {
            self.justification = self.justification.with(Justification::Right);
        }

        if self.justification == Justification::None && is_center_aligned {
            self.justification = Justification::Center;
            self.first_line_indent = 0.0;
            self.text_indent = 0.0;
        }

        if self.justification != Justification::Center {
            self.first_line_indent = self.text_indent;
            for &(value, _) in left_histogram.items() {
                let indent = value - x0;
                if (indent - self.text_indent).abs() > (self.first_line_indent - self.text_indent).abs() {
                    self.first_line_indent = indent;
                }
            }

            if self.lines.len() == 2
                && winner_left.0 <= self.tight_left() + 2.0
                && winner_right.0 >= self.tight_right() - 2.0
            {
                self.justification = Justification::Justified;
            }
        }

        if self.justification == Justification::None {
            self.justification = Justification::Justified;
        }
    }

    /// Text of the block: one line per line segment, inner blocks in order.
    #[must_use]
    pub fn text(&self) -> String {
        if !self.inner_blocks.is_empty() {
            return self
                .inner_blocks
                .iter()
                .map(Block::text)
                .collect::<Vec<_>>()
                .join("\n");
        }
        self.lines
            .iter()
            .map(LineSegment::content_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One left-to-right pass of the block line merge; reports whether anything merged.
fn absorb_overlapping_lines(lines: Vec<LineSegment>) -> (Vec<LineSegment>, bool) {
    let mut improved: Vec<LineSegment> = Vec::with_capacity(lines.len());
    let mut merged_any = false;

    for mut line in lines {
        let mut merged = false;
        for other in &mut improved {
            if other.is_pure_image() && other.bbox().contains(line.bbox(), -1.0) {
                if line.is_pure_image() && !other.is_background() && other.merge_with(&line) {
                    merged = true;
                }
                if !merged {
                    line.set_relative(other.id(), Association::InsideTextOf);
                }
                break;
            } else if line.is_pure_image() && line.bbox().contains(other.bbox(), -1.0) {
                if other.is_pure_image() && !line.is_background() && other.merge_with(&line) {
                    merged = true;
                }
                if merged {
                    break;
                }
                other.set_relative(line.id(), Association::InsideTextOf);
            } else if other.bbox().tight_vert_overlap(line.bbox())
                > 0.5 * other.bbox().tight_height().min(line.bbox().tight_height())
            {
                let threshold = line.most_used_font_size().max(other.most_used_font_size());
                if threshold > 0.0 && other.bbox().horz_spacer(line.bbox()).width() > 10.0 * threshold {
                    break;
                }
                merged = other.merge_with(&line);
                break;
            }
        }
        merged_any |= merged;
        if !merged {
            improved.push(line);
        }
    }
    (improved, merged_any)
}

/// Key with the strictly highest weight, first in key order; `-1` when empty.
fn mode_of(histogram: &BTreeMap<i16, usize>) -> f32 {
    let mut best = -1.0;
    let mut best_count = 0;
    for (&key, &count) in histogram {
        if count > best_count {
            best = f32::from(key);
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{FontId, Glyph};

    fn text_line(text: &str, x0: f32, top: f32) -> LineSegment {
        let mut line = LineSegment::new();
        for (i, code) in text.chars().enumerate() {
            let x = x0 + i as f32 * 5.0;
            line.append_item(Primitive::glyph(
                BoundingBox::new(x, top, x + 5.0, top + 10.0),
                Glyph::new(code, top + 8.0, Some(FontId(1)), 10.0),
            ));
        }
        line
    }

    /// Line of `x`s from `x0` to `x1` (rounded down to whole glyphs).
    fn span(x0: f32, x1: f32, top: f32) -> LineSegment {
        let count = ((x1 - x0) / 5.0) as usize;
        text_line(&"x".repeat(count), x0, top)
    }

    fn block_of(lines: Vec<LineSegment>) -> Block {
        let mut block = Block::new(Location::Main, ContentType::None);
        for line in lines {
            block.append_line_segment(line, false);
        }
        block
    }

    #[test]
    fn test_justification_bits() {
        assert_eq!(Justification::Left.with(Justification::Right), Justification::Justified);
        assert!(Justification::Justified.contains(Justification::Left));
        assert!(!Justification::Center.contains(Justification::Left));
        assert_eq!(Justification::from_bits(7), Justification::None);
    }

    #[test]
    fn test_overlapping_fragments_are_merged() {
        let mut block = Block::new(Location::Main, ContentType::None);
        block.append_line_segment(text_line("Hello", 0.0, 0.0), true);
        block.append_line_segment(text_line("world", 30.0, 1.0), true);
        assert_eq!(block.lines().len(), 1);
        assert_eq!(block.lines()[0].content_string(), "Helloworld");
        assert_eq!(block.bbox.x1, 55.0);
    }

    #[test]
    fn test_distant_fragments_stay_apart() {
        let mut block = Block::new(Location::Main, ContentType::None);
        block.append_line_segment(text_line("left", 0.0, 0.0), true);
        block.append_line_segment(text_line("right", 300.0, 0.0), true);
        assert_eq!(block.lines().len(), 2);
    }

    #[test]
    fn test_virtual_lines_are_never_merged() {
        let mut block = Block::new(Location::Main, ContentType::None);
        block.append_line_segment(text_line("text", 0.0, 0.0), true);
        let hairline = LineSegment::from_item(Primitive::virtual_line(BoundingBox::new(0.0, 0.0, 20.0, 0.4)));
        block.append_line_segment(hairline, true);
        assert_eq!(block.lines().len(), 2);
    }

    #[test]
    fn test_text_inside_image_is_associated() {
        let mut block = Block::new(Location::Main, ContentType::None);
        let image = LineSegment::from_item(Primitive::image(BoundingBox::new(0.0, 0.0, 200.0, 200.0)));
        let image_id = image.id();
        block.append_line_segment(image, true);
        block.append_line_segment(text_line("label", 50.0, 50.0), true);
        assert_eq!(block.lines().len(), 2);
        let label = &block.lines()[1];
        assert_eq!(label.association(), Association::InsideTextOf);
        assert_eq!(label.relative(), Some(image_id));
    }

    #[test]
    fn test_left_aligned_block() {
        let mut block = block_of(vec![
            span(10.0, 100.0, 0.0),
            span(10.0, 80.0, 12.0),
            span(10.0, 95.0, 24.0),
            span(10.0, 60.0, 36.0),
        ]);
        block.estimate_paragraph_params();
        assert_eq!(block.justification, Justification::Left);
        assert_eq!(block.text_indent, 0.0);
    }

    #[test]
    fn test_justified_block() {
        let mut block = block_of(vec![
            span(10.0, 100.0, 0.0),
            span(10.0, 100.0, 12.0),
            span(10.0, 100.0, 24.0),
            span(10.0, 100.0, 36.0),
            span(10.0, 60.0, 48.0),
        ]);
        block.estimate_paragraph_params();
        assert_eq!(block.justification, Justification::Justified);
    }

    #[test]
    fn test_centered_block() {
        let mut block = block_of(vec![span(30.0, 80.0, 0.0), span(20.0, 90.0, 12.0), span(40.0, 70.0, 24.0)]);
        block.estimate_paragraph_params();
        assert_eq!(block.justification, Justification::Center);
        assert_eq!(block.first_line_indent, 0.0);
    }

    #[test]
    fn test_first_line_indent() {
        let mut block = block_of(vec![
            span(30.0, 100.0, 0.0),
            span(10.0, 100.0, 12.0),
            span(10.0, 100.0, 24.0),
            span(10.0, 100.0, 36.0),
            span(10.0, 100.0, 48.0),
        ]);
        block.estimate_paragraph_params();
        assert_eq!(block.justification, Justification::Justified);
        assert_eq!(block.text_indent, 0.0);
        assert_eq!(block.first_line_indent, 20.0);
    }

    #[test]
    fn test_empty_block_is_justified() {
        let mut block = Block::default();
        block.estimate_paragraph_params();
        assert_eq!(block.justification, Justification::Justified);
    }

    #[test]
    fn test_approx_line_height_and_spacing() {
        let mut tall = span(0.0, 10.0, 40.0);
        tall.bbox_mut().y1 = 60.0;
        let block = block_of(vec![span(0.0, 50.0, 0.0), span(0.0, 50.0, 14.0), tall]);
        assert_eq!(block.approx_line_height(), 10.0);
        assert_eq!(block.approx_line_spacing(), 14.0);
        assert_eq!(Block::default().approx_line_height(), -1.0);
    }

    #[test]
    fn test_horz_rulers_are_fused() {
        let block = block_of(vec![
            LineSegment::from_item(Primitive::path(BoundingBox::new(0.0, 100.0, 60.0, 101.0))),
            LineSegment::from_item(Primitive::path(BoundingBox::new(60.0, 100.5, 120.0, 101.5))),
            LineSegment::from_item(Primitive::path(BoundingBox::new(0.0, 200.0, 20.0, 201.0))),
        ]);
        let rulers = block.horz_rulers(50.0);
        assert_eq!(rulers.len(), 1);
        assert_eq!(rulers[0].x1, 120.0);
    }

    #[test]
    fn test_mostly_image() {
        let block = block_of(vec![
            LineSegment::from_item(Primitive::image(BoundingBox::new(0.0, 0.0, 100.0, 90.0))),
            span(0.0, 50.0, 92.0),
        ]);
        assert!(block.mostly_image());
        assert!(!block.is_pure_image());
        assert!(!block_of(vec![span(0.0, 50.0, 0.0)]).mostly_image());
    }

    #[test]
    fn test_text_joins_lines() {
        let block = block_of(vec![text_line("one", 0.0, 0.0), text_line("two", 0.0, 12.0)]);
        assert_eq!(block.text(), "one\ntwo");
        assert!(!block.is_non_text());
    }
}
