// Line segments
//
// A line segment owns the primitives sharing one baseline band. Its box is the
// union of its members; its baseline is the mode of the member glyph
// baselines. Lines are moved between blocks by value and refer to each other
// only through `LineId` handles.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use crate::config::{LayoutConfig, MIN_ITEM_SIZE};
use crate::geometry::{BoundingBox, Bounded, PageMargins};
use crate::ordering::insertion_sort_by;
use crate::primitive::{
    is_decimal_digit, Glyph, ItemFlags, Primitive, PrimitiveType, LIST_END, LIST_START, OBJECT_CHAR,
};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_LINE_ID: AtomicU32 = AtomicU32::new(1);

/// Stable handle of a line segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId(pub u32);

impl LineId {
    fn next() -> Self {
        Self(NEXT_LINE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Non-owning relation from one line to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Association {
    #[default]
    None,
    IsCaptionOf,
    HasAsCaption,
    InsideTextOf,
    HasAsInsideText,
}

/// List role of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ListType {
    #[default]
    None,
    Bulleted,
    Numbered,
}

/// Ordered primitives sharing a baseline band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    id: LineId,
    bbox: BoundingBox,
    item_type: PrimitiveType,
    flags: ItemFlags,
    items: Vec<Primitive>,
    #[serde(skip)]
    baseline: Cell<Option<f32>>,
    page_index: i16,
    par_index: i16,
    snt_index: i16,
    list_type: ListType,
    text_left: f32,
    relative: Option<(LineId, Association)>,
}

impl Default for LineSegment {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounded for LineSegment {
    #[inline]
    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl LineSegment {
    /// Empty line with a fresh handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: LineId::next(),
            bbox: BoundingBox::empty(),
            item_type: PrimitiveType::None,
            flags: ItemFlags::default(),
            items: Vec::new(),
            baseline: Cell::new(None),
            page_index: -1,
            par_index: -1,
            snt_index: -1,
            list_type: ListType::None,
            text_left: 0.0,
            relative: None,
        }
    }

    #[must_use]
    pub fn from_item(item: Primitive) -> Self {
        let mut line = Self::new();
        line.append_item(item);
        line
    }

    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = Primitive>) -> Self {
        let mut line = Self::new();
        line.append_items(items);
        line
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> LineId {
        self.id
    }

    #[inline]
    pub fn bbox_mut(&mut self) -> &mut BoundingBox {
        &mut self.bbox
    }

    #[inline]
    #[must_use]
    pub fn items(&self) -> &[Primitive] {
        &self.items
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn item_type(&self) -> PrimitiveType {
        self.item_type
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> &ItemFlags {
        &self.flags
    }

    #[inline]
    pub fn flags_mut(&mut self) -> &mut ItemFlags {
        &mut self.flags
    }

    #[inline]
    #[must_use]
    pub fn page_index(&self) -> i16 {
        self.page_index
    }

    #[inline]
    #[must_use]
    pub fn par_index(&self) -> i16 {
        self.par_index
    }

    #[inline]
    #[must_use]
    pub fn snt_index(&self) -> i16 {
        self.snt_index
    }

    /// Assign the (page, paragraph, sentence) coordinates of this line.
    pub fn set_line_specs(&mut self, page_index: i16, par_index: i16, snt_index: i16) {
        self.page_index = page_index;
        self.par_index = par_index;
        self.snt_index = snt_index;
    }

    #[inline]
    #[must_use]
    pub fn list_type(&self) -> ListType {
        self.list_type
    }

    /// Left edge of the text after the list identifier, or the line's left edge.
    #[inline]
    #[must_use]
    pub fn text_left(&self) -> f32 {
        if self.list_type == ListType::None {
            self.bbox.x0
        } else {
            self.text_left
        }
    }

    #[inline]
    #[must_use]
    pub fn relative(&self) -> Option<LineId> {
        self.relative.map(|(id, _)| id)
    }

    #[inline]
    #[must_use]
    pub fn association(&self) -> Association {
        self.relative.map_or(Association::None, |(_, assoc)| assoc)
    }

    pub fn set_relative(&mut self, relative: LineId, association: Association) {
        self.relative = Some((relative, association));
    }

    /// Mode of the member glyph baselines (at 1/1000 resolution), else the tight center.
    #[must_use]
    pub fn baseline(&self) -> f32 {
        if let Some(baseline) = self.baseline.get() {
            return baseline;
        }
        match self.find_baseline() {
            Some(baseline) => {
                self.baseline.set(Some(baseline));
                baseline
            }
            None => self.bbox.center_y(),
        }
    }

    fn find_baseline(&self) -> Option<f32> {
        let mut histogram: BTreeMap<i32, usize> = BTreeMap::new();
        for glyph in self.items.iter().filter_map(Primitive::glyph_data) {
            let key = (glyph.baseline * 1000.0 + 0.5) as i32;
            *histogram.entry(key).or_insert(0) += 1;
        }
        let mut best: Option<(i32, usize)> = None;
        for (&key, &count) in &histogram {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((key, count));
            }
        }
        best.map(|(key, _)| key as f32 / 1000.0)
    }

    /// Text content; non-glyph items straddling the baseline become [`OBJECT_CHAR`].
    #[must_use]
    pub fn content_string(&self) -> String {
        let baseline = self.baseline();
        let mut result = String::with_capacity(self.items.len());
        for item in &self.items {
            match item.code() {
                Some(code) => result.push(code),
                None if item.bbox.y0 < baseline && item.bbox.y1 > baseline => result.push(OBJECT_CHAR),
                None => {}
            }
        }
        result
    }

    /// Append one primitive; the line's type degrades to `None` on mixed content.
    pub fn append_item(&mut self, item: Primitive) {
        if self.items.is_empty() {
            self.item_type = item.item_type();
        } else if self.item_type != item.item_type() {
            self.item_type = PrimitiveType::None;
        }
        self.bbox.union_with(&item.bbox);
        self.items.push(item);
        self.baseline.set(None);
    }

    pub fn append_items(&mut self, items: impl IntoIterator<Item = Primitive>) {
        for item in items {
            self.append_item(item);
        }
    }

    /// Replace the member list without touching the line box.
    pub(crate) fn replace_items(&mut self, items: Vec<Primitive>) {
        self.items = items;
        self.baseline.set(None);
    }

    /// Pull `other`'s primitives into this line when it is empty or the loose bands overlap.
    ///
    /// Returns `false` and leaves both lines untouched otherwise.
    pub fn merge_with(&mut self, other: &Self) -> bool {
        if !self.items.is_empty() && self.bbox.vert_overlap(&other.bbox) <= MIN_ITEM_SIZE {
            return false;
        }
        self.append_items(other.items.iter().copied());
        insertion_sort_by(&mut self.items, |a, b| a.bbox.x0 < b.bbox.x0);
        true
    }

    #[must_use]
    pub fn is_pure_image(&self) -> bool {
        match self.item_type {
            PrimitiveType::None => !self.items.iter().any(Primitive::is_char),
            other => other != PrimitiveType::Char,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_background(&self) -> bool {
        self.item_type == PrimitiveType::Background
    }

    pub fn mark_as_background(&mut self) {
        self.item_type = PrimitiveType::Background;
    }

    #[inline]
    #[must_use]
    pub fn is_vertical_ruler(&self) -> bool {
        self.item_type != PrimitiveType::Char
            && self.bbox.width() < crate::config::MAX_RULER_SIZE
            && self.bbox.height() > 8.0
    }

    /// Thin non-text line, or more than five repetitions of `-` or `_`.
    #[must_use]
    pub fn is_horizontal_ruler(&self) -> bool {
        if self.item_type != PrimitiveType::Char
            && self.bbox.height() < 2.0 * crate::config::MAX_RULER_SIZE
            && self.bbox.width() > 8.0_f32.max(4.0 * self.bbox.height())
        {
            return true;
        }
        if self.items.len() <= 5 {
            return false;
        }
        let Some(first) = self.items[0].code() else {
            return false;
        };
        if first != '-' && first != '_' {
            return false;
        }
        self.items.iter().all(|item| item.code() == Some(first))
    }

    /// Two lines share a font when some alphanumeric glyph pair has the same
    /// font and sizes within 20%; lines without alphanumeric pairs always share.
    #[must_use]
    pub fn shares_fonts_with(&self, other: &Self) -> bool {
        let approximately_same = |a: f32, b: f32| a < 1.2 * b && b < 1.2 * a;
        let alnum = |item: &Primitive| item.glyph_data().filter(|glyph| glyph.is_alphanumeric()).copied();

        let mut char_encountered = false;
        for glyph in self.items.iter().filter_map(alnum) {
            for other_glyph in other.items.iter().filter_map(alnum) {
                char_encountered = true;
                if glyph.font.is_some()
                    && glyph.font == other_glyph.font
                    && approximately_same(glyph.font_size, other_glyph.font_size)
                {
                    return true;
                }
            }
        }
        !char_encountered
    }

    /// Most frequent glyph font size; `-1` for lines without glyphs.
    #[must_use]
    pub fn most_used_font_size(&self) -> f32 {
        if self.is_pure_image() {
            return -1.0;
        }
        let mut used: BTreeMap<OrderedFloat<f32>, usize> = BTreeMap::new();
        for glyph in self.items.iter().filter_map(Primitive::glyph_data) {
            *used.entry(OrderedFloat(glyph.font_size)).or_insert(0) += 1;
        }
        let mut best = -1.0;
        let mut best_count = 0;
        for (size, count) in used {
            if best < 0.0 || count > best_count {
                best = size.0;
                best_count = count;
            }
        }
        best
    }

    /// Same place on another page with approximately the same text.
    ///
    /// Strings must be at least five characters long and agree on more than
    /// 90% of their positions, ignoring positions holding digits.
    #[must_use]
    pub fn is_same_as(&self, margins: &PageMargins, other: &Self, other_margins: &PageMargins) -> bool {
        if !self.bbox.is_same(margins, &other.bbox, other_margins) {
            return false;
        }
        let current: Vec<char> = self.content_string().chars().collect();
        let other_text: Vec<char> = other.content_string().chars().collect();
        if current.len() < 5 || other_text.len() < 5 {
            return false;
        }
        approximately_same(&current, &other_text) || approximately_same(&other_text, &current)
    }

    /// Record list membership and wrap the identifier in virtual markers.
    ///
    /// `identifier` holds the index of the first identifier member and the
    /// index of the member that ends it (usually the first space).
    ///
    /// Markers are only inserted when the identifier range is valid and the
    /// configuration asks for the corresponding list kind.
    pub fn set_bullet_and_numbering_info(
        &mut self,
        config: &LayoutConfig,
        text_left: f32,
        list_type: ListType,
        identifier: Option<(usize, usize)>,
    ) {
        let wanted = match list_type {
            ListType::None => false,
            ListType::Bulleted => config.mark_bullets,
            ListType::Numbered => config.mark_numberings,
        };
        if let Some((start, end)) = identifier {
            if wanted && start < self.items.len() && end < self.items.len() {
                let start_x = self.items[start].bbox.x0;
                self.insert_marker(start, start_x, LIST_START);
                // `end` now addresses the member just before the identifier end
                let end_x = self.items[end].bbox.x1;
                self.insert_marker(end + 1, end_x, LIST_END);
            }
        }
        self.text_left = text_left;
        self.list_type = list_type;
    }

    fn insert_marker(&mut self, at: usize, x: f32, code: char) {
        let bbox = BoundingBox::with_bands(x, self.bbox.y0, x, self.bbox.y1, self.bbox.y0, self.bbox.y1);
        let marker = Primitive::glyph(bbox, Glyph::marker(code, self.baseline()));
        self.items.insert(at.min(self.items.len()), marker);
    }
}

fn approximately_same(s1: &[char], s2: &[char]) -> bool {
    let mut i = 0;
    while i < s1.len().min(s2.len()) {
        if is_decimal_digit(s1[i]) || is_decimal_digit(s2[i]) {
            i += 1;
            continue;
        }
        if s1[i] != s2[i] {
            break;
        }
        i += 1;
    }
    10 * i > 9 * s1.len().max(s2.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::FontId;

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

    #[test]
    fn test_baseline_is_mode() {
        let mut line = text_line("abc", 0.0, 100.0);
        line.append_item(Primitive::glyph(
            BoundingBox::new(20.0, 95.0, 25.0, 104.0),
            Glyph::new('x', 102.0, Some(FontId(1)), 6.0),
        ));
        assert!((line.baseline() - 108.0).abs() < 1e-3);
    }

    #[test]
    fn test_baseline_of_image_line_is_center() {
        let line = LineSegment::from_item(Primitive::image(BoundingBox::new(0.0, 10.0, 50.0, 30.0)));
        assert!((line.baseline() - 20.0).abs() < 1e-3);
        assert!(line.is_pure_image());
        assert_eq!(line.most_used_font_size(), -1.0);
    }

    #[test]
    fn test_mixed_type_degrades_to_none() {
        let mut line = text_line("ab", 0.0, 0.0);
        assert_eq!(line.item_type(), PrimitiveType::Char);
        line.append_item(Primitive::image(BoundingBox::new(12.0, 0.0, 20.0, 10.0)));
        assert_eq!(line.item_type(), PrimitiveType::None);
        assert!(!line.is_pure_image());
        assert_eq!(line.content_string(), "ab\u{FFFC}");
    }

    #[test]
    fn test_dash_line_is_ruler() {
        assert!(text_line("--------", 0.0, 0.0).is_horizontal_ruler());
        assert!(!text_line("---", 0.0, 0.0).is_horizontal_ruler());
        assert!(!text_line("--a-----", 0.0, 0.0).is_horizontal_ruler());
    }

    #[test]
    fn test_merge_requires_vertical_overlap() {
        let mut a = text_line("ab", 0.0, 0.0);
        let b = text_line("cd", 20.0, 50.0);
        assert!(!a.merge_with(&b));
        let c = text_line("cd", 20.0, 2.0);
        assert!(a.merge_with(&c));
        assert_eq!(a.content_string(), "abcd");
    }

    #[test]
    fn test_shares_fonts() {
        let a = text_line("abc", 0.0, 0.0);
        let b = text_line("xyz", 0.0, 20.0);
        assert!(a.shares_fonts_with(&b));
        let punct = text_line("...", 0.0, 20.0);
        assert!(a.shares_fonts_with(&punct));
    }

    #[test]
    fn test_is_same_as_ignores_digits() {
        let margins = PageMargins::default();
        let a = text_line("Page 12 of 40", 0.0, 0.0);
        let b = text_line("Page 13 of 40", 0.0, 0.0);
        assert!(a.is_same_as(&margins, &b, &margins));
        let c = text_line("Chapter three", 0.0, 0.0);
        assert!(!a.is_same_as(&margins, &c, &margins));
    }

    #[test]
    fn test_list_markers_wrap_identifier() {
        let mut line = text_line("1. Item", 0.0, 0.0);
        let config = LayoutConfig::default();
        line.set_bullet_and_numbering_info(&config, 15.0, ListType::Numbered, Some((0, 2)));
        let text = line.content_string();
        assert_eq!(text, "\u{02E1}1.\u{2097} Item");
        assert_eq!(line.text_left(), 15.0);

        let mut unmarked = text_line("1. Item", 0.0, 0.0);
        let config = LayoutConfig {
            mark_numberings: false,
            ..LayoutConfig::default()
        };
        unmarked.set_bullet_and_numbering_info(&config, 15.0, ListType::Numbered, Some((0, 2)));
        assert_eq!(unmarked.content_string(), "1. Item");
        assert_eq!(unmarked.list_type(), ListType::Numbered);
    }
}
