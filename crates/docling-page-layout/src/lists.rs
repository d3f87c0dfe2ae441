// Bullet and numbering detection
//
// A line is a list item when its first word is a lone non-alphanumeric glyph
// (a bullet), a decimal or roman numeral ending in `.` or `:`, or a decimal
// number in square brackets. The text of list items is anchored at the first
// word after the identifier.

use crate::block::{Block, ContentType};
use crate::config::{LayoutConfig, MIN_ITEM_SIZE};
use crate::geometry::Bounded;
use crate::histogram::FloatHistogram;
use crate::line::{LineSegment, ListType};
use crate::primitive::{is_alphanumeric, is_dot, Primitive};
use log::trace;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static RE_DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[.\x{FF0E}\x{0387}\x{2024}\x{FE52}]*[0-9][0-9.\x{FF0E}\x{0387}\x{2024}\x{FE52}]*$")
        .expect("valid decimal regex")
});
static RE_ROMAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[.\x{FF0E}\x{0387}\x{2024}\x{FE52}]*[IVX][IVX.\x{FF0E}\x{0387}\x{2024}\x{FE52}]*$",
        r"|^[.\x{FF0E}\x{0387}\x{2024}\x{FE52}]*[ivx][ivx.\x{FF0E}\x{0387}\x{2024}\x{FE52}]*$"
    ))
    .expect("valid roman numeral regex")
});

/// Kind of numbering of a numbered list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ListSubType {
    #[default]
    None,
    /// `1.`, `2.1:`
    Numerals,
    /// `iv.`, `XI:`
    RomanNumerals,
    /// `[12]`
    Brackets,
}

/// List role detected for one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListDetection {
    pub list_type: ListType,
    pub sub_type: ListSubType,
    /// Left edge of the first word after the identifier, or of the line
    pub text_left: f32,
    /// Index of the first identifier member and of the space ending it
    pub identifier: Option<(usize, usize)>,
}

impl ListDetection {
    fn non_list(line: &LineSegment) -> Self {
        Self {
            list_type: ListType::None,
            sub_type: ListSubType::None,
            text_left: line.bbox().x0,
            identifier: None,
        }
    }
}

fn is_space_item(item: &Primitive) -> bool {
    item.glyph_data().is_some_and(|glyph| glyph.is_space())
}

/// Text of `items`, or `None` when one of them is not a glyph.
fn glyph_text(items: &[Primitive]) -> Option<String> {
    items.iter().map(Primitive::code).collect()
}

/// Classify the first word of `line`.
#[must_use]
pub fn identify_line_list_type(line: &LineSegment) -> ListDetection {
    let items = line.items();
    let len = items.len();

    let item_pos = items.iter().take_while(|item| is_space_item(item)).count();
    if item_pos >= len {
        return ListDetection::non_list(line);
    }
    let space_pos = item_pos + items[item_pos..].iter().take_while(|item| !is_space_item(item)).count();
    if space_pos >= len {
        return ListDetection::non_list(line);
    }
    let text_pos = space_pos + items[space_pos..].iter().take_while(|item| is_space_item(item)).count();
    if text_pos >= len {
        return ListDetection::non_list(line);
    }

    let detection = |list_type, sub_type| ListDetection {
        list_type,
        sub_type,
        text_left: items[text_pos].bbox.x0,
        identifier: Some((item_pos, space_pos)),
    };

    let first = items[item_pos].code();
    if space_pos - item_pos == 1 && !first.is_some_and(is_alphanumeric) {
        return detection(ListType::Bulleted, ListSubType::None);
    }

    let last = items[space_pos - 1].code();
    if last.is_some_and(|code| is_dot(code) || code == ':') {
        if let Some(number) = glyph_text(&items[item_pos..space_pos - 1]) {
            if RE_DECIMAL.is_match(&number) {
                return detection(ListType::Numbered, ListSubType::Numerals);
            }
            if RE_ROMAN.is_match(&number) {
                return detection(ListType::Numbered, ListSubType::RomanNumerals);
            }
        }
    }

    if first == Some('[') && last == Some(']') && space_pos - item_pos >= 2 {
        if let Some(number) = glyph_text(&items[item_pos + 1..space_pos - 1]) {
            if RE_DECIMAL.is_match(&number) {
                return detection(ListType::Numbered, ListSubType::Brackets);
            }
        }
    }

    ListDetection::non_list(line)
}

/// Detect every line of `block` and vote on the text anchors.
///
/// List items open histogram buckets at their text left; plain lines only
/// reinforce existing buckets with their left edge.
#[must_use]
pub fn identify_line_list_types(block: &Block) -> (Vec<ListDetection>, FloatHistogram) {
    let mut histogram = FloatHistogram::new(1.0);
    let detections: Vec<ListDetection> = block
        .lines()
        .iter()
        .map(|line| {
            let detection = identify_line_list_type(line);
            if detection.list_type == ListType::None {
                histogram.reinforce(line.bbox().x0);
            } else {
                histogram.insert(detection.text_left);
            }
            detection
        })
        .collect();
    (detections, histogram)
}

/// Mark list items of a block.
///
/// When no plain line after the first starts at the block's left edge, the
/// block is a list: every line gets its list role and anchored text left. Otherwise only
/// a leading decimal numbering and the bulleted lines are marked.
pub fn process_bullets_and_numbering(config: &LayoutConfig, block: &mut Block) {
    let (detections, histogram) = identify_line_list_types(block);
    if histogram.is_empty() {
        return;
    }

    let block_left = block.bbox.x0;
    let valid_list_block = block
        .lines()
        .iter()
        .zip(&detections)
        .enumerate()
        .all(|(i, (line, detection))| {
            detection.list_type != ListType::None || i == 0 || line.bbox().x0 > block_left + MIN_ITEM_SIZE
        });

    let mark = |line: &mut LineSegment, detection: &ListDetection| match histogram.approximate(detection.text_left) {
        Some(text_left) => {
            line.set_bullet_and_numbering_info(config, text_left, detection.list_type, detection.identifier);
        }
        None => line.set_bullet_and_numbering_info(config, 0.0, ListType::None, None),
    };

    if valid_list_block {
        for (line, detection) in block.lines_mut().iter_mut().zip(&detections) {
            mark(line, detection);
        }
        block.content_type = ContentType::List;
        trace!("block at y0 = {} is a list of {} lines", block.bbox.y0, detections.len());
        return;
    }

    let lines = block.lines_mut();
    if let (Some(first), Some(line)) = (detections.first(), lines.first_mut()) {
        if first.sub_type == ListSubType::Numerals {
            if let Some(text_left) = histogram.approximate(first.text_left) {
                line.set_bullet_and_numbering_info(config, text_left, first.list_type, first.identifier);
            }
        }
    }
    for (line, detection) in lines.iter_mut().zip(&detections) {
        if detection.list_type == ListType::Bulleted {
            mark(line, detection);
        }
    }
}
