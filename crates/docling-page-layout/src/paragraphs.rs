// Paragraph segmentation
//
// A block's lines are scanned top to bottom and each line is judged against
// the paragraph being built: it belongs to it, it closes it, or it starts a
// new one. The judgement depends on the block's justification.

use crate::block::{Block, ContentType, Justification};
use crate::config::MIN_ITEM_SIZE;
use crate::geometry::{BoundingBox, Bounded};
use crate::line::{Association, LineSegment, ListType};
use crate::sentences::ParState;
use log::trace;
use serde::{Deserialize, Serialize};

/// Fraction of the line height under which two horizontal positions count as equal.
const HORZ_POS_THRESH_TO_LINE_HEIGHT_RATIO: f32 = 0.5;

/// How a line relates to the paragraph being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineParagraphRelation {
    #[default]
    None,
    BelongsTo,
    /// Belongs to the paragraph and closes it
    LastLineOf,
    DoesNotBelong,
}

/// Properties of the enclosing block used while judging its lines.
#[derive(Debug, Clone, Copy)]
struct ParentMetrics {
    content_type: ContentType,
    line_count: usize,
    line_spacing: f32,
    x0: f32,
    x1: f32,
    tight_right: f32,
    text_indent_pos: f32,
}

impl ParentMetrics {
    fn of(block: &Block) -> Self {
        Self {
            content_type: block.content_type,
            line_count: block.lines().len(),
            line_spacing: block.approx_line_spacing(),
            x0: block.bbox.x0,
            x1: block.bbox.x1,
            tight_right: block.tight_right(),
            text_indent_pos: block.text_indent_pos(),
        }
    }
}

/// Width of the line's first word plus two of its widest glyphs.
fn first_word_width(line: &LineSegment) -> f32 {
    let widest = line
        .items()
        .iter()
        .filter(|item| item.is_char())
        .map(|item| item.bbox.width())
        .fold(0.0, f32::max);
    let word_end = line
        .items()
        .iter()
        .find(|item| item.glyph_data().is_some_and(|glyph| glyph.is_space()))
        .map_or(line.bbox().x1, |space| space.bbox.x0);
    (word_end - line.bbox().x0) + 2.0 * widest
}

/// Judge `line` against `paragraph`, a paragraph under construction in `parent`.
///
/// List items always open a paragraph. In list blocks a continuation line
/// must start at the item's text left. A baseline jump over 1.1 times the
/// block line spacing (blocks of more than two lines) or a font change starts
/// a new paragraph. Otherwise the paragraph's justification decides:
/// - `Center`: every line belongs;
/// - `Left`: a line off the text indent, or following a line that ended
///   short by more than a word, starts a new paragraph;
/// - `Right`: a line ending short is the last one, a line following an
///   indented one starts a new paragraph;
/// - `Justified`: a line ending short is the last one, a line off the text
///   indent starts a new paragraph.
#[must_use]
pub fn estimate_line_paragraph_relation(
    parent: &Block,
    line: &LineSegment,
    prev_line: Option<&LineSegment>,
    paragraph: &Block,
) -> LineParagraphRelation {
    relation_to_paragraph(&ParentMetrics::of(parent), line, prev_line.map(Bounded::bbox), paragraph)
}

fn relation_to_paragraph(
    parent: &ParentMetrics,
    line: &LineSegment,
    prev_line: Option<&BoundingBox>,
    paragraph: &Block,
) -> LineParagraphRelation {
    use LineParagraphRelation::{BelongsTo, DoesNotBelong, LastLineOf};

    let opening_line = paragraph.lines().first();
    if line.list_type() != ListType::None {
        return if opening_line.is_none() { BelongsTo } else { DoesNotBelong };
    }

    if parent.content_type == ContentType::List {
        if let Some(item) = opening_line.filter(|first| first.list_type() != ListType::None) {
            return if (line.bbox().x0 - item.text_left()).abs() < 2.0 {
                BelongsTo
            } else {
                DoesNotBelong
            };
        }
    }

    if let Some(last) = paragraph.lines().last() {
        if parent.line_count > 2 && line.baseline() - last.baseline() > 1.1 * parent.line_spacing {
            return DoesNotBelong;
        }
        if !paragraph.shares_fonts_with_line(line) {
            return DoesNotBelong;
        }
    }

    let bbox = line.bbox();
    let height = bbox.height();
    let off_indent = (bbox.x0 - parent.text_indent_pos).abs() > height;
    let ends_short = parent.tight_right - bbox.x1 > height;

    match paragraph.justification {
        Justification::Center => BelongsTo,
        Justification::Left => {
            if off_indent {
                DoesNotBelong
            } else if prev_line.is_some_and(|prev| parent.x1 - prev.x1 > first_word_width(line)) {
                DoesNotBelong
            } else {
                BelongsTo
            }
        }
        Justification::Right => {
            if ends_short {
                LastLineOf
            } else if prev_line.is_some_and(|prev| prev.x0 - parent.x0 > first_word_width(line)) {
                DoesNotBelong
            } else {
                BelongsTo
            }
        }
        Justification::Justified | Justification::None => {
            if ends_short {
                LastLineOf
            } else if off_indent {
                DoesNotBelong
            } else {
                BelongsTo
            }
        }
    }
}

/// Split the lines of `block` into paragraph blocks of the same location,
/// content type and justification.
///
/// A line that does not belong flushes the open paragraph before it; a last
/// line flushes it after. With `finish_on_break`, a paragraph flushed before a
/// non-belonging line is certainly finished; otherwise only paragraphs closed
/// by a last line are. A last line always finishes its paragraph. Every
/// paragraph spans the block horizontally.
fn split_by_relation(block: &mut Block, finish_on_break: bool) -> Vec<Block> {
    debug_assert!(block.inner_blocks().is_empty());
    block.estimate_paragraph_params();

    let parent = ParentMetrics::of(block);
    let (location, content_type, justification) = (block.location, block.content_type, block.justification);
    let new_paragraph = || Block::with_justification(location, content_type, justification);

    let mut paragraphs = Vec::new();
    let mut current = new_paragraph();
    let mut relation = LineParagraphRelation::None;
    let mut prev_line: Option<BoundingBox> = None;
    let line_count = block.lines().len();

    for (idx, line) in block.lines().iter().enumerate() {
        relation = if line.association() == Association::InsideTextOf {
            LineParagraphRelation::BelongsTo
        } else {
            relation_to_paragraph(&parent, line, prev_line.as_ref(), &current)
        };
        prev_line = Some(*line.bbox());

        if relation == LineParagraphRelation::DoesNotBelong && !current.lines().is_empty() {
            current.certainly_finished = finish_on_break;
            paragraphs.push(std::mem::replace(&mut current, new_paragraph()));
        }

        current.append_line_segment(line.clone(), false);

        if relation == LineParagraphRelation::LastLineOf {
            current.certainly_finished = true;
            paragraphs.push(std::mem::replace(&mut current, new_paragraph()));
        }
    }
    if !current.lines().is_empty() {
        current.certainly_finished = relation == LineParagraphRelation::LastLineOf;
        paragraphs.push(current);
    }

    for paragraph in &mut paragraphs {
        paragraph.bbox.x0 = block.bbox.x0;
        paragraph.bbox.x1 = block.bbox.x1;
        paragraph.space_to_left = block.space_to_left;
        paragraph.space_to_right = block.space_to_right;
    }
    trace!(
        "split {} lines at y0 = {} into {} paragraphs ({:?})",
        line_count,
        block.bbox.y0,
        paragraphs.len(),
        justification
    );
    paragraphs
}

/// Split a text block into paragraphs.
///
/// The block keeps its lines; the paragraphs hold copies. Only the block's
/// last paragraph can be left open for a continuation.
#[must_use]
pub fn split_block_to_paragraphs(block: &mut Block) -> Vec<Block> {
    split_by_relation(block, true)
}

/// Split a block into sub-blocks of uniform paragraph shape for classification.
///
/// Sub-blocks are only marked finished when a last line closed them.
#[must_use]
pub fn split_block_based_on_justification(block: &mut Block) -> Vec<Block> {
    split_by_relation(block, false)
}

/// Can `paragraph` continue the text block of `prev`?
///
/// Both must be list blocks (with `paragraph` not opening a new item), or
/// share justification, a font, their horizontal alignment, and sit at most
/// two line heights apart when stacked.
#[must_use]
pub fn can_continue_prev_block(paragraph: &Block, prev: &ParState) -> bool {
    let Some(prev_block) = prev.text_block.as_ref() else {
        return false;
    };
    let line_height = paragraph.approx_line_height();
    let same_horz_pos_threshold = HORZ_POS_THRESH_TO_LINE_HEIGHT_RATIO * line_height;

    if paragraph.content_type == ContentType::List && prev_block.content_type == ContentType::List {
        return paragraph
            .lines()
            .first()
            .map_or(true, |first| first.list_type() == ListType::None);
    }

    if paragraph.justification != prev_block.justification {
        return false;
    }

    let (current, previous) = (&paragraph.bbox, &prev_block.bbox);
    let horz_overlap = current.horz_overlap(previous);
    let min_width = current.width().min(previous.width());

    let aligned = match prev_block.justification {
        Justification::None => false,
        Justification::Justified => {
            let partial_overlap = horz_overlap > MIN_ITEM_SIZE && horz_overlap < 0.8 * min_width;
            let width_differs =
                horz_overlap > 0.5 * min_width && (current.width() - previous.width()).abs() > 0.5 * line_height;
            let indented = paragraph
                .lines()
                .first()
                .is_some_and(|first| (first.bbox().x0 - current.x0).abs() > line_height);
            !partial_overlap && !width_differs && !indented
        }
        Justification::Left => !(horz_overlap > MIN_ITEM_SIZE && (current.x0 - previous.x0).abs() > same_horz_pos_threshold),
        Justification::Right => !(horz_overlap > MIN_ITEM_SIZE && (current.x1 - previous.x1).abs() > same_horz_pos_threshold),
        Justification::Center => (current.center_x() - previous.center_x()).abs() <= same_horz_pos_threshold,
    };
    if !aligned || !paragraph.shares_fonts_with(prev_block) {
        return false;
    }

    !(horz_overlap > 0.5 * current.width() && current.y0 - previous.y1 > 2.0 * line_height)
}
