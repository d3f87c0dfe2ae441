// Block classification
//
// Every block is split into inner columns, every inner column into sub-blocks
// of uniform paragraph shape. Sub-blocks are then classified: tables grow from
// caption or ruler evidence, images are gathered around their captions, and a
// bottom ruler opens the footnote area. The marked tree is finally flattened
// back into a list of blocks.
//
// Blocks are addressed by index paths into the page's block tree; blocks merged
// into another one are tombstoned instead of being removed, so paths stay valid.

#![allow(clippy::too_many_arguments)]

use crate::block::{Block, ContentType, Location};
use crate::block_creation::append_line_to_blocks;
use crate::config::{
    LayoutConfig, DEFAULT_HORIZONTAL_MARGIN, DEFAULT_VERTICAL_MARGIN, HEADER_FOOTER_PAGE_MARGIN_THRESHOLD, MIN_ITEM_SIZE,
};
use crate::fonts::FontMetrics;
use crate::geometry::{BoundingBox, Bounded, PageMargins, PageSize};
use crate::layout::{LayoutStorage, RegionNode};
use crate::line::{Association, LineSegment};
use crate::ordering::insertion_sort_by;
use crate::paragraphs::split_block_based_on_justification;
use crate::primitive::PrimitiveType;
use crate::sentences::ParState;
use log::{debug, trace};
use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::LazyLock;

static RE_TABLE_CAPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(Table|table|TABLE)").expect("valid table caption regex"));
static RE_IMAGE_CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Fig\.|FIG\.|FIG |Fig |Figure|figure|Scheme|scheme)").expect("valid image caption regex")
});

#[inline]
#[must_use]
pub fn is_table_caption(text: &str) -> bool {
    RE_TABLE_CAPTION.is_match(text)
}

#[inline]
#[must_use]
pub fn is_image_caption(text: &str) -> bool {
    RE_IMAGE_CAPTION.is_match(text)
}

/// Ruled across half its width, or laid out in several columns.
#[must_use]
pub fn can_be_table(block: &Block) -> bool {
    !block.horz_rulers(0.5 * block.bbox.width()).is_empty() || block.inner_cols_count > 1
}

/// Split `block` into inner blocks, one per inner column.
///
/// Outermost columns are widened to the block's edges. Lines go top to bottom
/// to the first column holding them, merging overlapping fragments; lines no
/// column holds end up in a trailing inner block. The block keeps no lines of
/// its own afterwards.
pub fn split_to_inner_blocks(
    config: &LayoutConfig,
    page: PageSize,
    margins: &PageMargins,
    metrics: &dyn FontMetrics,
    block: &mut Block,
) {
    let lines = block.take_lines();
    let mut regions: Vec<RegionNode> = {
        let mut storage = LayoutStorage::new(&lines, false);
        storage.identify_inner_columns(page, margins);
        storage.children().to_vec()
    };
    widen_outer_regions(&mut regions, &block.bbox, page);

    let mut order: Vec<usize> = (0..lines.len()).collect();
    insertion_sort_by(&mut order, |&a, &b| lines[a].bbox().y0 < lines[b].bbox().y0);
    let mut pending: Vec<Option<LineSegment>> = lines.into_iter().map(Some).collect();

    let (location, content_type) = (block.location, block.content_type);
    let inner = block.inner_blocks_mut();
    for region in &regions {
        let mut candidate = None;
        for &idx in &order {
            if !pending[idx].as_ref().is_some_and(|line| region.contains_line(line)) {
                continue;
            }
            if let Some(line) = pending[idx].take() {
                append_line_to_blocks(inner, &mut candidate, Some(region), line, location, content_type, true);
            }
        }
    }
    let mut leftover = None;
    for idx in order {
        if let Some(line) = pending[idx].take() {
            append_line_to_blocks(inner, &mut leftover, None, line, location, content_type, true);
        }
    }

    block.naive_sort_by_reading_order();
    for inner in block.inner_blocks_mut() {
        for line in inner.lines_mut() {
            line.consolidate_spaces(metrics, config);
        }
    }
}

/// Regions touching the leftmost text edge take the block's left edge, and
/// likewise on the right; the difference becomes their slack.
fn widen_outer_regions(regions: &mut [RegionNode], block: &BoundingBox, page: PageSize) {
    let mut min_left = page.width;
    let mut max_right = 0.0_f32;
    for region in regions.iter() {
        min_left = min_left.min(region.bbox.x0 + region.space_to_left);
        max_right = max_right.max(region.bbox.x1 - region.space_to_right);
    }
    for region in regions.iter_mut() {
        if region.bbox.x0 + region.space_to_left <= min_left + 1.0 {
            region.space_to_left = min_left - block.x0;
            region.bbox.x0 = block.x0;
        }
        if region.bbox.x1 - region.space_to_right >= max_right - 1.0 {
            region.space_to_right = block.x1 - max_right;
            region.bbox.x1 = block.x1;
        }
    }
}

/// Address of a block in the page tree: top block, inner block, sub-block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BlockPath {
    block: usize,
    inner: Option<usize>,
    sub: Option<usize>,
}

impl BlockPath {
    const fn top(block: usize) -> Self {
        Self {
            block,
            inner: None,
            sub: None,
        }
    }

    const fn inner(block: usize, inner: usize) -> Self {
        Self {
            block,
            inner: Some(inner),
            sub: None,
        }
    }

    const fn sub(block: usize, inner: usize, sub: usize) -> Self {
        Self {
            block,
            inner: Some(inner),
            sub: Some(sub),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TableCandidate {
    /// The previous page ended with a table
    PreviousPage(BoundingBox),
    Here(BlockPath),
}

/// What classification needs to know about the lines of a sub-block.
#[derive(Debug, Clone, Copy)]
struct SubBlockFacts {
    bbox: BoundingBox,
    starts_with_table_caption: bool,
    has_image_caption: bool,
    first_line: BoundingBox,
    first_is_ruler: bool,
    ends_with_ruler: bool,
}

impl SubBlockFacts {
    fn of(block: &Block) -> Option<Self> {
        let mut lines: Vec<&LineSegment> = block.lines().iter().collect();
        insertion_sort_by(&mut lines, |a, b| a.bbox().y0 < b.bbox().y0 && a.bbox().x0 < b.bbox().x0);
        let (first, last) = (*lines.first()?, *lines.last()?);
        Some(Self {
            bbox: block.bbox,
            starts_with_table_caption: can_be_table_caption(block, first),
            has_image_caption: can_be_image_caption(block, last) || can_be_image_caption(block, first),
            first_line: *first.bbox(),
            first_is_ruler: first.is_horizontal_ruler(),
            ends_with_ruler: last.is_horizontal_ruler(),
        })
    }
}

fn can_be_table_caption(block: &Block, line: &LineSegment) -> bool {
    let bbox = line.bbox();
    is_table_caption(&line.content_string())
        && ((bbox.x0 - block.bbox.x0).abs() < 2.0
            || can_be_table(block)
            || !block.lines().iter().any(|other| {
                other.item_type() == PrimitiveType::Char
                    && other.bbox().x0 < bbox.x0
                    && other.bbox().vert_overlap(bbox) > MIN_ITEM_SIZE
            }))
}

fn can_be_image_caption(block: &Block, line: &LineSegment) -> bool {
    let bbox = line.bbox();
    is_image_caption(&line.content_string())
        && ((bbox.x0 - block.bbox.x0).abs() < 2.0
            || block.mostly_image()
            || !block.lines().iter().any(|other| {
                other.item_type() == PrimitiveType::Char && other.bbox().x0 < bbox.x0
            }))
}

/// Inverted box marking "nothing gathered yet".
fn unset_margins(page: PageSize) -> BoundingBox {
    BoundingBox::new(page.width, page.height, 0.0, 0.0)
}

fn margins_are_set(margins: &BoundingBox) -> bool {
    margins.y1 >= margins.y0
}

fn grow_margins(margins: &mut BoundingBox, sub_block: &BoundingBox, part: &BoundingBox) {
    margins.x0 = sub_block.x0.min(margins.x0.min(part.x0));
    margins.y0 = sub_block.y0.min(margins.y0.min(part.y0));
    margins.x1 = sub_block.x1.max(margins.x1.max(part.x1));
    margins.y1 = sub_block.y1.max(margins.y1.max(part.y1));
    margins.top = margins.y0;
    margins.bottom = margins.y1;
}

/// Lines of a block and of all blocks nested in it.
fn collect_lines<'a>(block: &'a Block, out: &mut Vec<&'a LineSegment>) {
    out.extend(block.lines());
    for inner in block.inner_blocks() {
        collect_lines(inner, out);
    }
}

/// A block too short, or of too small a print, to be running text of its column.
fn is_minor(block: &Block, column_line_height: f32) -> bool {
    block.bbox.height() < 1.8 * column_line_height || block.approx_line_height() < 0.6 * column_line_height
}

struct BlockMarker<'a> {
    config: &'a LayoutConfig,
    page: PageSize,
    margins: &'a PageMargins,
    metrics: &'a dyn FontMetrics,
    blocks: Vec<Block>,
    removed: FxHashSet<BlockPath>,
    used: FxHashSet<BlockPath>,
    footnote_top: f32,
    table_candidate: Option<TableCandidate>,
    table_caption: Option<BlockPath>,
    table_ended_with_ruler: bool,
    table_margins: BoundingBox,
    image_margins: BoundingBox,
}

impl BlockMarker<'_> {
    fn get(&self, path: BlockPath) -> &Block {
        let top = &self.blocks[path.block];
        match (path.inner, path.sub) {
            (None, _) => top,
            (Some(inner), None) => &top.inner_blocks()[inner],
            (Some(inner), Some(sub)) => &top.inner_blocks()[inner].inner_blocks()[sub],
        }
    }

    fn get_mut(&mut self, path: BlockPath) -> &mut Block {
        let top = &mut self.blocks[path.block];
        match (path.inner, path.sub) {
            (None, _) => top,
            (Some(inner), None) => &mut top.inner_blocks_mut()[inner],
            (Some(inner), Some(sub)) => &mut top.inner_blocks_mut()[inner].inner_blocks_mut()[sub],
        }
    }

    /// Leaves of the tree as classification sees them: a top block that still
    /// has lines, else its inner blocks, or their sub-blocks when split.
    /// Sub-blocks keep their order in both directions.
    fn leaves(&self, reverse: bool) -> Vec<BlockPath> {
        let mut paths = Vec::new();
        let mut tops: Vec<usize> = (0..self.blocks.len()).collect();
        if reverse {
            tops.reverse();
        }
        for b in tops {
            if self.removed.contains(&BlockPath::top(b)) {
                continue;
            }
            let block = &self.blocks[b];
            if !block.lines().is_empty() {
                paths.push(BlockPath::top(b));
                continue;
            }
            let mut inners: Vec<usize> = (0..block.inner_blocks().len()).collect();
            if reverse {
                inners.reverse();
            }
            for i in inners {
                let path = BlockPath::inner(b, i);
                if self.removed.contains(&path) {
                    continue;
                }
                let subs = block.inner_blocks()[i].inner_blocks().len();
                if subs == 0 {
                    paths.push(path);
                    continue;
                }
                paths.extend(
                    (0..subs)
                        .map(|s| BlockPath::sub(b, i, s))
                        .filter(|path| !self.removed.contains(path)),
                );
            }
        }
        paths
    }

    /// A bottom-quarter main block opening with a ruler near its left edge
    /// and holding exactly one page-wide ruler starts the footnote area.
    fn find_footnote_top(&mut self) {
        let limit = (1.0 - HEADER_FOOTER_PAGE_MARGIN_THRESHOLD) * self.page.height;
        for block in &self.blocks {
            if block.location != Location::Main || block.bbox.y0 <= limit {
                continue;
            }
            let Some(first) = block.lines().first() else {
                continue;
            };
            if first.is_horizontal_ruler()
                && first.bbox().x0 - block.bbox.x0 < 10.0
                && block.horz_rulers(0.05 * self.page.width).len() == 1
            {
                self.footnote_top = block.bbox.y0;
            }
        }
    }

    fn mark_as_footnote(&mut self, path: BlockPath) {
        let block = self.get_mut(path);
        block.location = Location::Footnote;
        block.content_type = ContentType::Text;
    }

    /// Type every unused leaf inside `margins` and merge the parts into the
    /// first of them. The caption keeps its own block and is linked to the
    /// merged part. Clears the margins and the caption.
    fn mark_within_margins(&mut self, caption: Option<BlockPath>, is_image: bool) {
        let margins = if is_image { self.image_margins } else { self.table_margins };
        let (part_type, caption_type) = if is_image {
            (ContentType::Image, ContentType::ImageCaption)
        } else {
            (ContentType::Table, ContentType::TableCaption)
        };

        if margins_are_set(&margins) {
            let mut parent = None;
            for path in self.leaves(false) {
                if self.used.contains(&path) || !margins.contains(&self.get(path).bbox, DEFAULT_HORIZONTAL_MARGIN) {
                    continue;
                }
                self.used.insert(path);
                let is_caption = Some(path) == caption;
                self.get_mut(path).content_type = if is_caption { caption_type } else { part_type };
                if !is_caption && parent.is_none() {
                    parent = Some(path);
                }
            }

            if let Some(parent) = parent {
                let mut merged = 0usize;
                for path in self.leaves(false) {
                    let block = self.get(path);
                    if path == parent
                        || block.content_type != part_type
                        || !margins.contains(&block.bbox, DEFAULT_HORIZONTAL_MARGIN)
                    {
                        continue;
                    }
                    let lines = self.get_mut(path).take_lines();
                    let target = self.get_mut(parent);
                    for line in lines {
                        target.append_line_segment(line, false);
                    }
                    self.used.remove(&path);
                    self.removed.insert(path);
                    merged += 1;
                }
                trace!("marked {:?} at {:?}, merged {} parts", part_type, margins, merged);
                if let Some(caption) = caption.filter(|&path| self.get(path).content_type == caption_type) {
                    self.attach_caption(parent, caption);
                }
            }
        }

        if is_image {
            self.image_margins = unset_margins(self.page);
        } else {
            self.table_margins = unset_margins(self.page);
            self.table_candidate = None;
            self.table_caption = None;
        }
    }

    /// Caption lines point at the first line of `part`, which points back at
    /// the first caption line.
    fn attach_caption(&mut self, part: BlockPath, caption: BlockPath) {
        let (Some(part_id), Some(caption_id)) = (
            self.get(part).lines().first().map(LineSegment::id),
            self.get(caption).lines().first().map(LineSegment::id),
        ) else {
            return;
        };
        for line in self.get_mut(caption).lines_mut() {
            line.set_relative(part_id, Association::IsCaptionOf);
        }
        if let Some(first) = self.get_mut(part).lines_mut().first_mut() {
            first.set_relative(caption_id, Association::HasAsCaption);
        }
    }

    fn flush_table_candidate(&mut self) {
        let caption = self.table_caption;
        self.mark_within_margins(caption, false);
    }

    /// Grow the image margins by `part` when it is an image, or when it is a
    /// minor block and not the caption block itself. False when the search
    /// should stop.
    fn take_image_part(
        &mut self,
        part: BlockPath,
        is_caption_block: bool,
        caption_box: &BoundingBox,
        column_line_height: f32,
        found: &mut bool,
    ) -> bool {
        let block = self.get(part);
        let mostly_image = block.mostly_image();
        if mostly_image || (!is_caption_block && is_minor(block, column_line_height)) {
            let part_box = block.bbox;
            grow_margins(&mut self.image_margins, caption_box, &part_box);
            *found |= mostly_image;
            return true;
        }
        is_caption_block
    }

    /// Walk every leaf bottom up and gather images stacked above the caption
    /// (`horizontal`) or beside it.
    fn gather_image_neighbours(&mut self, caption: BlockPath, column_line_height: f32, horizontal: bool, found: &mut bool) {
        let caption_box = self.get(caption).bbox;
        for path in self.leaves(true) {
            if path == caption || self.used.contains(&path) {
                continue;
            }
            let block = self.get(path);
            if block.location != Location::Main {
                continue;
            }
            let bbox = block.bbox;
            let has_horz_overlap = bbox.horz_overlap(&caption_box) > bbox.width() - 2.0;
            let has_vert_overlap = bbox.vert_overlap(&caption_box) > caption_box.height() - 2.0;
            let aligned = if horizontal {
                has_horz_overlap && bbox.width() < caption_box.width() + MIN_ITEM_SIZE && bbox.y0 < caption_box.y0
            } else {
                has_vert_overlap
            };
            if !aligned {
                continue;
            }

            let mostly_image = block.mostly_image();
            let minor = is_minor(block, column_line_height);
            if mostly_image
                || (has_horz_overlap && bbox.y1 > self.image_margins.y0 + DEFAULT_VERTICAL_MARGIN - 2.0 && minor)
            {
                grow_margins(&mut self.image_margins, &caption_box, &bbox);
                *found |= mostly_image;
            } else if !minor {
                break;
            }
        }
    }

    /// Gather the image a caption describes: sub-blocks above it in its inner
    /// column, then earlier inner columns, then any aligned neighbour.
    fn mark_image(&mut self, caption: BlockPath, column_subs: &[BlockPath], inner_pos: usize, column_line_height: f32) {
        let caption_box = self.get(caption).bbox;
        let mut found = false;
        let mut keep_looking = true;

        for &part in column_subs.iter().rev() {
            if self.removed.contains(&part) {
                continue;
            }
            if !self.take_image_part(part, part == caption, &caption_box, column_line_height, &mut found) {
                keep_looking = false;
                break;
            }
        }

        if keep_looking {
            'inner: for i in (0..inner_pos).rev() {
                let inner = BlockPath::inner(caption.block, i);
                if self.removed.contains(&inner)
                    || self.used.contains(&inner)
                    || self.get(inner).location != Location::Main
                {
                    continue;
                }
                let subs = self.get(inner).inner_blocks().len();
                if subs == 0 {
                    if !self.take_image_part(inner, false, &caption_box, column_line_height, &mut found) {
                        keep_looking = false;
                        break;
                    }
                    continue;
                }
                for s in (0..subs).rev() {
                    let sub = BlockPath::sub(caption.block, i, s);
                    if self.removed.contains(&sub)
                        || self.used.contains(&sub)
                        || !self.take_image_part(sub, false, &caption_box, column_line_height, &mut found)
                    {
                        keep_looking = false;
                        break 'inner;
                    }
                }
            }
        }

        if keep_looking {
            self.gather_image_neighbours(caption, column_line_height, true, &mut found);
            if !found {
                self.image_margins = unset_margins(self.page);
                self.gather_image_neighbours(caption, column_line_height, false, &mut found);
            }
        }

        if found {
            self.mark_within_margins(Some(caption), true);
        } else {
            self.image_margins = unset_margins(self.page);
        }
    }

    /// Classify one sub-block of a main column.
    fn mark_sub_block(
        &mut self,
        path: BlockPath,
        column_subs: &[BlockPath],
        inner_pos: usize,
        column_line_height: f32,
        opens_page: bool,
        previous_table: Option<BoundingBox>,
    ) {
        let Some(facts) = SubBlockFacts::of(self.get(path)) else {
            return;
        };

        if self.table_candidate.is_none() && opens_page {
            self.table_candidate = previous_table.map(TableCandidate::PreviousPage);
        }

        if let Some(candidate) = self.table_candidate {
            let candidate_box = match candidate {
                TableCandidate::PreviousPage(bbox) => bbox,
                TableCandidate::Here(candidate) => self.get(candidate).bbox,
            };
            let factor = if self.table_ended_with_ruler && candidate_box.height() > 4.0 * column_line_height {
                -0.5
            } else {
                -1.9
            };
            let max_distance = factor * column_line_height;
            if candidate_box.vert_overlap(&facts.bbox) > max_distance && can_be_table(self.get(path)) {
                self.get_mut(path).content_type = ContentType::Table;
                if let TableCandidate::Here(candidate) = candidate {
                    let is_caption = Some(candidate) == self.table_caption;
                    self.get_mut(candidate).content_type =
                        if is_caption { ContentType::TableCaption } else { ContentType::Table };
                }
                self.table_candidate = Some(TableCandidate::Here(path));
                self.table_ended_with_ruler = facts.ends_with_ruler;
                grow_margins(&mut self.table_margins, &facts.bbox, &facts.bbox);
            } else {
                self.flush_table_candidate();
            }
        }

        if facts.starts_with_table_caption {
            if can_be_table(self.get(path)) {
                self.get_mut(path).content_type = ContentType::Table;
                grow_margins(&mut self.table_margins, &facts.bbox, &facts.bbox);
            } else {
                self.table_caption = Some(path);
            }
            self.table_candidate = Some(TableCandidate::Here(path));
            if facts.ends_with_ruler {
                self.table_ended_with_ruler = true;
            }
        } else if facts.has_image_caption {
            self.mark_image(path, column_subs, inner_pos, column_line_height);
        } else if facts.first_line.y0 > (1.0 - HEADER_FOOTER_PAGE_MARGIN_THRESHOLD) * self.page.height
            && facts.first_is_ruler
        {
            let mut column_lines = Vec::new();
            collect_lines(&self.blocks[path.block], &mut column_lines);
            let min_width = 0.05 * self.page.width;
            let rulers_below = column_lines.iter().any(|line| {
                line.is_horizontal_ruler() && line.bbox().width() > min_width && line.bbox().y0 > facts.first_line.y1
            });
            if !rulers_below {
                self.footnote_top = facts.bbox.y0;
                let block = self.get_mut(path);
                block.location = Location::Footnote;
                if block.content_type == ContentType::None {
                    block.content_type = ContentType::Text;
                }
            }
        }
    }

    /// Split one main block's inner columns into sub-blocks and classify them.
    fn mark_column(&mut self, b: usize, opens_page: bool, previous_table: Option<BoundingBox>) {
        let column_line_height = self.blocks[b].approx_line_height();
        let mut first_inner = true;

        for i in 0..self.blocks[b].inner_blocks().len() {
            let inner_path = BlockPath::inner(b, i);
            if self.removed.contains(&inner_path) {
                continue;
            }
            if self.get(inner_path).bbox.y0 >= self.footnote_top {
                self.mark_as_footnote(inner_path);
                continue;
            }

            let inner = self.get_mut(inner_path);
            let column_subs: Vec<BlockPath> = if can_be_table(inner) || inner.mostly_image() {
                vec![inner_path]
            } else {
                let subs = split_block_based_on_justification(inner);
                if subs.is_empty() {
                    vec![inner_path]
                } else {
                    drop(inner.take_lines());
                    let count = subs.len();
                    for sub in subs {
                        inner.append_inner_block(sub);
                    }
                    (0..count).map(|s| BlockPath::sub(b, i, s)).collect()
                }
            };

            let mut first_sub = true;
            for (pos, &path) in column_subs.iter().enumerate() {
                if self.removed.contains(&path) {
                    continue;
                }
                if self.get(path).bbox.y0 >= self.footnote_top {
                    self.mark_as_footnote(path);
                    continue;
                }
                let opens = opens_page && first_inner && first_sub;
                first_sub = false;
                self.mark_sub_block(path, &column_subs[..=pos], i, column_line_height, opens, previous_table);
            }
            first_inner = false;
        }
    }

    fn run(&mut self, previous_table: Option<BoundingBox>) {
        self.find_footnote_top();

        let mut first_main = true;
        for b in 0..self.blocks.len() {
            if self.removed.contains(&BlockPath::top(b)) {
                continue;
            }
            if self.blocks[b].bbox.y0 >= self.footnote_top {
                self.mark_as_footnote(BlockPath::top(b));
            }
            split_to_inner_blocks(self.config, self.page, self.margins, self.metrics, &mut self.blocks[b]);
            if self.blocks[b].location != Location::Main {
                continue;
            }
            self.mark_column(b, first_main, previous_table);
            first_main = false;
        }

        if self.table_candidate.is_some() {
            self.flush_table_candidate();
        }
        for block in &mut self.blocks {
            mark_unclassified(block);
        }
    }

    /// Leaves in order; adjacent sub-blocks of one inner column sharing a
    /// content type are fused.
    fn flatten(self) -> Vec<Block> {
        let removed = self.removed;
        let mut flat = Vec::new();
        for (b, mut block) in self.blocks.into_iter().enumerate() {
            if removed.contains(&BlockPath::top(b)) {
                continue;
            }
            if !block.lines().is_empty() {
                flat.push(block);
                continue;
            }
            for (i, mut inner) in std::mem::take(block.inner_blocks_mut()).into_iter().enumerate() {
                if removed.contains(&BlockPath::inner(b, i)) {
                    continue;
                }
                if !inner.lines().is_empty() {
                    flat.push(inner);
                    continue;
                }
                let mut last: Option<Block> = None;
                for (s, mut sub) in std::mem::take(inner.inner_blocks_mut()).into_iter().enumerate() {
                    if removed.contains(&BlockPath::sub(b, i, s)) {
                        continue;
                    }
                    let same_type = last.as_ref().is_some_and(|prev| prev.content_type == sub.content_type);
                    if !same_type {
                        flat.extend(last.replace(sub));
                    } else if let Some(prev) = last.as_mut() {
                        prev.bbox.union_with(&sub.bbox);
                        for line in sub.take_lines() {
                            prev.append_line_segment(line, false);
                        }
                    }
                }
                flat.extend(last);
            }
        }
        flat
    }
}

/// Leaves still unclassified become text, or images when made of images only.
/// A lone short ruler stays text.
fn mark_unclassified(block: &mut Block) {
    if !block.lines().is_empty() && block.content_type == ContentType::None {
        let lone_short_ruler = block.lines().len() == 1
            && block.lines()[0].is_horizontal_ruler()
            && block.lines()[0].bbox().width() < 0.25 * block.bbox.width();
        block.content_type = if !lone_short_ruler && block.is_pure_image() {
            ContentType::Image
        } else {
            ContentType::Text
        };
        return;
    }
    for inner in block.inner_blocks_mut() {
        mark_unclassified(inner);
    }
}

/// Split every block into inner columns and sub-blocks, classify them as
/// text, list, table, image, caption or footnote, and flatten the result.
///
/// A table ending the previous page (`prev.last_page_main_block`) may be
/// continued by the first sub-block of the page.
#[must_use]
pub fn split_and_mark_blocks(
    config: &LayoutConfig,
    page: PageSize,
    margins: &PageMargins,
    metrics: &dyn FontMetrics,
    blocks: Vec<Block>,
    prev: &ParState,
) -> Vec<Block> {
    let block_count = blocks.len();
    let previous_table = prev
        .last_page_main_block
        .as_ref()
        .filter(|block| block.content_type == ContentType::Table)
        .map(|block| block.bbox);

    let mut marker = BlockMarker {
        config,
        page,
        margins,
        metrics,
        blocks,
        removed: FxHashSet::default(),
        used: FxHashSet::default(),
        footnote_top: page.height,
        table_candidate: None,
        table_caption: None,
        table_ended_with_ruler: false,
        table_margins: unset_margins(page),
        image_margins: unset_margins(page),
    };
    marker.run(previous_table);
    let merged = marker.removed.len();
    let flat = marker.flatten();
    debug!("Marked {} blocks into {} ({} merged)", block_count, flat.len(), merged);
    flat
}
