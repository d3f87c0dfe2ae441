// Block creation
//
// Distributes the lines of a page over one running block per column region,
// plus side-channel blocks for header, footer and sidebar lines.

use crate::block::{Block, ContentType, Location};
use crate::config::{LayoutConfig, SIDEBAR_PAGE_MARGIN_THRESHOLD};
use crate::fonts::FontMetrics;
use crate::geometry::{BoundingBox, Bounded, PageSize};
use crate::layout::RegionNode;
use crate::line::LineSegment;
use crate::ordering::naive_sort_by_reading_order;
use crate::primitive::{Primitive, PrimitiveType};
use log::{debug, trace};

/// Thickness of the virtual hairlines framing a background swatch.
const HAIRLINE_THICKNESS: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Header,
    Footer,
    SidebarLeft,
    SidebarRight,
    Region(usize),
    Unplaced,
}

/// Append `line` to the running block of a region, opening the block first
/// when `candidate` is still empty.
///
/// A block opened from a region takes the region's horizontal extent, slack
/// and inner-column count. Backgrounds and lone paths spanning almost the whole
/// block are framed by two virtual hairlines and marked as background.
pub(crate) fn append_line_to_blocks(
    blocks: &mut Vec<Block>,
    candidate: &mut Option<usize>,
    layout: Option<&RegionNode>,
    line: LineSegment,
    location: Location,
    content_type: ContentType,
    merge_overlapping: bool,
) {
    let idx = *candidate.get_or_insert_with(|| {
        let mut block = Block::new(location, content_type);
        if let Some(region) = layout {
            block.inner_cols_count = region.inner_col_count;
            block.bbox.x0 = region.bbox.x0;
            block.bbox.x1 = region.bbox.x1;
            block.space_to_left = region.space_to_left;
            block.space_to_right = region.space_to_right;
        }
        blocks.push(block);
        blocks.len() - 1
    });
    let block = &mut blocks[idx];

    if line.is_background() || is_spanning_path(&line, block) {
        let bbox = *line.bbox();
        let top = BoundingBox::new(bbox.x0, bbox.y0, bbox.x1, bbox.y0 + HAIRLINE_THICKNESS);
        let bottom = BoundingBox::new(bbox.x0, bbox.y1 - HAIRLINE_THICKNESS, bbox.x1, bbox.y1);
        block.append_line_segment(LineSegment::from_item(Primitive::virtual_line(top)), false);
        block.append_line_segment(LineSegment::from_item(Primitive::virtual_line(bottom)), false);
        let mut line = line;
        line.mark_as_background();
        block.append_line_segment(line, false);
    } else {
        block.append_line_segment(line, merge_overlapping);
    }
}

/// A single non-ruler path covering more than 90% of the block width.
///
/// Blocks without a horizontal extent yet accept any width.
fn is_spanning_path(line: &LineSegment, block: &Block) -> bool {
    line.is_pure_image()
        && !line.is_horizontal_ruler()
        && !line.is_vertical_ruler()
        && line.len() == 1
        && line.items()[0].item_type() == PrimitiveType::Path
        && (block.bbox.is_unset() || line.bbox().width() > 0.9 * block.bbox.width())
}

/// Build the raw blocks of a page.
///
/// Header, footer and sidebar lines go to side-channel blocks when the
/// configuration discards them. Every other line goes to the first region
/// containing it; lines outside every region are kept in a trailing main
/// block. Region blocks get their spaces consolidated, and all blocks come
/// back in reading order.
#[must_use]
pub fn make_blocks(
    config: &LayoutConfig,
    page: PageSize,
    regions: &[RegionNode],
    lines: Vec<LineSegment>,
    metrics: &dyn FontMetrics,
) -> Vec<Block> {
    let line_count = lines.len();
    let mut blocks: Vec<Block> = Vec::new();
    let mut header = None;
    let mut footer = None;
    let mut sidebar_left = None;
    let mut sidebar_right = None;
    let mut unplaced = None;
    let mut region_blocks: Vec<Option<usize>> = vec![None; regions.len()];

    for line in lines {
        let flags = *line.flags();
        let destination = if config.discard_headers && flags.header {
            Destination::Header
        } else if config.discard_footers && flags.footer {
            Destination::Footer
        } else if config.discard_sidebars && flags.sidebar {
            if line.bbox().x1 < SIDEBAR_PAGE_MARGIN_THRESHOLD * page.width {
                Destination::SidebarLeft
            } else {
                Destination::SidebarRight
            }
        } else {
            regions
                .iter()
                .position(|region| region.contains_line(&line))
                .map_or(Destination::Unplaced, Destination::Region)
        };

        let text = ContentType::Text;
        match destination {
            Destination::Header => {
                append_line_to_blocks(&mut blocks, &mut header, None, line, Location::Header, text, false);
            }
            Destination::Footer => {
                append_line_to_blocks(&mut blocks, &mut footer, None, line, Location::Footer, text, false);
            }
            Destination::SidebarLeft => {
                append_line_to_blocks(&mut blocks, &mut sidebar_left, None, line, Location::SidebarLeft, text, false);
            }
            Destination::SidebarRight => {
                append_line_to_blocks(&mut blocks, &mut sidebar_right, None, line, Location::SidebarRight, text, false);
            }
            Destination::Region(idx) => append_line_to_blocks(
                &mut blocks,
                &mut region_blocks[idx],
                Some(&regions[idx]),
                line,
                Location::Main,
                ContentType::None,
                false,
            ),
            Destination::Unplaced => {
                trace!("line at ({}, {}) lies outside every region", line.bbox().x0, line.bbox().y0);
                append_line_to_blocks(&mut blocks, &mut unplaced, None, line, Location::Main, ContentType::None, false);
            }
        }
    }

    for idx in region_blocks.into_iter().flatten().chain(unplaced) {
        for line in blocks[idx].lines_mut() {
            line.consolidate_spaces(metrics, config);
        }
    }
    for block in &mut blocks {
        block.naive_sort_by_reading_order();
    }

    debug!("Made {} blocks from {} lines over {} regions", blocks.len(), line_count, regions.len());
    naive_sort_by_reading_order(blocks)
}
