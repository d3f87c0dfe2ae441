// Line and stripe assembly
//
// Groups the raw primitives of a page into horizontal line segments, and into
// coarser vertical stripes used to measure the page's content margins.

use crate::config::{LayoutConfig, MIN_ITEM_SIZE};
use crate::fonts::FontMetrics;
use crate::geometry::{Bounded, PageSize};
use crate::line::LineSegment;
use crate::ordering::insertion_sort_by;
use crate::primitive::{Primitive, PrimitiveType};
use log::{debug, trace};

/// Max horizontal gap between a non-text item and the line it joins.
const MAX_OBJECT_GAP: f32 = 5.0;
/// Max vertical gap between two fragments of the same vertical ruler.
const MAX_RULER_PART_GAP: f32 = 1.5;

fn split_texts(items: &[Primitive]) -> (Vec<Primitive>, Vec<Primitive>) {
    let (mut texts, others): (Vec<Primitive>, Vec<Primitive>) = items.iter().partition(|item| item.is_char());
    insertion_sort_by(&mut texts, |a, b| a.bbox.x1 < b.bbox.x1);
    (texts, others)
}

/// Vertically merged bands of primitives, sorted by top edge.
///
/// Text and non-text content never share a stripe.
#[must_use]
pub fn find_vert_stripes(items: &[Primitive], page: PageSize) -> Vec<LineSegment> {
    let (texts, others) = split_texts(items);

    let mut stripes: Vec<LineSegment> = Vec::new();
    for item in texts {
        let owner = stripes
            .iter()
            .position(|stripe| item.bbox.vert_overlap(stripe.bbox()) > 0.5 * item.bbox.height());
        match owner {
            Some(idx) => stripes[idx].append_item(item),
            None => stripes.push(LineSegment::from_item(item)),
        }
    }

    let is_wide_ruler = |bbox_width: f32, ruler: bool| ruler && bbox_width > 0.75 * page.width;
    let mut image_stripes: Vec<LineSegment> = Vec::new();
    for item in others {
        let owner = image_stripes.iter().position(|stripe| {
            if item.is_background() || stripe.item_type() == PrimitiveType::Background {
                return false;
            }
            let tolerance = if is_wide_ruler(item.bbox.width(), item.is_horizontal_ruler())
                || is_wide_ruler(stripe.bbox().width(), stripe.is_horizontal_ruler())
            {
                -2.0
            } else {
                -15.0
            };
            item.bbox.vert_overlap(stripe.bbox()) > tolerance
        });
        match owner {
            Some(idx) => image_stripes[idx].append_item(item),
            None => image_stripes.push(LineSegment::from_item(item)),
        }
    }

    stripes.extend(image_stripes);
    insertion_sort_by(&mut stripes, |a, b| a.bbox().y0 < b.bbox().y0);
    debug!("found {} stripes", stripes.len());
    stripes
}

fn inherit_side_flags(line: &mut LineSegment, item: &Primitive) {
    if !item.flags.repeated {
        return;
    }
    let flags = line.flags_mut();
    if item.flags.header {
        flags.mark_repeated(0);
        flags.header = true;
    } else if item.flags.footer {
        flags.mark_repeated(0);
        flags.footer = true;
    } else if item.flags.sidebar {
        flags.mark_repeated(0);
        flags.sidebar = true;
    }
}

/// Split page content into line segments by baseline band and horizontal gap.
///
/// Chars are placed first, in order of their right edge; non-text items then
/// join a conforming line they nearly touch. Backgrounds always get a line of
/// their own.
#[must_use]
pub fn find_lines(items: &[Primitive]) -> Vec<LineSegment> {
    let (texts, others) = split_texts(items);

    let mut lines: Vec<LineSegment> = Vec::new();
    for item in texts {
        let owner = lines.iter().position(|line| {
            if !item.conforms_to_line(line.bbox().y0, line.bbox().y1, line.baseline()) {
                return false;
            }
            let Some(last) = line.items().last() else {
                return false;
            };
            let last_size = last.glyph_data().map_or(0.0, |glyph| glyph.font_size);
            let item_size = item.glyph_data().map_or(0.0, |glyph| glyph.font_size);
            let threshold = if !last.flags.main_content && !item.flags.main_content {
                f32::MAX
            } else {
                0.5 * last_size.min(item_size)
            };
            let spacer = item.bbox.horz_spacer(line.bbox());
            spacer.width() < threshold
                && !others.iter().any(|other| {
                    !other.bbox.is_very_thin() && !other.bbox.is_very_fat() && other.bbox.touches(&spacer)
                })
        });
        let idx = owner.unwrap_or_else(|| {
            lines.push(LineSegment::new());
            lines.len() - 1
        });
        inherit_side_flags(&mut lines[idx], &item);
        lines[idx].append_item(item);
    }

    for item in others {
        let owner = if item.is_background() {
            None
        } else {
            lines.iter().position(|line| {
                if line.len() == 1 && line.items()[0].is_background() {
                    return false;
                }
                item.conforms_to_line(line.bbox().y0, line.bbox().y1, line.baseline())
                    && item.bbox.horz_spacer(line.bbox()).width() < MAX_OBJECT_GAP
            })
        };
        let idx = owner.unwrap_or_else(|| {
            lines.push(LineSegment::new());
            lines.len() - 1
        });
        inherit_side_flags(&mut lines[idx], &item);
        lines[idx].append_item(item);
    }

    debug!("found {} lines", lines.len());
    lines
}

fn needs_pure_image_merge_prevention(image: &LineSegment, text: &LineSegment, vert_overlap: f32) -> bool {
    if !image.is_pure_image() || text.is_pure_image() {
        return false;
    }
    if image.bbox().height() > 1.5 * text.bbox().height() || image.bbox().width() > 5.0 * text.bbox().height() {
        return true;
    }
    vert_overlap < 0.75 * text.bbox().height()
}

fn are_same_line_parts(line0: &LineSegment, line1: &LineSegment) -> bool {
    let threshold = line0.most_used_font_size().max(line1.most_used_font_size());
    if threshold > 0.0 && line1.bbox().horz_spacer(line0.bbox()).width() > 10.0 * threshold {
        return false;
    }

    let vert_overlap = line0.bbox().vert_overlap(line1.bbox());
    if needs_pure_image_merge_prevention(line0, line1, vert_overlap)
        || needs_pure_image_merge_prevention(line1, line0, vert_overlap)
    {
        return false;
    }

    let (h0, h1) = (line0.bbox().height(), line1.bbox().height());
    if vert_overlap > 0.5 * h0.min(h1) {
        return true;
    }
    vert_overlap > 1.0 && (h0 < 0.75 * h1 || h1 < 0.75 * h0)
}

/// Coalesce line fragments that overlap vertically, then re-synthesize spaces.
#[must_use]
pub fn merge_overlapping_lines(
    lines: Vec<LineSegment>,
    metrics: &dyn FontMetrics,
    config: &LayoutConfig,
) -> Vec<LineSegment> {
    let mut corrected: Vec<LineSegment> = Vec::with_capacity(lines.len());
    for line in lines {
        let lone_background = line.len() == 1 && line.items()[0].is_background();
        let target = if lone_background {
            None
        } else {
            corrected.iter().position(|existing| are_same_line_parts(existing, &line))
        };
        match target {
            Some(idx) if corrected[idx].merge_with(&line) => {
                trace!("merged overlapping line at y0 = {}", line.bbox().y0);
            }
            _ => corrected.push(line),
        }
    }

    for line in &mut corrected {
        line.consolidate_spaces(metrics, config);
    }
    corrected
}

/// Union vertical ruler fragments that share a horizontal position and are
/// stacked with gaps of at most 1.5 units.
#[must_use]
pub fn merge_vert_ruler_parts(items: Vec<Primitive>) -> Vec<Primitive> {
    let is_ruler = |item: &Primitive| !item.is_char() && item.is_vertical_ruler();
    let mut used = vec![false; items.len()];
    let mut result = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        if used[i] {
            continue;
        }
        used[i] = true;
        if !is_ruler(item) {
            result.push(*item);
            continue;
        }

        let mut candidates = Vec::new();
        for (j, other) in items.iter().enumerate() {
            if used[j] || !is_ruler(other) || other.bbox.horz_overlap(&item.bbox) < MIN_ITEM_SIZE {
                continue;
            }
            used[j] = true;
            candidates.push(*other);
        }
        candidates.push(*item);
        insertion_sort_by(&mut candidates, |a, b| a.bbox.y0 < b.bbox.y0);

        let mut ruler = candidates[0];
        for next in candidates.into_iter().skip(1) {
            if next.bbox.y0 > ruler.bbox.y1 + MAX_RULER_PART_GAP {
                result.push(ruler);
                ruler = next;
            } else {
                ruler.bbox.union_with(&next.bbox);
            }
        }
        result.push(ruler);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::NoFontMetrics;
    use crate::geometry::BoundingBox;
    use crate::primitive::{FontId, Glyph};

    fn word(text: &str, x0: f32, top: f32) -> Vec<Primitive> {
        text.chars()
            .enumerate()
            .map(|(i, code)| {
                let x = x0 + i as f32 * 5.0;
                let mut item = Primitive::glyph(
                    BoundingBox::new(x, top, x + 5.0, top + 10.0),
                    Glyph::new(code, top + 8.0, Some(FontId(1)), 10.0),
                );
                item.flags.main_content = true;
                item
            })
            .collect()
    }

    #[test]
    fn test_find_lines_splits_on_wide_gap() {
        let mut items = word("abc", 0.0, 0.0);
        items.extend(word("def", 18.0, 0.0));
        items.extend(word("far", 200.0, 0.0));
        items.extend(word("next", 0.0, 20.0));
        let lines = find_lines(&items);
        let texts: Vec<String> = lines.iter().map(LineSegment::content_string).collect();
        assert_eq!(texts.len(), 3);
        assert!(texts.contains(&"abcdef".to_string()));
        assert!(texts.contains(&"far".to_string()));
        assert!(texts.contains(&"next".to_string()));
    }

    #[test]
    fn test_image_in_gap_blocks_join() {
        let mut items = word("ab", 0.0, 0.0);
        items.extend(word("cd", 13.0, 0.0));
        items.push(Primitive::image(BoundingBox::new(10.5, 1.0, 12.5, 9.0)));
        let lines = find_lines(&items);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|line| line.content_string() == "cd"));
        assert!(lines.iter().any(|line| line.content_string() == "ab\u{FFFC}"));
    }

    #[test]
    fn test_background_gets_own_line() {
        let mut items = word("ab", 0.0, 0.0);
        items.push(Primitive::background(BoundingBox::new(0.0, 0.0, 100.0, 10.0)));
        let lines = find_lines(&items);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(LineSegment::is_background));
    }

    #[test]
    fn test_stripes_sorted_by_top() {
        let mut items = word("low", 0.0, 50.0);
        items.extend(word("high", 0.0, 10.0));
        items.extend(word("same", 100.0, 12.0));
        let stripes = find_vert_stripes(&items, PageSize::new(600.0, 800.0));
        assert_eq!(stripes.len(), 2);
        assert!(stripes[0].bbox().y0 < stripes[1].bbox().y0);
        assert_eq!(stripes[0].len(), 8);
    }

    #[test]
    fn test_overlapping_fragments_merge() {
        let first = LineSegment::from_items(word("ab", 0.0, 0.0));
        let second = LineSegment::from_items(word("cd", 10.0, 1.0));
        let lower = LineSegment::from_items(word("ef", 0.0, 30.0));
        let merged = merge_overlapping_lines(
            vec![first, second, lower],
            &NoFontMetrics,
            &LayoutConfig::default(),
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].content_string(), "abcd");
    }

    #[test]
    fn test_vertical_ruler_parts_union() {
        let items = vec![
            Primitive::path(BoundingBox::new(100.0, 0.0, 101.0, 50.0)),
            Primitive::path(BoundingBox::new(100.0, 51.0, 101.0, 100.0)),
            Primitive::path(BoundingBox::new(100.0, 200.0, 101.0, 250.0)),
            Primitive::path(BoundingBox::new(300.0, 0.0, 301.0, 50.0)),
        ];
        let merged = merge_vert_ruler_parts(items);
        assert_eq!(merged.len(), 3);
        assert!(merged.iter().any(|item| item.bbox.y0 == 0.0 && item.bbox.y1 == 100.0 && item.bbox.x0 == 100.0));
    }
}
