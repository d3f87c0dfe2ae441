// Column consolidation
//
// The XY-cut over-segments: every paragraph, caption and list item can end up
// as its own leaf. These passes fold the leaves back into page columns. Merges
// mutate columns in place while several working lists refer to them, so
// columns live in an arena and the lists hold arena indices.

use super::column::Column;
use super::Direction;
use crate::config::{DEFAULT_HORIZONTAL_MARGIN, DEFAULT_VERTICAL_MARGIN, MAX_MERGE_TRIES, MIN_ITEM_SIZE};
use crate::geometry::{BoundingBox, PageMargins, PageSize};
use crate::ordering::insertion_sort_by;
use log::{debug, trace, warn};
use rustc_hash::FxHashSet;

/// Columns narrower than this share of the content width are "small".
#[inline]
fn min_acceptable_col_width(content_width: f32) -> f32 {
    0.15 * content_width
}

/// Merge margin between two columns; image adjacency changes it when stacking.
fn margin_threshold(direction: Direction, first: &Column, second: &Column) -> f32 {
    if direction != Direction::Vertical {
        return DEFAULT_HORIZONTAL_MARGIN;
    }
    let (a, b) = (&first.bbox, &second.bbox);
    let above = a.y1 < b.y0;
    let below = a.y0 > b.y1;
    if (above && first.bottom_is_image() != second.top_is_image())
        || (below && first.top_is_image() != second.bottom_is_image())
    {
        0.0
    } else if (above && first.bottom_is_image() && second.top_is_image())
        || (below && first.top_is_image() && second.bottom_is_image())
    {
        -15.0
    } else {
        DEFAULT_VERTICAL_MARGIN
    }
}

/// Working list a merge pass reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pool {
    Approved,
    Remaining,
}

struct ColumnMerger {
    cols: Vec<Column>,
    approved: Vec<usize>,
    remaining: Vec<usize>,
    content_width: f32,
    usable_width: f32,
    ignore_vertical_space: bool,
}

/// Consolidate XY-cut leaves into final columns.
///
/// `content_width` scales the "small column" threshold; with
/// `ignore_vertical_space` same-width columns are stacked regardless of the
/// vertical distance between them.
#[must_use]
pub fn merge_cols(
    columns: Vec<Column>,
    page: PageSize,
    margins: &PageMargins,
    content_width: f32,
    ignore_vertical_space: bool,
) -> Vec<Column> {
    let initial = columns.len();
    let mut merger = ColumnMerger {
        approved: (0..columns.len()).collect(),
        cols: columns,
        remaining: Vec::new(),
        content_width,
        usable_width: page.width - margins.left - margins.right,
        ignore_vertical_space,
    };
    merger.run();

    let mut seen = FxHashSet::default();
    let result: Vec<Column> = merger
        .approved
        .iter()
        .filter(|id| seen.insert(**id))
        .map(|&id| merger.cols[id].clone())
        .collect();
    debug!("Merged {} column candidates into {} columns", initial, result.len());
    result
}

impl ColumnMerger {
    fn run(&mut self) {
        let mut converged = false;
        for _ in 0..MAX_MERGE_TRIES {
            let ids = self.approved.clone();
            let (_, approved) = self.merge_overlapped(&ids, Direction::Vertical);
            let (changed, approved) = self.merge_overlapped(&approved, Direction::Horizontal);
            self.approved = approved;
            if !changed {
                converged = true;
                break;
            }
        }
        if !converged {
            warn!("Overlap merge did not converge after {} tries", MAX_MERGE_TRIES);
        }

        let mut previous: Vec<usize> = Vec::new();
        for _ in 0..MAX_MERGE_TRIES {
            for _ in 0..MAX_MERGE_TRIES {
                let cols = &self.cols;
                insertion_sort_by(&mut self.approved, |&a, &b| {
                    cols[a].bbox.width() > cols[b].bbox.width() || cols[a].bbox.x0 < cols[b].bbox.x0
                });
                self.expand_margins(false);
                self.expand_margins(true);
                self.merge_same_expanded_width_columns();

                if !self.has_changed(&previous) {
                    break;
                }
                previous.clone_from(&self.approved);
                let remaining = std::mem::take(&mut self.remaining);
                self.approved.extend(remaining);
            }

            let mut adjacent_changed = false;
            for _ in 0..MAX_MERGE_TRIES {
                let content_width = self.content_width;
                let min_width = min_acceptable_col_width(content_width);
                let mut changed = self.merge_adjacent(Pool::Remaining, Pool::Approved, Direction::Horizontal, |_| true);
                changed |= self.merge_adjacent(Pool::Approved, Pool::Approved, Direction::Horizontal, |col| {
                    col.merged_count > 3
                        || (col.merged_count > 2
                            && (col.min_merged_width < min_width
                                || col.sum_merged_width / f32::from(col.merged_count) < min_width))
                });
                changed |= self.merge_adjacent(Pool::Remaining, Pool::Remaining, Direction::Horizontal, |_| true);
                changed |= self.merge_adjacent(Pool::Remaining, Pool::Remaining, Direction::Vertical, |_| true);
                adjacent_changed |= changed;
                if !changed {
                    break;
                }
            }

            if !adjacent_changed {
                break;
            }
            let remaining = std::mem::take(&mut self.remaining);
            self.approved.extend(remaining);
        }

        let remaining = std::mem::take(&mut self.remaining);
        self.approved.extend(remaining);
    }

    fn pool(&self, pool: Pool) -> &Vec<usize> {
        match pool {
            Pool::Approved => &self.approved,
            Pool::Remaining => &self.remaining,
        }
    }

    fn pool_mut(&mut self, pool: Pool) -> &mut Vec<usize> {
        match pool {
            Pool::Approved => &mut self.approved,
            Pool::Remaining => &mut self.remaining,
        }
    }

    /// Fold `from` into `into`, writing back the (possibly tightened) source.
    fn merge_pair(&mut self, into: usize, from: usize, tight: bool) {
        let mut other = self.cols[from].clone();
        self.cols[into].merge_with(&mut other, tight);
        self.cols[from] = other;
    }

    fn has_changed(&self, previous: &[usize]) -> bool {
        if previous.len() != self.approved.len() {
            return true;
        }
        previous.iter().zip(&self.approved).any(|(&old, &new)| {
            let (a, b) = (&self.cols[old].bbox, &self.cols[new].bbox);
            (a.x0 - b.x0).abs() > MIN_ITEM_SIZE
                || (a.x1 - b.x1).abs() > MIN_ITEM_SIZE
                || (a.y0 - b.y0).abs() > MIN_ITEM_SIZE
                || (a.y1 - b.y1).abs() > MIN_ITEM_SIZE
        })
    }

    /// Union columns overlapping along `direction` until nothing changes.
    fn merge_overlapped(&mut self, ids: &[usize], direction: Direction) -> (bool, Vec<usize>) {
        let mut current = ids.to_vec();
        if direction == Direction::Vertical {
            for &id in &current {
                self.cols[id].reset_expansion();
            }
        }

        let mut changed = false;
        let mut result = Vec::new();
        for _ in 0..MAX_MERGE_TRIES {
            let cols = &self.cols;
            insertion_sort_by(&mut current, |&a, &b| cols[a].bbox.y0 < cols[b].bbox.y0);

            let mut inner_changed = false;
            let mut used = FxHashSet::default();
            result.clear();

            for &col in &current {
                if used.contains(&col) {
                    continue;
                }
                for &other in &current {
                    if other == col || !self.overlaps_along(direction, col, other) {
                        continue;
                    }
                    let bound = self.cols[other].bbox.union(&self.cols[col].bbox);
                    if direction == Direction::Vertical && self.would_cut_wide_column(&current, col, other, &bound) {
                        continue;
                    }

                    if used.contains(&other) {
                        self.merge_pair(other, col, false);
                    } else {
                        self.merge_pair(col, other, false);
                        if !used.contains(&col) {
                            result.push(col);
                        }
                    }
                    trace!("Merged overlapping columns {col} and {other} ({direction:?})");
                    used.insert(col);
                    used.insert(other);
                    self.cols[col].is_merged = true;
                    self.cols[other].is_merged = true;
                    inner_changed = true;
                    changed = true;
                }
                if !used.contains(&col) {
                    result.push(col);
                }
            }

            if !inner_changed {
                break;
            }
            current.clone_from(&result);
        }
        (changed, result)
    }

    fn overlaps_along(&self, direction: Direction, col: usize, other: usize) -> bool {
        let (c, o) = (&self.cols[col], &self.cols[other]);
        let threshold = margin_threshold(direction, c, o);
        if direction == Direction::Vertical {
            o.bbox.horz_overlap(&c.bbox) > (0.01 * c.bbox.width()).min(0.01 * o.bbox.width())
                && o.bbox.vert_overlap(&c.bbox) > threshold
        } else {
            o.bbox.vert_overlap(&c.bbox) > (0.01 * c.bbox.height()).min(0.01 * o.bbox.height())
                && o.bbox.horz_overlap(&c.bbox) > threshold
        }
    }

    /// A stacking merge is vetoed when an unmerged column wider than half the
    /// usable page is involved and the merged box would only clip some column.
    fn would_cut_wide_column(&self, ids: &[usize], col: usize, other: usize, bound: &BoundingBox) -> bool {
        let wide = |id: usize| {
            let column = &self.cols[id];
            !column.is_merged && column.bbox.width() > 0.5 * self.usable_width
        };
        ids.iter().any(|&id| {
            (wide(id) || wide(other) || wide(col))
                && bound.touches(&self.cols[id].bbox)
                && !bound.contains(&self.cols[id].bbox, DEFAULT_VERTICAL_MARGIN)
        })
    }

    /// Widen approved columns toward the nearest aligned neighbour above or below.
    fn expand_margins(&mut self, exclude_rulers: bool) {
        for _ in 0..MAX_MERGE_TRIES {
            let mut changed = false;
            for i in 0..self.approved.len() {
                let col = self.approved[i];
                if exclude_rulers && self.cols[col].is_horizontal_ruler() {
                    continue;
                }
                let (best_x0, best_x1) = self.expansion_target(col, exclude_rulers);
                let column = &mut self.cols[col];
                if best_x0 < column.bbox.x0 {
                    column.expand_to_left(best_x0);
                    changed = true;
                }
                if best_x1 > column.bbox.x1 {
                    column.expand_to_right(best_x1);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn expansion_target(&self, col: usize, exclude_rulers: bool) -> (f32, f32) {
        let current = &self.cols[col].bbox;
        let mut left_limit = 0.0_f32;
        let mut right_limit = f32::MAX;
        let mut above_left: Option<&BoundingBox> = None;
        let mut above_right: Option<&BoundingBox> = None;
        let mut below_left: Option<&BoundingBox> = None;
        let mut below_right: Option<&BoundingBox> = None;

        for &other_id in &self.approved {
            if other_id == col || (exclude_rulers && self.cols[other_id].is_horizontal_ruler()) {
                continue;
            }
            let other = &self.cols[other_id].bbox;
            if other.vert_overlap(current) >= MIN_ITEM_SIZE {
                if other.x1 < current.x0 {
                    left_limit = left_limit.max(other.x1);
                }
                if other.x0 > current.x1 {
                    right_limit = right_limit.min(other.x0);
                }
            } else if other.horz_overlap(current) > 2.0 {
                let above = other.y0 < current.center_y();
                let below = !above && other.y1 > current.center_y();
                if other.x0 - 2.0 < current.x0 {
                    if above {
                        if above_left.map_or(true, |b| b.y1 < other.y1) {
                            above_left = Some(other);
                        }
                    } else if below && below_left.map_or(true, |b| b.y0 > other.y0) {
                        below_left = Some(other);
                    }
                }
                if other.x1 + 2.0 > current.x1 {
                    if above {
                        if above_right.map_or(true, |b| b.y1 < other.y1) {
                            above_right = Some(other);
                        }
                    } else if below && below_right.map_or(true, |b| b.y0 > other.y0) {
                        below_right = Some(other);
                    }
                }
            }
        }

        let with_distance = |neighbour: Option<&BoundingBox>, edge: fn(&BoundingBox) -> f32| {
            neighbour.map(|b| (edge(b), current.vert_overlap(b)))
        };
        let best_x0 = nearest_edge(
            with_distance(above_left, |b: &BoundingBox| b.x0),
            with_distance(below_left, |b: &BoundingBox| b.x0),
            |x0| x0 > left_limit - 0.5,
            f32::min,
        )
        .unwrap_or(current.x0);
        let best_x1 = nearest_edge(
            with_distance(above_right, |b: &BoundingBox| b.x1),
            with_distance(below_right, |b: &BoundingBox| b.x1),
            |x1| x1 < right_limit + 0.5,
            f32::max,
        )
        .unwrap_or(current.x1);
        (best_x0, best_x1)
    }

    /// Stack approved columns sharing left and right edges into single columns.
    ///
    /// Columns that end up in no stack move to the remaining pool.
    fn merge_same_expanded_width_columns(&mut self) {
        let min_width = min_acceptable_col_width(self.content_width);
        let mut used: FxHashSet<usize> = FxHashSet::default();
        let mut result: Vec<usize> = Vec::new();

        let mut ordered = self.approved.clone();
        let cols = &self.cols;
        insertion_sort_by(&mut ordered, |&a, &b| cols[a].bbox.width() < cols[b].bbox.width());

        for &col in &ordered {
            if used.contains(&col) || self.cols[col].is_horizontal_ruler() {
                continue;
            }
            if self.cols[col].bbox.width() <= min_width {
                continue;
            }

            let mut same: Vec<usize> = ordered
                .iter()
                .copied()
                .filter(|&id| !used.contains(&id) && self.same_expanded_edges(id, col))
                .collect();
            let cols = &self.cols;
            insertion_sort_by(&mut same, |&a, &b| cols[a].bbox.y0 < cols[b].bbox.y0);
            let same_set: FxHashSet<usize> = same.iter().copied().collect();

            self.cols.push(self.cols[same[0]].clone());
            let mut segment = self.cols.len() - 1;
            let mut to_be_used = vec![same[0]];

            for &item in &same[1..] {
                let mut stop = false;
                if !self.ignore_vertical_space {
                    let threshold = margin_threshold(Direction::Vertical, &self.cols[segment], &self.cols[item]);
                    if self.cols[segment].bbox.vert_overlap(&self.cols[item].bbox) < threshold {
                        stop = true;
                    }
                }

                let mut interferences = Vec::new();
                if !stop {
                    let seg = &self.cols[segment];
                    let mut spacer = seg.bbox.vert_spacer(&self.cols[item].bbox);
                    spacer.x0 = seg.bbox.x0;
                    spacer.x1 = seg.bbox.x1;
                    interferences = ordered
                        .iter()
                        .copied()
                        .filter(|id| !same_set.contains(id) && self.cols[*id].bbox.touches(&spacer))
                        .collect();
                    stop = interferences.iter().any(|&id| {
                        let inter = &self.cols[id];
                        if seg.bbox.width() < 0.76 * self.content_width {
                            let left = inter.bbox.x0 + inter.space_to_left;
                            let right = inter.bbox.x1 - inter.space_to_right;
                            (left < spacer.x0 - 2.0 && right > spacer.x0 - 2.0)
                                || (left < spacer.x1 - 2.0 && right > spacer.x1 - 2.0)
                        } else {
                            inter.content_width() > min_width
                        }
                    });
                }

                if stop {
                    self.store_segment(segment, &to_be_used, &mut result, &mut used);
                    segment = item;
                    to_be_used = vec![item];
                } else {
                    let (x0, x1) = (self.cols[segment].bbox.x0, self.cols[segment].bbox.x1);
                    self.cols[item].bbox.x0 = x0;
                    self.cols[item].bbox.x1 = x1;
                    self.merge_pair(segment, item, false);
                    to_be_used.push(item);
                    to_be_used.extend(interferences);
                }
            }
            self.store_segment(segment, &to_be_used, &mut result, &mut used);
        }

        let mut remaining: Vec<usize> = ordered.into_iter().filter(|id| !used.contains(id)).collect();
        result = self.drop_contained(&result, &result);
        remaining = self.drop_contained(&remaining, &result);
        self.approved = result;
        self.remaining = remaining;
    }

    /// Left and right edges agree within 2 units, with or without expansion slack.
    fn same_expanded_edges(&self, candidate: usize, reference: usize) -> bool {
        let (c, r) = (&self.cols[candidate], &self.cols[reference]);
        let left = (c.bbox.x0 - r.bbox.x0).abs() < 2.0
            || (c.bbox.x0 - r.bbox.x0 + r.space_to_left).abs() < 2.0
            || (c.bbox.x0 + c.space_to_left - r.bbox.x0).abs() < 2.0
            || (c.bbox.x0 + c.space_to_left - r.bbox.x0 + r.space_to_left).abs() < 2.0;
        let right = (c.bbox.x1 - r.bbox.x1).abs() < 2.0
            || (c.bbox.x1 - r.bbox.x1 - r.space_to_right).abs() < 2.0
            || (c.bbox.x1 - c.space_to_right - r.bbox.x1).abs() < 2.0
            || (c.bbox.x1 - c.space_to_right - r.bbox.x1 - r.space_to_right).abs() < 2.0;
        left && right
    }

    fn store_segment(&self, segment: usize, members: &[usize], result: &mut Vec<usize>, used: &mut FxHashSet<usize>) {
        let seg = &self.cols[segment];
        if seg.content_width() <= min_acceptable_col_width(self.content_width) || seg.is_horizontal_ruler() {
            return;
        }
        result.push(segment);
        for &member in members {
            if !self.cols[member].is_horizontal_ruler() {
                used.insert(member);
            }
        }
    }

    /// Keep the columns of `source` not contained in another column of `comparing`.
    fn drop_contained(&self, source: &[usize], comparing: &[usize]) -> Vec<usize> {
        source
            .iter()
            .copied()
            .filter(|&col| {
                !comparing
                    .iter()
                    .any(|&other| other != col && self.cols[other].bbox.contains(&self.cols[col].bbox, -1.0))
            })
            .collect()
    }

    /// Would the union of the two columns touch any other column?
    fn has_collision(&self, to_be_merged: usize, candidate: usize, tight: bool) -> bool {
        let (t, c) = (&self.cols[to_be_merged], &self.cols[candidate]);
        let merged = BoundingBox::new(
            c.bbox.x0.min(t.bbox.x0 + if tight { t.space_to_left } else { 0.0 }),
            c.bbox.y0.min(t.bbox.y0),
            c.bbox.x1.max(t.bbox.x1 - if tight { t.space_to_right } else { 0.0 }),
            c.bbox.y1.max(t.bbox.y1),
        );
        self.approved
            .iter()
            .chain(&self.remaining)
            .filter(|&&id| id != candidate && id != to_be_merged)
            .any(|&id| merged.touches(&self.cols[id].bbox))
    }

    /// Approved columns spanning `col` along `direction`, nearest on each side.
    fn nearest_supports(&self, col: usize, direction: Direction) -> (Option<usize>, Option<usize>) {
        let c = &self.cols[col].bbox;
        let mut before: Option<usize> = None;
        let mut after: Option<usize> = None;
        for &support in &self.approved {
            if support == col {
                continue;
            }
            let s = &self.cols[support].bbox;
            let (spans, is_before, closeness): (bool, bool, fn(&BoundingBox, &BoundingBox) -> f32) =
                if direction == Direction::Horizontal {
                    (
                        c.x0 - DEFAULT_HORIZONTAL_MARGIN - 1.0 > s.x0 && c.x1 + DEFAULT_HORIZONTAL_MARGIN + 1.0 < s.x1,
                        c.y0 > s.y1,
                        BoundingBox::vert_overlap,
                    )
                } else {
                    (
                        c.y0 - DEFAULT_VERTICAL_MARGIN - 1.0 > s.y0 && c.y1 + DEFAULT_VERTICAL_MARGIN + 1.0 < s.y1,
                        c.x0 > s.x1,
                        BoundingBox::horz_overlap,
                    )
                };
            if !spans {
                continue;
            }
            let slot = if is_before { &mut before } else { &mut after };
            if slot.map_or(true, |current| closeness(c, s) > closeness(c, &self.cols[current].bbox)) {
                *slot = Some(support);
            }
        }
        (before, after)
    }

    /// Fold small columns into an adjacent neighbour that shares their supports.
    fn merge_adjacent<F>(&mut self, targets: Pool, candidates: Pool, direction: Direction, accept: F) -> bool
    where
        F: Fn(&Column) -> bool,
    {
        let small_limit = self.content_width - min_acceptable_col_width(self.content_width);
        let along = |a: &BoundingBox, b: &BoundingBox| {
            if direction == Direction::Horizontal {
                a.horz_overlap(b)
            } else {
                a.vert_overlap(b)
            }
        };

        let mut any_change = false;
        for _ in 0..MAX_MERGE_TRIES {
            let mut changed = false;
            let mut used: FxHashSet<usize> = FxHashSet::default();
            let to_merge = self.pool(targets).clone();
            let mergeable = self.pool(candidates).clone();

            for &col in &to_merge {
                if used.contains(&col) || !accept(&self.cols[col]) {
                    continue;
                }
                let mut before: Option<usize> = None;
                let mut after: Option<usize> = None;
                let mut tight = false;

                for &candidate in &mergeable {
                    if candidate == col || used.contains(&candidate) {
                        continue;
                    }
                    let (c, m) = (&self.cols[col].bbox, &self.cols[candidate].bbox);
                    let perpendicular = if direction == Direction::Horizontal {
                        c.vert_overlap(m)
                    } else {
                        c.horz_overlap(m)
                    };
                    if perpendicular <= MIN_ITEM_SIZE {
                        continue;
                    }
                    if self.has_collision(col, candidate, false) {
                        if direction == Direction::Horizontal || self.has_collision(col, candidate, true) {
                            continue;
                        }
                        tight = true;
                    }

                    // Side-by-side candidates: the last one seen wins. Stacked
                    // candidates: the closest one wins.
                    if direction == Direction::Horizontal {
                        if m.x1 < c.x0 {
                            before = Some(candidate);
                        }
                        if m.x0 > c.x1 {
                            after = Some(candidate);
                        }
                    } else {
                        if m.y1 < c.y0 && before.map_or(true, |b| c.vert_overlap(m) > c.vert_overlap(&self.cols[b].bbox)) {
                            before = Some(candidate);
                        }
                        if m.y0 > c.y1 && after.map_or(true, |a| c.vert_overlap(m) > c.vert_overlap(&self.cols[a].bbox)) {
                            after = Some(candidate);
                        }
                    }
                }

                if before.is_none() && after.is_none() {
                    continue;
                }

                let own_supports = self.nearest_supports(col, direction);
                let agrees = |neighbour: usize, supports: (Option<usize>, Option<usize>)| {
                    let (own_before, own_after) = own_supports;
                    (own_before.is_some() && supports.0 == own_before)
                        || (own_after.is_some() && supports.1 == own_after)
                        || self.cols[neighbour].bbox.width() + self.cols[col].bbox.width() > small_limit
                        || (own_before.is_none() && own_after.is_none() && supports.0.is_none() && supports.1.is_none())
                };

                let col_box = self.cols[col].bbox;
                let mut accepted = None;
                if let Some(b) = before {
                    if agrees(b, self.nearest_supports(b, direction))
                        && after.map_or(true, |a| {
                            along(&self.cols[a].bbox, &col_box) < along(&self.cols[b].bbox, &col_box)
                        })
                    {
                        accepted = Some(b);
                    }
                }
                if accepted.is_none() {
                    if let Some(a) = after {
                        if agrees(a, self.nearest_supports(a, direction)) {
                            accepted = Some(a);
                        }
                    }
                }

                if let Some(target) = accepted {
                    trace!("Absorbed small column {col} into {target} ({direction:?})");
                    self.merge_pair(target, col, tight);
                    used.insert(col);
                    changed = true;
                }
            }

            self.pool_mut(targets).retain(|id| !used.contains(id));
            any_change |= changed;
            if !changed {
                break;
            }
        }
        any_change
    }
}

/// Choose the edge to expand to from the nearest neighbours above and below.
///
/// Each neighbour is `(edge, vertical overlap with the column)`; an edge is
/// only usable when `fits` accepts it. When both are usable and equally
/// close (relative to the default vertical margin) `combine` picks one.
fn nearest_edge(
    above: Option<(f32, f32)>,
    below: Option<(f32, f32)>,
    fits: impl Fn(f32) -> bool,
    combine: fn(f32, f32) -> f32,
) -> Option<f32> {
    match (above, below) {
        (None, None) => None,
        (Some((edge, _)), None) | (None, Some((edge, _))) => fits(edge).then_some(edge),
        (Some((above_edge, above_gap)), Some((below_edge, below_gap))) => {
            match (fits(above_edge), fits(below_edge)) {
                (true, true) => {
                    let above_close = above_gap >= DEFAULT_VERTICAL_MARGIN;
                    let below_close = below_gap >= DEFAULT_VERTICAL_MARGIN;
                    Some(if above_close == below_close {
                        combine(below_edge, above_edge)
                    } else if above_close {
                        above_edge
                    } else {
                        below_edge
                    })
                }
                (true, false) => Some(above_edge),
                (false, true) => Some(below_edge),
                (false, false) => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::column::ImageEdges;
    use super::*;

    fn column(x0: f32, y0: f32, x1: f32, y1: f32) -> Column {
        Column::new(BoundingBox::new(x0, y0, x1, y1), ImageEdges::default())
    }

    fn page() -> (PageSize, PageMargins) {
        (
            PageSize::new(600.0, 800.0),
            PageMargins {
                left: 50.0,
                top: 50.0,
                right: 50.0,
                bottom: 50.0,
            },
        )
    }

    #[test]
    fn test_stacked_paragraphs_become_one_column() {
        let (size, margins) = page();
        let cols = vec![
            column(50.0, 50.0, 550.0, 100.0),
            column(50.0, 104.0, 550.0, 160.0),
            column(50.0, 164.0, 540.0, 220.0),
        ];
        let merged = merge_cols(cols, size, &margins, 500.0, true);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].bbox.y0, 50.0);
        assert_eq!(merged[0].bbox.y1, 220.0);
    }

    #[test]
    fn test_two_columns_stay_apart() {
        let (size, margins) = page();
        let cols = vec![
            column(50.0, 50.0, 280.0, 200.0),
            column(320.0, 50.0, 550.0, 200.0),
            column(50.0, 204.0, 280.0, 400.0),
            column(320.0, 204.0, 550.0, 400.0),
        ];
        let merged = merge_cols(cols, size, &margins, 500.0, true);
        assert_eq!(merged.len(), 2);
        for col in &merged {
            assert!(col.bbox.width() < 260.0);
            assert!(col.bbox.y1 - col.bbox.y0 > 300.0);
        }
    }

    #[test]
    fn test_nearest_edge_prefers_close_neighbour() {
        let fits = |_: f32| true;
        assert_eq!(nearest_edge(Some((10.0, -2.0)), Some((5.0, -50.0)), fits, f32::min), Some(10.0));
        assert_eq!(nearest_edge(Some((10.0, -2.0)), Some((5.0, -3.0)), fits, f32::min), Some(5.0));
        assert_eq!(nearest_edge(None, None, fits, f32::min), None);
    }

    #[test]
    fn test_margin_threshold_depends_on_images() {
        let text = column(0.0, 0.0, 100.0, 50.0);
        let image = Column::new(
            BoundingBox::new(0.0, 60.0, 100.0, 120.0),
            ImageEdges {
                top: 60.0,
                ..ImageEdges::default()
            },
        );
        assert_eq!(margin_threshold(Direction::Vertical, &text, &image), 0.0);
        assert_eq!(margin_threshold(Direction::Horizontal, &text, &image), DEFAULT_HORIZONTAL_MARGIN);
        let below = column(0.0, 60.0, 100.0, 120.0);
        assert_eq!(margin_threshold(Direction::Vertical, &text, &below), DEFAULT_VERTICAL_MARGIN);
    }
}
