// Deterministic ordering of page items
//
// The layout heuristics compare geometry with tolerances, so their "less than"
// predicates are not strict weak orderings. `slice::sort_by` may panic on such
// comparators; these helpers never do and always yield the same permutation
// for the same input.

use crate::config::MIN_ITEM_SIZE;
use crate::geometry::Bounded;

/// Stable binary-insertion sort driven by a `less` predicate.
///
/// Each element is located by bisection among the already sorted prefix and
/// then moved past every element it is not less than.
pub fn insertion_sort_by<T, F>(items: &mut [T], mut less: F)
where
    F: FnMut(&T, &T) -> bool,
{
    for i in 1..items.len() {
        let (mut j, mut k) = (0usize, i);
        while j < k {
            let l = (j + k) / 2;
            if less(&items[i], &items[l]) {
                k = l;
            } else if j == l {
                if less(&items[i], &items[k]) {
                    k = l;
                } else {
                    j = k;
                }
            } else {
                j = l;
            }
        }
        while j < i && !less(&items[i], &items[j]) {
            j += 1;
        }
        if j != i {
            items[j..=i].rotate_right(1);
        }
    }
}

/// Order items the way a reader scans a page: rows top to bottom, then left to right.
///
/// Items whose vertical extents (padded by 2 units) overlap the first
/// unvisited item form one row. Within a row an item precedes another when it
/// ends above the other's center, or when it starts left of it by more than a
/// tenth of the other's height.
#[must_use]
pub fn naive_sort_by_reading_order<T: Bounded>(items: Vec<T>) -> Vec<T> {
    let mut sorted = items;
    insertion_sort_by(&mut sorted, |a, b| a.bbox().y0 < b.bbox().y0);

    let mut used = vec![false; sorted.len()];
    let mut order = Vec::with_capacity(sorted.len());

    for i in 0..sorted.len() {
        if used[i] {
            continue;
        }
        let mut row = vec![i];
        for j in (i + 1)..sorted.len() {
            if used[j] {
                continue;
            }
            let (a, b) = (sorted[i].bbox(), sorted[j].bbox());
            let y0 = (b.y0 - 2.0).max(a.y0 - 2.0);
            let y1 = (b.y1 + 2.0).min(a.y1 + 2.0);
            if y1 - y0 > MIN_ITEM_SIZE {
                row.push(j);
            }
        }
        insertion_sort_by(&mut row, |&a, &b| {
            let (item_a, item_b) = (&sorted[a], &sorted[b]);
            let (ba, bb) = (item_a.bbox(), item_b.bbox());
            if ba.y0 > bb.center_y() {
                false
            } else if ba.y1 < bb.center_y() {
                true
            } else {
                ba.x0 < bb.x0 - 0.1 * item_b.horz_jitter_threshold()
            }
        });
        for j in row {
            used[j] = true;
            order.push(j);
        }
    }

    let mut slots: Vec<Option<T>> = sorted.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    #[test]
    fn test_insertion_sort_matches_std_for_strict_order() {
        let mut values = vec![5, 3, 9, 1, 3, 7, 0, 2];
        let mut expected = values.clone();
        expected.sort_unstable();
        insertion_sort_by(&mut values, |a, b| a < b);
        assert_eq!(values, expected);
    }

    #[test]
    fn test_insertion_sort_is_stable() {
        let mut pairs = vec![(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')];
        insertion_sort_by(&mut pairs, |a, b| a.0 < b.0);
        assert_eq!(pairs, vec![(0, 'b'), (0, 'd'), (1, 'a'), (1, 'c')]);
    }

    #[test]
    fn test_insertion_sort_tolerates_inconsistent_predicate() {
        let mut values = vec![3.0_f32, 3.05, 2.98, 10.0, 1.0];
        insertion_sort_by(&mut values, |a, b| *a < *b - 0.1);
        assert_eq!(values.len(), 5);
        assert_eq!(values[0], 1.0);
        assert_eq!(values[4], 10.0);
    }

    #[test]
    fn test_reading_order_rows_then_columns() {
        let boxes = vec![
            BoundingBox::new(200.0, 100.0, 300.0, 110.0),
            BoundingBox::new(10.0, 130.0, 100.0, 140.0),
            BoundingBox::new(10.0, 101.0, 100.0, 111.0),
        ];
        let sorted = naive_sort_by_reading_order(boxes);
        assert_eq!(sorted[0].x0, 10.0);
        assert_eq!(sorted[0].y0, 101.0);
        assert_eq!(sorted[1].x0, 200.0);
        assert_eq!(sorted[2].y0, 130.0);
    }
}
