//! Property-Based Tests
//!
//! Invariants of the geometry, the column tree and the segmenters over
//! generated input:
//! - Box union is idempotent and covers both operands
//! - XY-cut leaves partition the lines and the tree boxes are unions
//! - Final regions contain their lines
//! - Paragraph splitting loses no line
//! - Sentence segments reproduce their lines and never cut inside brackets

mod common;

use common::{text_block, text_line, LINE_PITCH, PAGE};
use docling_page_layout::layout::{LayoutStorage, RegionNode};
use docling_page_layout::paragraphs::split_block_to_paragraphs;
use docling_page_layout::sentences::split_paragraph_sentences;
use docling_page_layout::{Bounded, BoundingBox, LayoutConfig, LineSegment, PageMargins, ParState};
use proptest::prelude::*;

fn bbox_strategy() -> impl Strategy<Value = BoundingBox> {
    (0.0f32..500.0, 0.0f32..700.0, 1.0f32..100.0, 1.0f32..100.0)
        .prop_map(|(x0, y0, w, h)| BoundingBox::new(x0, y0, x0 + w, y0 + h))
}

// ============================================================================
// Geometry Properties
// ============================================================================

/// Property: union with itself changes nothing, union covers both boxes
#[test]
fn proptest_union() {
    proptest!(|(a in bbox_strategy(), b in bbox_strategy())| {
        prop_assert_eq!(a.union(&a), a);
        let union = a.union(&b);
        prop_assert_eq!(union, b.union(&a));
        prop_assert!(union.contains(&a, -0.001));
        prop_assert!(union.contains(&b, -0.001));
    });
}

// ============================================================================
// Column Tree Properties
// ============================================================================

/// Lines on a grid of rows and two columns, a random subset of the cells.
fn grid_lines() -> impl Strategy<Value = Vec<LineSegment>> {
    prop::collection::vec((0usize..30, 0usize..2, 5usize..40), 1..40).prop_map(|cells| {
        let mut seen = std::collections::BTreeSet::new();
        cells
            .into_iter()
            .filter(|&(row, col, _)| seen.insert((row, col)))
            .map(|(row, col, len)| {
                let x0 = if col == 0 { 50.0 } else { 320.0 };
                text_line(&"a".repeat(len), x0, 100.0 + row as f32 * LINE_PITCH)
            })
            .collect()
    })
}

fn collect_leaf_lines(node: &RegionNode, out: &mut Vec<usize>) {
    if node.is_leaf() {
        out.extend_from_slice(&node.lines);
    }
    for child in &node.children {
        collect_leaf_lines(child, out);
    }
}

fn margins() -> PageMargins {
    PageMargins {
        left: 50.0,
        top: 100.0,
        right: 50.0,
        bottom: 100.0,
    }
}

/// Property: every line lands in exactly one XY-cut leaf
#[test]
fn proptest_cut_exhaustiveness() {
    proptest!(|(lines in grid_lines())| {
        let mut storage = LayoutStorage::new(&lines, true);
        storage.xy_cut_columns();
        let mut seen = Vec::new();
        collect_leaf_lines(storage.root(), &mut seen);
        seen.sort_unstable();
        let expected: Vec<usize> = (0..lines.len()).collect();
        prop_assert_eq!(seen, expected);
    });
}

/// Property: a leaf spans its lines, a parent spans its children
#[test]
fn proptest_tree_boxes_are_unions() {
    fn check(node: &RegionNode, lines: &[LineSegment]) -> bool {
        let mut expected = BoundingBox::empty();
        if node.is_leaf() {
            for &idx in &node.lines {
                expected.union_with(lines[idx].bbox());
            }
        } else {
            for child in &node.children {
                expected.union_with(&child.bbox);
            }
        }
        expected == node.bbox && node.children.iter().all(|child| check(child, lines))
    }

    proptest!(|(lines in grid_lines())| {
        let mut storage = LayoutStorage::new(&lines, true);
        storage.xy_cut_columns();
        prop_assert!(check(storage.root(), &lines));
    });
}

/// Property: regions only hold lines lying within them
#[test]
fn proptest_region_containment() {
    proptest!(|(lines in grid_lines())| {
        let mut storage = LayoutStorage::new(&lines, true);
        storage.identify_main_columns(PAGE, &margins());
        for region in storage.children() {
            for &idx in &region.lines {
                let line = lines[idx].bbox();
                prop_assert!(line.x0 > region.bbox.x0 - 1.01);
                prop_assert!(line.x1 < region.bbox.x1 + 1.01);
                prop_assert!(line.y0 > region.bbox.y0 - 1.01);
                prop_assert!(line.y1 < region.bbox.y1 + 1.01);
            }
        }
    });
}

// ============================================================================
// Segmenter Properties
// ============================================================================

fn word() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z]{1,8}",
        1 => "[A-Z][a-z]{0,6}",
        1 => "[a-z]{1,6}[.!?;:,]",
        1 => "[(\\[{][a-z]{1,5}",
        1 => "[a-z]{1,5}[)\\]}]",
        1 => "[0-9]{1,3}\\.",
    ]
}

fn text_lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::collection::vec(word(), 1..8).prop_map(|words| words.join(" ")), 1..8)
}

/// Property: paragraphs hold every line of the block, in order
#[test]
fn proptest_paragraph_flush_completeness() {
    proptest!(|(texts in text_lines(), indents in prop::collection::vec(0u8..3, 8))| {
        let mut block = text_block(&[], 50.0, 100.0);
        for (row, text) in texts.iter().enumerate() {
            let x0 = 50.0 + f32::from(indents[row]) * 10.0;
            block.append_line_segment(text_line(text, x0, 100.0 + row as f32 * LINE_PITCH), false);
        }
        let lines: Vec<String> = block.lines().iter().map(LineSegment::content_string).collect();
        let paragraphs = split_block_to_paragraphs(&mut block);
        let flushed: Vec<String> = paragraphs
            .iter()
            .flat_map(|paragraph| paragraph.lines().iter().map(LineSegment::content_string))
            .collect();
        prop_assert_eq!(flushed, lines);
    });
}

/// Property: sentence segments concatenate back to the paragraph lines
#[test]
fn proptest_sentence_round_trip() {
    proptest!(|(texts in text_lines())| {
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
        let mut block = text_block(&texts, 50.0, 100.0);
        let joined_lines: String = texts.concat();
        split_paragraph_sentences(&LayoutConfig::default(), &mut block, 0, &ParState::default());
        let joined_segments: String = block.lines().iter().map(LineSegment::content_string).collect();
        prop_assert_eq!(joined_segments, joined_lines);
    });
}

/// Property: no sentence ends while a bracket is open
#[test]
fn proptest_bracket_balance() {
    proptest!(|(texts in text_lines())| {
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
        let mut block = text_block(&texts, 50.0, 100.0);
        split_paragraph_sentences(&LayoutConfig::default(), &mut block, 0, &ParState::default());

        let mut open: Vec<char> = Vec::new();
        let segments = block.lines();
        for (idx, segment) in segments.iter().enumerate() {
            for code in segment.content_string().chars() {
                match code {
                    '(' | '[' | '{' => open.push(code),
                    ')' | ']' | '}' => {
                        let opener = match code {
                            ')' => '(',
                            ']' => '[',
                            _ => '{',
                        };
                        if open.last() == Some(&opener) {
                            open.pop();
                        }
                    }
                    _ => {}
                }
            }
            if let Some(next) = segments.get(idx + 1) {
                if next.snt_index() != segment.snt_index() {
                    prop_assert!(open.is_empty(), "sentence {} ends inside {:?}", segment.snt_index(), open);
                }
            }
        }
    });
}
