//! Layout Scenarios
//!
//! End-to-end behaviour of the analyzer and of the segmenters on synthetic
//! pages: list identification, sentence splitting, column detection and
//! sentences running across pages.

mod common;

use common::{init_logging, text_block, text_line, PageBuilder, SyntheticDocument};
use docling_page_layout::config::MAX_CACHED_PAGES;
use docling_page_layout::layout::RegionNode;
use docling_page_layout::lists::{identify_line_list_type, ListSubType};
use docling_page_layout::sentences::split_paragraph_sentences;
use docling_page_layout::{
    Block, Checkpoint, ContinuationState, FontId, FontMetrics, LayoutAnalyzer, LayoutConfig, LayoutObserver,
    LineSegment, ListType, ParState, ProcessedPage, Sentence,
};
use rstest::rstest;
use std::cell::RefCell;
use std::rc::Rc;

// ============================================================================
// List identification
// ============================================================================

#[rstest]
#[case("1. First item", ListType::Numbered, ListSubType::Numerals, Some((0, 2)))]
#[case("2. Second item", ListType::Numbered, ListSubType::Numerals, Some((0, 2)))]
#[case("iv. Fourth item", ListType::Numbered, ListSubType::RomanNumerals, Some((0, 3)))]
#[case("[7] Reference", ListType::Numbered, ListSubType::Brackets, Some((0, 3)))]
#[case("\u{2022} Bullet point", ListType::Bulleted, ListSubType::None, Some((0, 1)))]
#[case("Plain words here", ListType::None, ListSubType::None, None)]
fn test_list_identifiers(
    #[case] text: &str,
    #[case] list_type: ListType,
    #[case] sub_type: ListSubType,
    #[case] identifier: Option<(usize, usize)>,
) {
    let detection = identify_line_list_type(&text_line(text, 50.0, 100.0));
    assert_eq!(detection.list_type, list_type);
    assert_eq!(detection.sub_type, sub_type);
    assert_eq!(detection.identifier, identifier);
}

// ============================================================================
// Sentence splitting
// ============================================================================

fn sentence_texts(lines: &[&str]) -> Vec<String> {
    let mut block = text_block(lines, 50.0, 100.0);
    let state = split_paragraph_sentences(&LayoutConfig::default(), &mut block, 0, &ParState::default());
    let page = ProcessedPage::new(vec![block], state);
    page.sentences().into_iter().map(|sentence| sentence.text).collect()
}

#[rstest]
#[case("It rained. We stayed in.", &["It rained.", "We stayed in."])]
#[case("Use tools, e.g. hammers and saws.", &["Use tools, e.g. hammers and saws."])]
#[case("See Fig. 3 for details.", &["See Fig. 3 for details."])]
#[case("Dr J. Smith came home.", &["Dr J. Smith came home."])]
#[case("He paused (for a while. then left) quietly.", &["He paused (for a while. then left) quietly."])]
#[case("Done! Next one? Yes.", &["Done!", "Next one?", "Yes."])]
fn test_sentence_boundaries(#[case] text: &str, #[case] expected: &[&str]) {
    assert_eq!(sentence_texts(&[text]), expected);
}

#[test]
fn test_abbreviation_at_line_end_does_not_break() {
    let lines = ["We need tools, e.g.", "Hammers and saws. Then stop."];
    assert_eq!(sentence_texts(&lines), ["We need tools, e.g. Hammers and saws.", "Then stop."]);
}

// ============================================================================
// Full pipeline
// ============================================================================

/// Checkpoints seen by the analyzer, with the number of items at each.
#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<(usize, Checkpoint, usize)>>>);

impl LayoutObserver for Recorder {
    fn on_lines(&mut self, page: usize, checkpoint: Checkpoint, lines: &[LineSegment]) {
        self.0.borrow_mut().push((page, checkpoint, lines.len()));
    }

    fn on_regions(&mut self, page: usize, checkpoint: Checkpoint, regions: &[RegionNode]) {
        self.0.borrow_mut().push((page, checkpoint, regions.len()));
    }

    fn on_blocks(&mut self, page: usize, checkpoint: Checkpoint, blocks: &[Block]) {
        self.0.borrow_mut().push((page, checkpoint, blocks.len()));
    }
}

#[test]
fn test_two_column_page() -> anyhow::Result<()> {
    init_logging();
    let column: Vec<String> = (0..20).map(|_| "a".repeat(46)).collect();
    let column: Vec<&str> = column.iter().map(String::as_str).collect();
    let page = PageBuilder::new()
        .paragraph(&column, 50.0, 100.0)
        .paragraph(&column, 320.0, 100.0)
        .margins(50.0, 100.0, 50.0, 100.0);

    let recorder = Recorder::default();
    let mut analyzer =
        LayoutAnalyzer::new(SyntheticDocument::new(vec![page]), LayoutConfig::default()).with_observer(recorder.clone());
    analyzer.page_content(0)?;

    let seen = recorder.0.borrow();
    let checkpoints: Vec<Checkpoint> = seen.iter().map(|&(_, checkpoint, _)| checkpoint).collect();
    assert_eq!(
        checkpoints,
        vec![
            Checkpoint::Stripes,
            Checkpoint::Lines,
            Checkpoint::Columns,
            Checkpoint::Blocks,
            Checkpoint::Marked,
            Checkpoint::Paragraphs,
        ]
    );
    let columns = seen.iter().find(|&&(_, checkpoint, _)| checkpoint == Checkpoint::Columns);
    assert_eq!(columns.map(|&(_, _, count)| count), Some(2));
    let lines = seen.iter().find(|&&(_, checkpoint, _)| checkpoint == Checkpoint::Lines);
    assert_eq!(lines.map(|&(_, _, count)| count), Some(40));
    Ok(())
}

#[test]
fn test_words_survive_the_pipeline() -> anyhow::Result<()> {
    init_logging();
    let text = [
        "The quick brown fox jumped over the dogs",
        "and cats. Then it ran into the big woods",
        "and was never seen again by anyone here!",
    ];
    let page = PageBuilder::new().paragraph(&text, 50.0, 100.0).margins(50.0, 100.0, 50.0, 100.0);
    let mut analyzer = LayoutAnalyzer::new(SyntheticDocument::new(vec![page]), LayoutConfig::default());
    let sentences = analyzer.page_content(0)?.sentences();

    let expected: Vec<&str> = text.iter().flat_map(|line| line.split_whitespace()).collect();
    let joined = sentences.iter().map(|sentence| sentence.text.as_str()).collect::<Vec<_>>().join(" ");
    let actual: Vec<&str> = joined.split_whitespace().collect();
    assert_eq!(actual, expected);
    let indices: Vec<(i16, i16)> = sentences.iter().map(|sentence| (sentence.paragraph, sentence.sentence)).collect();
    assert_eq!(indices, vec![(0, 0), (0, 1)]);
    Ok(())
}

/// Metrics agreeing with the synthetic glyph boxes (5 units at size 10).
struct MonospaceMetrics;

impl FontMetrics for MonospaceMetrics {
    fn glyph_box_advance(&self, _font: FontId, _code: char) -> Option<f32> {
        Some(500.0)
    }
}

#[test]
fn test_matching_font_metrics_keep_the_text() -> anyhow::Result<()> {
    let text = ["Metrics agree with the boxes here.", "So nothing moves at all."];
    let page = || PageBuilder::new().paragraph(&text, 50.0, 100.0).margins(50.0, 100.0, 50.0, 100.0);

    let mut plain = LayoutAnalyzer::new(SyntheticDocument::new(vec![page()]), LayoutConfig::default());
    let mut measured = LayoutAnalyzer::new(SyntheticDocument::new(vec![page()]), LayoutConfig::default())
        .with_font_metrics(MonospaceMetrics);
    assert_eq!(plain.page_content(0)?.sentences(), measured.page_content(0)?.sentences());
    Ok(())
}

/// Lines of equal width without sentence enders.
fn open_page() -> PageBuilder {
    let line = "text flows on text flows on text flows on";
    PageBuilder::new()
        .paragraph(&[line, line, line, line], 50.0, 100.0)
        .margins(50.0, 100.0, 50.0, 100.0)
}

fn closing_page() -> PageBuilder {
    let line = "text flows on text flows on text flows on";
    PageBuilder::new()
        .paragraph(&[line, line, line, "text flows on text flows on and it ended."], 50.0, 100.0)
        .margins(50.0, 100.0, 50.0, 100.0)
}

fn first_indices(page: &ProcessedPage) -> Option<(i16, i16, i16)> {
    page.sentences()
        .first()
        .map(|sentence| (sentence.page, sentence.paragraph, sentence.sentence))
}

#[test]
fn test_sentence_continues_on_next_page() -> anyhow::Result<()> {
    init_logging();
    let document = SyntheticDocument::new(vec![open_page(), closing_page()]);
    let mut analyzer = LayoutAnalyzer::new(document, LayoutConfig::default());

    let first = analyzer.page_content(0)?;
    assert_eq!(first.state.continuation, ContinuationState::Can);

    let second = analyzer.page_content(1)?;
    assert_eq!(first_indices(second), Some((0, 0, 0)));
    assert_eq!(second.state.continuation, ContinuationState::Cannot);
    Ok(())
}

#[test]
fn test_walk_refreshes_intermediate_pages() -> anyhow::Result<()> {
    init_logging();
    let document = SyntheticDocument::new(vec![open_page(), open_page(), closing_page()]);
    let mut analyzer = LayoutAnalyzer::new(document, LayoutConfig::default());

    let last = analyzer.page_content(2)?;
    assert_eq!(first_indices(last), Some((0, 0, 0)));

    let middle = analyzer.page_content(1)?;
    assert_eq!(first_indices(middle), Some((0, 0, 0)));
    Ok(())
}

#[test]
fn test_walk_longer_than_the_cache() -> anyhow::Result<()> {
    init_logging();
    let page_count = MAX_CACHED_PAGES + 5;
    let pages = (0..page_count).map(|_| open_page()).collect();
    let mut analyzer = LayoutAnalyzer::new(SyntheticDocument::new(pages), LayoutConfig::default());

    let last = analyzer.page_content(page_count - 1)?;
    assert_eq!(first_indices(last), Some((0, 0, 0)));
    assert_eq!(last.state.continuation, ContinuationState::Can);

    let first = analyzer.page_content(0)?;
    assert_eq!(first_indices(first), Some((0, 0, 0)));
    Ok(())
}

/// Closes the running sentence, then opens a paragraph of its own.
fn closing_and_opening_page() -> PageBuilder {
    let line = "text flows on text flows on text flows on";
    PageBuilder::new()
        .paragraph(&[line, line, "text flows on and the sentence ended."], 50.0, 100.0)
        .paragraph(&[line, line, line], 50.0, 200.0)
        .margins(50.0, 100.0, 50.0, 100.0)
}

fn all_sentences(analyzer: &mut LayoutAnalyzer<SyntheticDocument>, order: &[usize]) -> anyhow::Result<Vec<Vec<Sentence>>> {
    let mut by_page = vec![Vec::new(); order.len()];
    for &page in order {
        by_page[page] = analyzer.page_content(page)?.sentences();
    }
    Ok(by_page)
}

#[test]
fn test_access_order_does_not_change_numbering() -> anyhow::Result<()> {
    init_logging();
    let document = || {
        SyntheticDocument::new(vec![
            open_page(),
            closing_and_opening_page(),
            open_page(),
            closing_page(),
        ])
    };
    let mut sequential = LayoutAnalyzer::new(document(), LayoutConfig::default());
    let mut backward = LayoutAnalyzer::new(document(), LayoutConfig::default());

    let expected = all_sentences(&mut sequential, &[0, 1, 2, 3])?;
    assert_eq!(all_sentences(&mut backward, &[3, 2, 1, 0])?, expected);
    Ok(())
}

#[test]
fn test_out_of_range_page_is_an_error() {
    let mut analyzer = LayoutAnalyzer::new(SyntheticDocument::new(vec![open_page()]), LayoutConfig::default());
    assert!(analyzer.page_content(1).is_err());
}
