// Page assembly
//
// Turns the marked blocks of a page into its final content: main text
// paragraphs with enumerated sentences, then the remaining main blocks, then
// paragraphs of the side channels. The outgoing ParState travels with the page.

use crate::assembler::merge_overlapping_lines;
use crate::block::{Block, ContentType, Location};
use crate::config::LayoutConfig;
use crate::fonts::FontMetrics;
use crate::lists::process_bullets_and_numbering;
use crate::paragraphs::split_block_to_paragraphs;
use crate::sentences::{split_paragraph_sentences, ParState};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Final content of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedPage {
    /// Main text paragraphs, other main blocks, then side-channel paragraphs
    pub blocks: Vec<Block>,
    /// State handed to the next page
    pub state: ParState,
    /// Main text paragraphs before sentence splitting, in page order
    #[serde(skip)]
    pub(crate) main_paragraphs: Vec<Block>,
}

/// One sentence of main text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub page: i16,
    pub paragraph: i16,
    pub sentence: i16,
    pub text: String,
}

impl ProcessedPage {
    #[must_use]
    pub fn new(blocks: Vec<Block>, state: ParState) -> Self {
        Self {
            blocks,
            state,
            main_paragraphs: Vec::new(),
        }
    }

    /// Sentences of the main text paragraphs, in page order.
    ///
    /// Consecutive segments sharing their (page, paragraph, sentence) indices
    /// are joined with a space. A paragraph continuing the previous page keeps
    /// that page's indices.
    #[must_use]
    pub fn sentences(&self) -> Vec<Sentence> {
        let mut sentences: Vec<Sentence> = Vec::new();
        let segments = self
            .blocks
            .iter()
            .filter(|block| block.is_main_text_block())
            .flat_map(Block::lines);
        for segment in segments {
            let text = segment.content_string();
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            let key = (segment.page_index(), segment.par_index(), segment.snt_index());
            match sentences.last_mut() {
                Some(last) if (last.page, last.paragraph, last.sentence) == key => {
                    last.text.push(' ');
                    last.text.push_str(text);
                }
                _ => sentences.push(Sentence {
                    page: key.0,
                    paragraph: key.1,
                    sentence: key.2,
                    text: text.to_string(),
                }),
            }
        }
        sentences
    }

    /// Blocks kept by the discard toggles of `config`.
    #[must_use]
    pub fn visible_blocks(&self, config: &LayoutConfig) -> Vec<&Block> {
        self.blocks.iter().filter(|block| is_visible(config, block)).collect()
    }
}

fn is_visible(config: &LayoutConfig, block: &Block) -> bool {
    let hidden_location = match block.location {
        Location::Header => config.discard_headers,
        Location::Footer => config.discard_footers,
        Location::SidebarLeft | Location::SidebarRight => config.discard_sidebars,
        Location::Footnote => config.discard_footnotes,
        Location::Watermark => config.remove_watermarks,
        Location::None | Location::Main => false,
    };
    let hidden_content = match block.content_type {
        ContentType::Table | ContentType::TableCaption => config.discard_tables_and_captions,
        ContentType::Image | ContentType::ImageCaption | ContentType::ImageText => config.discard_images_and_captions,
        ContentType::None | ContentType::List | ContentType::Text => false,
    };
    !hidden_location && !hidden_content
}

/// Merge line fragments, mark list items and split into paragraphs.
fn prepare_paragraphs(config: &LayoutConfig, metrics: &dyn FontMetrics, block: &mut Block) -> Vec<Block> {
    let lines = merge_overlapping_lines(block.take_lines(), metrics, config);
    block.replace_lines(lines);
    process_bullets_and_numbering(config, block);
    split_block_to_paragraphs(block)
}

/// Build the final content of page `page_index` from its marked blocks.
///
/// Main text paragraphs are enumerated in order, the first one continuing
/// `prev` when it can. The outgoing state remembers the last main block of
/// the page. Side-channel paragraphs are enumerated on their own, each from a
/// fresh state.
#[must_use]
pub fn extract_and_enumerate_sentences(
    config: &LayoutConfig,
    page_index: i16,
    blocks: Vec<Block>,
    metrics: &dyn FontMetrics,
    prev: &ParState,
) -> ProcessedPage {
    let mut content: Vec<Block> = Vec::new();
    let mut prepared: Vec<Block> = Vec::with_capacity(blocks.len());
    for mut block in blocks {
        if block.is_main_text_block() {
            content.extend(prepare_paragraphs(config, metrics, &mut block));
        }
        prepared.push(block);
    }

    let main_paragraphs = content.clone();
    let mut state = prev.clone();
    for paragraph in &mut content {
        state = split_paragraph_sentences(config, paragraph, page_index, &state);
    }
    let text_paragraphs = content.len();

    let mut side_blocks = Vec::new();
    for block in prepared {
        if block.location != Location::Main {
            side_blocks.push(block);
            continue;
        }
        if !block.is_main_text_block() {
            content.push(block.clone());
        }
        state.last_page_main_block = Some(block);
    }

    for mut block in side_blocks {
        for mut paragraph in prepare_paragraphs(config, metrics, &mut block) {
            split_paragraph_sentences(config, &mut paragraph, page_index, &ParState::default());
            content.push(paragraph);
        }
    }

    debug!(
        "page {}: {} text paragraphs, {} blocks in total, continuation {:?}",
        page_index,
        text_paragraphs,
        content.len(),
        state.continuation
    );
    ProcessedPage {
        blocks: content,
        state,
        main_paragraphs,
    }
}

/// Re-enumerate the main text of a processed page against a new incoming
/// state.
///
/// The first paragraph is split again from `prev`, and every following main
/// text paragraph after it, so indices and the outgoing state come out as if
/// the page had been processed from `prev`. The last main block is kept.
pub fn update_first_paragraph(config: &LayoutConfig, page: &mut ProcessedPage, page_index: i16, prev: &ParState) {
    if page.main_paragraphs.is_empty() {
        return;
    }
    debug_assert!(page.blocks.len() >= page.main_paragraphs.len());

    let mut state = prev.clone();
    for (slot, paragraph) in page.main_paragraphs.iter().enumerate() {
        let mut paragraph = paragraph.clone();
        state = split_paragraph_sentences(config, &mut paragraph, page_index, &state);
        page.blocks[slot] = paragraph;
    }
    trace!(
        "page {page_index}: {} paragraphs re-split, continuation {:?}",
        page.main_paragraphs.len(),
        state.continuation
    );
    let last_page_main_block = page.state.last_page_main_block.take();
    page.state = ParState {
        last_page_main_block,
        ..state
    };
}
