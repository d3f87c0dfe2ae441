// Sentence segmentation
//
// Paragraph lines are cut into sentence segments. Every segment is tagged with
// the (page, paragraph, sentence) it belongs to; a paragraph that continues the
// previous page's last paragraph keeps that paragraph's indices.

use crate::block::Block;
use crate::config::LayoutConfig;
use crate::line::{LineSegment, ListType};
use crate::paragraphs::can_continue_prev_block;
use crate::primitive::{is_alphanumeric, is_decimal_digit, is_dot, is_lowercase_alpha, is_uppercase_alpha, Primitive};
use log::trace;
use serde::{Deserialize, Serialize};

/// Abbreviations whose trailing dot never ends a sentence.
const STRONG_ABBREVIATIONS: &[&str] = &[
    "Vol", "No", "pp", "ie", "i.e", "eg", "e.g", "ex", "fig", "Fig", "eq", "Eq", "eqn", "Eqn", "tbl", "Tbl", "Ref",
    "adj", "ltd", "Ltd", "Dept", "approx", "Approx", "Corp", "corp", "Figs", "vol", "etc",
];

/// Abbreviations whose trailing dot ends a sentence only before a capitalized word.
const WEAK_ABBREVIATIONS: &[&str] = &["Int", "et al"];

const SENTENCE_ENDERS: &[char] = &[
    '!', '?', ';', ':', '\u{FF01}', '\u{037E}', '\u{203C}', '\u{203D}', '\u{2047}', '\u{2048}', '\u{2049}', '\u{204F}',
    '\u{FE15}', '\u{FE16}', '\u{FE54}', '\u{FE56}', '\u{FE57}', '\u{FF1B}', '\u{FF1F}',
];

const BRACKETS: [(char, char); 3] = [('(', ')'), ('[', ']'), ('{', '}')];

/// Whether the next paragraph may continue the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContinuationState {
    /// The last paragraph ended with a weak abbreviation
    WeakAbbr,
    /// The last paragraph ended mid-sentence
    Can,
    #[default]
    Cannot,
}

/// State threaded from paragraph to paragraph and from page to page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParState {
    /// Brackets opened and not yet closed
    pub open_tags: Vec<char>,
    /// Last text paragraph seen
    pub text_block: Option<Block>,
    pub continuation: ContinuationState,
    /// Last main block of the page
    pub last_page_main_block: Option<Block>,
}

fn is_space_item(item: &Primitive) -> bool {
    item.glyph_data().is_some_and(|glyph| glyph.is_space())
}

fn is_sentence_ender(code: char) -> bool {
    is_dot(code) || SENTENCE_ENDERS.contains(&code)
}

/// A sentence may break before `items[index]`.
fn can_break_at(items: &[Primitive], index: usize) -> bool {
    let item = &items[index];
    is_space_item(item) || !item.is_char() || item.is_virtual_char()
}

/// `items[start..end]` ends with `word`, and `word` starts a word.
fn ends_with_word(items: &[Primitive], start: usize, end: usize, word: &str) -> bool {
    let len = word.chars().count();
    if end < start + len {
        return false;
    }
    let from = end - len;
    items[from..end].iter().zip(word.chars()).all(|(item, code)| item.code() == Some(code))
        && (from == 0 || !items[from - 1].code().is_some_and(is_alphanumeric))
}

/// A space followed by one character accepted by `accept` ends at `end`.
fn ends_with_lone_char(items: &[Primitive], end: usize, accept: impl Fn(char) -> bool) -> bool {
    end >= 2 && is_space_item(&items[end - 2]) && items[end - 1].code().is_some_and(accept)
}

fn ends_with_strong_abbreviation(items: &[Primitive], start: usize, end: usize) -> bool {
    STRONG_ABBREVIATIONS.iter().any(|abbr| ends_with_word(items, start, end, abbr))
        || ends_with_lone_char(items, end, char::is_alphabetic)
}

fn ends_with_weak_abbreviation(items: &[Primitive], start: usize, end: usize) -> bool {
    WEAK_ABBREVIATIONS.iter().any(|abbr| ends_with_word(items, start, end, abbr))
        || ends_with_lone_char(items, end, is_decimal_digit)
}

/// After a weak abbreviation, a sentence ends when the line ends or a
/// capitalized word starts at `position`.
fn weak_abbr_ends_sentence(items: &[Primitive], position: usize) -> bool {
    items.len() <= position + 1
        || (items[position].code().is_some_and(is_uppercase_alpha)
            && items[position + 1].code().is_some_and(is_lowercase_alpha))
}

/// Cuts the lines of one paragraph into sentence segments.
struct SentenceSplitter<'a> {
    config: &'a LayoutConfig,
    page_index: i16,
    par_index: i16,
    snt_index: i16,
    open_tags: Vec<char>,
    ended_with_weak_abbr: bool,
    line_ended_with_ender: bool,
    segments: Vec<LineSegment>,
}

impl SentenceSplitter<'_> {
    fn store(&mut self, line: &LineSegment, start: usize, end: usize) {
        let mut segment = LineSegment::from_items(line.items()[start..end].iter().copied());
        segment.set_line_specs(self.page_index, self.par_index, self.snt_index);
        if start == 0 && line.list_type() != ListType::None {
            segment.set_bullet_and_numbering_info(self.config, line.text_left(), line.list_type(), None);
        }
        self.segments.push(segment);
    }

    /// A leading number such as `2.1.` opening the paragraph.
    fn is_numbering(&self, items: &[Primitive], start: usize, end: usize) -> bool {
        start == 0
            && self.segments.is_empty()
            && items[start..end]
                .iter()
                .all(|item| item.code().is_some_and(|code| is_dot(code) || is_decimal_digit(code)))
    }

    /// Does the dot at `index` end a sentence? Sets `ended_with_weak_abbr` when
    /// a weak abbreviation closes the line.
    fn dot_breaks(&mut self, items: &[Primitive], start: usize, index: usize) -> bool {
        let len = items.len();
        if ends_with_strong_abbreviation(items, start, index) {
            return false;
        }
        if ends_with_weak_abbreviation(items, start, index) {
            self.ended_with_weak_abbr = index + 3 >= len;
            return !self.ended_with_weak_abbr && can_break_at(items, index + 1) && weak_abbr_ends_sentence(items, index + 2);
        }
        (index + 1 == len || can_break_at(items, index + 1)) && !self.is_numbering(items, start, index + 1)
    }

    fn split_line(&mut self, line: &LineSegment) {
        let items = line.items();
        let len = items.len();
        if self.ended_with_weak_abbr && self.open_tags.is_empty() && weak_abbr_ends_sentence(items, 0) {
            self.snt_index += 1;
        }
        self.ended_with_weak_abbr = false;
        self.line_ended_with_ender = false;

        // Once a weak abbreviation closes the line, nothing breaks but
        // brackets are still tracked.
        let mut start = 0;
        for index in 0..len {
            let code = items[index].code();
            let must_break = match code {
                Some(code) if !self.ended_with_weak_abbr && self.open_tags.is_empty() && is_sentence_ender(code) => {
                    if is_dot(code) {
                        self.dot_breaks(items, start, index)
                    } else {
                        index + 1 == len || can_break_at(items, index + 1)
                    }
                }
                _ => false,
            };

            if must_break {
                self.store(line, start, index + 1);
                start = index + 1;
                self.snt_index += 1;
            } else if let Some(code) = code {
                if let Some(&(open, _)) = BRACKETS.iter().find(|(open, _)| *open == code) {
                    self.open_tags.push(open);
                } else if let Some(&(open, _)) = BRACKETS.iter().find(|(_, close)| *close == code) {
                    if self.open_tags.last() == Some(&open) {
                        self.open_tags.pop();
                    }
                }
            }
        }

        if start < len {
            self.store(line, start, len);
        }
        self.line_ended_with_ender = start == len || self.ended_with_weak_abbr;
    }
}

/// Replace the lines of `paragraph` by its sentence segments.
///
/// The paragraph continues the previous text paragraph when `prev` allows it
/// and the two paragraphs look alike; it then shares its paragraph index and
/// open sentence. Otherwise it takes the next paragraph index on the same page,
/// or index 0 on a new page. Non-text paragraphs are left untouched and cut
/// the continuation.
pub fn split_paragraph_sentences(
    config: &LayoutConfig,
    paragraph: &mut Block,
    page_index: i16,
    prev: &ParState,
) -> ParState {
    let mut state = prev.clone();
    if paragraph.is_non_text() {
        state.continuation = ContinuationState::Cannot;
        return state;
    }

    let last_segment = prev.text_block.as_ref().and_then(|block| block.lines().last());
    let continues = last_segment.is_some()
        && prev.continuation != ContinuationState::Cannot
        && can_continue_prev_block(paragraph, prev);
    let (page, par, snt) = match last_segment {
        Some(last) if continues => (last.page_index(), last.par_index(), last.snt_index()),
        Some(last) if last.page_index() == page_index => (page_index, last.par_index() + 1, 0),
        _ => (page_index, 0, 0),
    };

    let mut splitter = SentenceSplitter {
        config,
        page_index: page,
        par_index: par,
        snt_index: snt,
        open_tags: if continues { prev.open_tags.clone() } else { Vec::new() },
        ended_with_weak_abbr: continues && prev.continuation == ContinuationState::WeakAbbr,
        line_ended_with_ender: false,
        segments: Vec::new(),
    };
    for line in paragraph.take_lines() {
        splitter.split_line(&line);
    }
    trace!(
        "paragraph ({}, {}) has {} segments, continues: {}",
        page,
        par,
        splitter.segments.len(),
        continues
    );

    state.continuation = if paragraph.certainly_finished {
        ContinuationState::Cannot
    } else if splitter.ended_with_weak_abbr {
        ContinuationState::WeakAbbr
    } else if !splitter.line_ended_with_ender {
        ContinuationState::Can
    } else {
        ContinuationState::Cannot
    };
    state.open_tags = splitter.open_tags;
    paragraph.replace_lines(splitter.segments);
    state.text_block = Some(paragraph.clone());
    state
}
