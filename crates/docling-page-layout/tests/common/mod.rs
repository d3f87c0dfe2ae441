//! Synthetic page fixtures shared by the integration tests.

use docling_page_layout::{
    Block, BoundingBox, ContentType, FontId, Glyph, Justification, LayoutError, LineSegment, Location, PageMargins,
    PageSize, PageSource, Primitive,
};

/// Width of every synthetic glyph.
pub const GLYPH_WIDTH: f32 = 5.0;
/// Baseline-to-baseline distance of synthetic paragraphs.
pub const LINE_PITCH: f32 = 12.0;
pub const PAGE: PageSize = PageSize::new(600.0, 800.0);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Glyphs of `text` laid out left to right from `x0`, 10 units tall.
pub fn glyphs(text: &str, x0: f32, top: f32) -> Vec<Primitive> {
    text.chars()
        .enumerate()
        .map(|(i, code)| {
            let x = x0 + i as f32 * GLYPH_WIDTH;
            Primitive::glyph(
                BoundingBox::new(x, top, x + GLYPH_WIDTH, top + 10.0),
                Glyph::new(code, top + 8.0, Some(FontId(1)), 10.0),
            )
        })
        .collect()
}

pub fn text_line(text: &str, x0: f32, top: f32) -> LineSegment {
    LineSegment::from_items(glyphs(text, x0, top))
}

/// Main text block of `texts`, one line each, all starting at `x0`.
pub fn text_block(texts: &[&str], x0: f32, top: f32) -> Block {
    let mut block = Block::with_justification(Location::Main, ContentType::Text, Justification::Justified);
    for (row, text) in texts.iter().enumerate() {
        block.append_line_segment(text_line(text, x0, top + row as f32 * LINE_PITCH), false);
    }
    block
}

/// Builder of one synthetic page.
#[derive(Debug, Clone, Default)]
pub struct PageBuilder {
    items: Vec<Primitive>,
    margins: PageMargins,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines of text stacked from `top`, one pitch apart.
    pub fn paragraph(mut self, texts: &[&str], x0: f32, top: f32) -> Self {
        for (row, text) in texts.iter().enumerate() {
            self.items.extend(glyphs(text, x0, top + row as f32 * LINE_PITCH));
        }
        self
    }

    pub fn image(mut self, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        self.items.push(Primitive::image(BoundingBox::new(x0, y0, x1, y1)));
        self
    }

    pub fn margins(mut self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        self.margins = PageMargins {
            left,
            top,
            right,
            bottom,
        };
        self
    }

    pub fn build(self) -> (Vec<Primitive>, PageMargins) {
        (self.items, self.margins)
    }
}

/// In-memory document of synthetic pages, all of size [`PAGE`].
#[derive(Debug, Clone, Default)]
pub struct SyntheticDocument {
    pages: Vec<(Vec<Primitive>, PageMargins)>,
}

impl SyntheticDocument {
    pub fn new(pages: Vec<PageBuilder>) -> Self {
        Self {
            pages: pages.into_iter().map(PageBuilder::build).collect(),
        }
    }
}

impl PageSource for SyntheticDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, _page: usize) -> PageSize {
        PAGE
    }

    fn page_items(&self, page: usize) -> docling_page_layout::Result<(Vec<Primitive>, PageMargins)> {
        self.pages.get(page).cloned().ok_or(LayoutError::Source {
            page,
            message: "no such page".to_string(),
        })
    }
}
