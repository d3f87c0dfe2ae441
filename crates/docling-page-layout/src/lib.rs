//! # docling-page-layout - Geometric Page Layout Reconstruction
//!
//! Rebuilds the reading structure of a PDF page from positioned primitives
//! (glyphs, images, vector paths and background swatches): lines, columns,
//! classified blocks, paragraphs and enumerated sentences. Sentences may run
//! across pages; the analyzer carries the continuation state from page to page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docling_page_layout::{LayoutAnalyzer, LayoutConfig, PageSource};
//!
//! fn print_sentences<S: PageSource>(source: S) -> docling_page_layout::Result<()> {
//!     let mut analyzer = LayoutAnalyzer::new(source, LayoutConfig::default());
//!     for page in 0..analyzer.page_count() {
//!         for sentence in analyzer.page_content(page)?.sentences() {
//!             println!("{}:{}:{} {}", sentence.page, sentence.paragraph, sentence.sentence, sentence.text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! | Stage | Module |
//! |-------|--------|
//! | Lines and stripes | [`assembler`], [`whitespace`] |
//! | Columns | [`layout`] |
//! | Blocks | [`block_creation`], [`block_marking`], [`lists`] |
//! | Paragraphs and sentences | [`paragraphs`], [`sentences`], [`page`] |
//! | Controller | [`analyzer`], [`cache`], [`observer`] |

pub mod analyzer;
pub mod assembler;
pub mod block;
pub mod block_creation;
pub mod block_marking;
pub mod cache;
pub mod config;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod histogram;
pub mod layout;
pub mod line;
pub mod lists;
pub mod observer;
pub mod ordering;
pub mod page;
pub mod paragraphs;
pub mod primitive;
pub mod sentences;
pub mod whitespace;

pub use analyzer::{LayoutAnalyzer, PageSource};
pub use block::{Block, ContentType, Justification, Location};
pub use cache::{CachedPage, LimitedCache, PageCache};
pub use config::LayoutConfig;
pub use error::{LayoutError, Result};
pub use fonts::{FontMetrics, NoFontMetrics};
pub use geometry::{Bounded, BoundingBox, PageMargins, PageSize};
pub use line::{Association, LineId, LineSegment, ListType};
pub use observer::{Checkpoint, LayoutObserver, NoopObserver};
pub use page::{ProcessedPage, Sentence};
pub use primitive::{FontId, Glyph, ItemFlags, Primitive, PrimitiveKind, PrimitiveType};
pub use sentences::{ContinuationState, ParState};
