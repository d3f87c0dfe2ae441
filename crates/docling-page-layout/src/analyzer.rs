//! Page layout analyzer.
//!
//! [`LayoutAnalyzer`] pulls primitives from a [`PageSource`], runs the layout
//! pipeline page by page and caches the results. Pages are processed lazily:
//! asking for page `n` may process earlier pages to learn whether `n` opens
//! with a sentence continued from before.
//!
//! # Pipeline
//!
//! 1. Ingestion: margin-band filtering, watermark removal, code offset and
//!    vertical ruler consolidation
//! 2. Stripes: content margins of the page
//! 3. Lines, and the main-content lines used for column segmentation
//! 4. Columns: XY-cut regions
//! 5. Blocks: one running block per region plus side channels
//! 6. Marking: inner columns, tables, images, captions and footnotes
//! 7. Paragraphs and sentences

use crate::assembler::{find_lines, find_vert_stripes, merge_vert_ruler_parts};
use crate::block_creation::make_blocks;
use crate::block_marking::split_and_mark_blocks;
use crate::cache::{CachedPage, LimitedCache, PageCache};
use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::fonts::{FontMetrics, NoFontMetrics};
use crate::geometry::{Bounded, PageMargins, PageSize};
use crate::layout::LayoutStorage;
use crate::line::LineSegment;
use crate::observer::{Checkpoint, LayoutObserver};
use crate::page::{extract_and_enumerate_sentences, update_first_paragraph, ProcessedPage};
use crate::primitive::Primitive;
use crate::sentences::ParState;
use log::{debug, trace, warn};
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

/// Fraction of the page size forming the edge band whose items may be ignored.
const PAGE_EDGE_BAND: f32 = 0.02;

/// Highest page count the sentence indices can address.
const MAX_PAGES: usize = i16::MAX as usize + 1;

/// Document collaborator delivering page geometry and primitives.
///
/// Primitives come with their header, footer, sidebar, watermark and
/// repetition labels already set.
pub trait PageSource {
    fn page_count(&self) -> usize;

    fn page_size(&self, page: usize) -> PageSize;

    /// Primitives of `page` and the margins reported for it.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Source`] when the page cannot be loaded.
    fn page_items(&self, page: usize) -> Result<(Vec<Primitive>, PageMargins)>;
}

impl<T: PageSource + ?Sized> PageSource for &T {
    #[inline]
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    #[inline]
    fn page_size(&self, page: usize) -> PageSize {
        (**self).page_size(page)
    }

    #[inline]
    fn page_items(&self, page: usize) -> Result<(Vec<Primitive>, PageMargins)> {
        (**self).page_items(page)
    }
}

/// Outcome of one backward step of the continuation walk.
enum Resolution {
    /// The incoming state is known
    Final(ParState),
    /// The state depends on the first paragraph of this page, itself unresolved
    Pending(usize),
}

/// Lazy, caching layout analyzer over a page source.
pub struct LayoutAnalyzer<S, C = LimitedCache> {
    source: S,
    config: LayoutConfig,
    cache: C,
    metrics: Box<dyn FontMetrics>,
    observer: Option<Box<dyn LayoutObserver>>,
}

impl<S: PageSource> LayoutAnalyzer<S> {
    /// Analyzer caching up to [`crate::config::MAX_CACHED_PAGES`] pages.
    #[must_use]
    pub fn new(source: S, config: LayoutConfig) -> Self {
        Self::with_cache(source, config, LimitedCache::default())
    }
}

impl<S: PageSource, C: PageCache> LayoutAnalyzer<S, C> {
    #[must_use]
    pub fn with_cache(source: S, config: LayoutConfig, cache: C) -> Self {
        Self {
            source,
            config,
            cache,
            metrics: Box::new(NoFontMetrics),
            observer: None,
        }
    }

    /// Use `metrics` to measure word spacing.
    #[must_use]
    pub fn with_font_metrics(mut self, metrics: impl FontMetrics + 'static) -> Self {
        self.metrics = Box::new(metrics);
        self
    }

    /// Report pipeline checkpoints of every processed page to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: impl LayoutObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Replace the configuration. Cached pages are dropped when it changes.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidConfig`] when `config` does not validate;
    /// the current configuration is then kept.
    pub fn set_config(&mut self, config: LayoutConfig) -> Result<()> {
        config.validate()?;
        if config != self.config {
            debug!("configuration changed, clearing page cache");
            self.config = config;
            self.cache.clear();
        }
        Ok(())
    }

    /// Number of pages the analyzer can address.
    #[must_use]
    pub fn page_count(&self) -> usize {
        let count = self.source.page_count();
        if count > MAX_PAGES {
            warn!("document has {count} pages, only the first {MAX_PAGES} are addressable");
        }
        count.min(MAX_PAGES)
    }

    /// Final content of `page`.
    ///
    /// A clean cached page is returned as is. Otherwise the state left by the
    /// previous pages is resolved first; a dirty cached page then only gets
    /// its first paragraph re-split, any other page is processed in full.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::PageOutOfRange`] for pages past the end, and
    /// propagates source failures of this page or of earlier pages processed
    /// on the way.
    pub fn page_content(&mut self, page: usize) -> Result<&ProcessedPage> {
        let page_count = self.page_count();
        if page >= page_count {
            return Err(LayoutError::PageOutOfRange { page, page_count });
        }

        if self.cache.get(page).map_or(true, |cached| cached.dirty) {
            let prev = if page > 0 {
                self.incoming_state(page)?
            } else {
                ParState::default()
            };
            let page_index = page_index(page);
            if self.cache.get(page).is_some_and(|cached| cached.dirty) {
                if let Some(cached) = self.cache.get_mut(page) {
                    update_first_paragraph(&self.config, &mut cached.page, page_index, &prev);
                    cached.dirty = false;
                    trace!("page {page}: refreshed dirty page");
                }
            } else {
                let processed = self.process_page(page, &prev)?;
                self.cache.put(
                    page,
                    CachedPage {
                        page: processed,
                        dirty: false,
                    },
                );
            }
        }

        self.cache
            .get(page)
            .map(|cached| &cached.page)
            .ok_or(LayoutError::Evicted { page })
    }

    /// Entry of `page` for the continuation walk.
    ///
    /// Cached pages are used in place. Missing pages are processed from a
    /// blank state into `walked`, dirty unless first, and stay out of the
    /// cache until the walk is over.
    fn walk_entry<'a>(
        &'a mut self,
        walked: &'a mut FxHashMap<usize, CachedPage>,
        page: usize,
    ) -> Result<&'a mut CachedPage> {
        if self.cache.contains(page) {
            return self.cache.get_mut(page).ok_or(LayoutError::Evicted { page });
        }
        if !walked.contains_key(&page) {
            let processed = self.process_page(page, &ParState::default())?;
            walked.insert(
                page,
                CachedPage {
                    page: processed,
                    dirty: page > 0,
                },
            );
        }
        walked.get_mut(&page).ok_or(LayoutError::Evicted { page })
    }

    /// State handed to `page` by the pages before it.
    ///
    /// Walks backward to the nearest page holding text. Its outgoing state is
    /// final when the page is clean; a dirty page was processed from a blank
    /// state, so the walk resolves that page's own incoming state first and
    /// refreshes the page on the way back. The last main block always comes
    /// from the page right before `page`. Pages processed by the walk enter
    /// the cache once it is over, so the walk never loses them to eviction.
    fn incoming_state(&mut self, page: usize) -> Result<ParState> {
        let mut walked = FxHashMap::default();
        let last_page_main_block = self
            .walk_entry(&mut walked, page - 1)?
            .page
            .state
            .last_page_main_block
            .clone();

        let mut pending = Vec::new();
        let mut target = page;
        let resolved = loop {
            match self.resolve_step(&mut walked, target) {
                Ok(Resolution::Final(state)) => break Ok(state),
                Ok(Resolution::Pending(prev)) => {
                    pending.push(prev);
                    target = prev;
                }
                Err(err) => break Err(err),
            }
        };

        let config = self.config;
        let outcome = resolved.and_then(|mut state| {
            while let Some(prev) = pending.pop() {
                let entry = self.walk_entry(&mut walked, prev)?;
                update_first_paragraph(&config, &mut entry.page, page_index(prev), &state);
                entry.dirty = false;
                state = entry.page.state.clone();
                trace!("page {prev}: refreshed on the way back to page {page}");
            }
            Ok(state)
        });

        let mut walked: Vec<(usize, CachedPage)> = walked.into_iter().collect();
        walked.sort_unstable_by_key(|&(walked_page, _)| walked_page);
        for (walked_page, entry) in walked {
            self.cache.put(walked_page, entry);
        }

        let mut state = outcome?;
        state.last_page_main_block = last_page_main_block;
        Ok(state)
    }

    /// One backward step from `target`, which must not be the first page.
    fn resolve_step(&mut self, walked: &mut FxHashMap<usize, CachedPage>, target: usize) -> Result<Resolution> {
        let mut prev = target - 1;
        loop {
            let entry = self.walk_entry(walked, prev)?;
            let state = &entry.page.state;
            if state.text_block.is_some() {
                return Ok(if entry.dirty {
                    Resolution::Pending(prev)
                } else {
                    Resolution::Final(state.clone())
                });
            }
            if prev == 0 {
                return Ok(Resolution::Final(state.clone()));
            }
            entry.dirty = false;
            prev -= 1;
        }
    }

    /// Run the whole pipeline on `page` with `prev` as incoming state.
    fn process_page(&mut self, page: usize, prev: &ParState) -> Result<ProcessedPage> {
        let size = self.source.page_size(page);
        let (items, reported_margins) = self.source.page_items(page)?;
        let item_count = items.len();
        let items = self.ingest(items, size);
        debug!("page {page}: {} of {item_count} primitives kept", items.len());

        let stripes = find_vert_stripes(&items, size);
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_lines(page, Checkpoint::Stripes, &stripes);
        }
        let margins = content_margins(&stripes, size, reported_margins);

        let lines = find_lines(&items);
        let main_lines: Vec<LineSegment> = lines
            .iter()
            .filter(|line| {
                let flags = line.flags();
                !(flags.header && self.config.discard_headers)
                    && !(flags.footer && self.config.discard_footers)
                    && !(flags.sidebar && self.config.discard_sidebars)
            })
            .cloned()
            .collect();
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_lines(page, Checkpoint::Lines, &main_lines);
        }

        let mut storage = LayoutStorage::new(&main_lines, true);
        storage.identify_main_columns(size, &margins);
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_regions(page, Checkpoint::Columns, storage.children());
        }

        let metrics = self.metrics.as_ref();
        let blocks = make_blocks(&self.config, size, storage.children(), lines, metrics);
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_blocks(page, Checkpoint::Blocks, &blocks);
        }

        let blocks = split_and_mark_blocks(&self.config, size, &margins, metrics, blocks, prev);
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_blocks(page, Checkpoint::Marked, &blocks);
        }

        let processed = extract_and_enumerate_sentences(&self.config, page_index(page), blocks, metrics, prev);
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_blocks(page, Checkpoint::Paragraphs, &processed.blocks);
        }
        Ok(processed)
    }

    /// Filter and normalize the primitives of a page.
    fn ingest(&self, items: Vec<Primitive>, size: PageSize) -> Vec<Primitive> {
        let config = &self.config;
        let items: Vec<Primitive> = items
            .into_iter()
            .filter(|item| !config.discard_items_in_2_percent_of_page_margin || !in_edge_band(item, size))
            .filter(|item| !config.remove_watermarks || !item.flags.watermark)
            .map(|mut item| {
                if let Some(glyph) = item.glyph_mut() {
                    glyph.code = config.apply_ascii_offset(glyph.code);
                }
                label_side_content(config, &mut item);
                item
            })
            .collect();
        merge_vert_ruler_parts(items)
    }
}

/// Page index as carried by sentence segments.
fn page_index(page: usize) -> i16 {
    i16::try_from(page).unwrap_or(i16::MAX)
}

/// The item lies entirely within the band along one of the page edges.
fn in_edge_band(item: &Primitive, size: PageSize) -> bool {
    let bbox = item.bbox();
    bbox.x1 < PAGE_EDGE_BAND * size.width
        || bbox.x0 > (1.0 - PAGE_EDGE_BAND) * size.width
        || bbox.y1 < PAGE_EDGE_BAND * size.height
        || bbox.y0 > (1.0 - PAGE_EDGE_BAND) * size.height
}

/// Keep header and footer labels only for discarded channels; everything else
/// is main content.
fn label_side_content(config: &LayoutConfig, item: &mut Primitive) {
    let flags = &mut item.flags;
    flags.header &= config.discard_headers;
    flags.footer &= config.discard_footers && !flags.header;
    flags.main_content = !flags.header && !flags.footer;
}

/// Horizontal margins measured from the stripes; vertical ones as reported.
fn content_margins(stripes: &[LineSegment], size: PageSize, reported: PageMargins) -> PageMargins {
    let left = stripes
        .iter()
        .map(|stripe| OrderedFloat(stripe.bbox().x0))
        .min()
        .map_or(size.width, |left| left.0.min(size.width));
    let right = stripes
        .iter()
        .map(|stripe| OrderedFloat(stripe.bbox().x1))
        .max()
        .map_or(0.0, |right| right.0.max(0.0));
    PageMargins {
        left,
        right: size.width - right,
        ..reported
    }
}
