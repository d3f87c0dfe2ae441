//! Processed page cache.
//!
//! Pages are cached by index together with a dirty flag. A dirty page was
//! computed against an incoming state that may be stale: its geometry is final
//! but its first paragraph needs a re-split once the true state is known.

use crate::config::MAX_CACHED_PAGES;
use crate::page::ProcessedPage;
use log::trace;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// One cached page.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
    pub page: ProcessedPage,
    pub dirty: bool,
}

/// Storage for processed pages, keyed by page index.
pub trait PageCache {
    fn get(&self, page: usize) -> Option<&CachedPage>;

    fn get_mut(&mut self, page: usize) -> Option<&mut CachedPage>;

    /// Store `entry` for `page`, replacing any previous entry.
    fn put(&mut self, page: usize, entry: CachedPage);

    /// Drop the entry of `page`, if any.
    fn invalidate(&mut self, page: usize);

    fn clear(&mut self);

    #[inline]
    fn contains(&self, page: usize) -> bool {
        self.get(page).is_some()
    }
}

/// Bounded cache that evicts the oldest insertion first.
#[derive(Debug, Clone)]
pub struct LimitedCache {
    capacity: usize,
    entries: FxHashMap<usize, CachedPage>,
    order: VecDeque<usize>,
}

impl Default for LimitedCache {
    fn default() -> Self {
        Self::new(MAX_CACHED_PAGES)
    }
}

impl LimitedCache {
    /// Cache holding at most `capacity` pages; a zero capacity holds one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: FxHashMap::default(),
            order: VecDeque::with_capacity(capacity),
        }
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PageCache for LimitedCache {
    #[inline]
    fn get(&self, page: usize) -> Option<&CachedPage> {
        self.entries.get(&page)
    }

    #[inline]
    fn get_mut(&mut self, page: usize) -> Option<&mut CachedPage> {
        self.entries.get_mut(&page)
    }

    fn put(&mut self, page: usize, entry: CachedPage) {
        if self.entries.insert(page, entry).is_some() {
            return;
        }
        self.order.push_back(page);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                trace!("evicted page {oldest} from cache");
            }
        }
    }

    fn invalidate(&mut self, page: usize) {
        if self.entries.remove(&page).is_some() {
            self.order.retain(|&cached| cached != page);
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
