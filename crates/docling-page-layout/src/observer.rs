//! Pipeline checkpoints.
//!
//! A [`LayoutObserver`] sees the intermediate results of every page the
//! analyzer computes. All hooks default to doing nothing.

use crate::block::Block;
use crate::layout::RegionNode;
use crate::line::LineSegment;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline step after which an observer hook fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Checkpoint {
    Stripes,
    Lines,
    Columns,
    Blocks,
    Marked,
    Paragraphs,
}

impl Checkpoint {
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripes => "stripes",
            Self::Lines => "lines",
            Self::Columns => "columns",
            Self::Blocks => "blocks",
            Self::Marked => "marked",
            Self::Paragraphs => "paragraphs",
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives intermediate results of the layout pipeline.
pub trait LayoutObserver {
    /// Stripes and main-content lines.
    fn on_lines(&mut self, _page: usize, _checkpoint: Checkpoint, _lines: &[LineSegment]) {}

    /// Top-level column regions.
    fn on_regions(&mut self, _page: usize, _checkpoint: Checkpoint, _regions: &[RegionNode]) {}

    /// Raw blocks, marked blocks and final paragraphs.
    fn on_blocks(&mut self, _page: usize, _checkpoint: Checkpoint, _blocks: &[Block]) {}
}

/// Observer that ignores every checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl LayoutObserver for NoopObserver {}
