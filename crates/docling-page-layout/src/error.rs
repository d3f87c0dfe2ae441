//! Error types for page layout analysis.
//!
//! The geometric heuristics themselves never fail: degenerate input produces
//! empty or default structure. Errors only surface at the boundary with the
//! page source collaborator and when loading configuration.

use thiserror::Error;

/// Errors that can occur while analyzing pages.
///
/// # Examples
///
/// ```no_run
/// use docling_page_layout::{LayoutAnalyzer, LayoutConfig, LayoutError, PageSource};
///
/// fn first_page<S: PageSource>(source: S) -> docling_page_layout::Result<()> {
///     let mut analyzer = LayoutAnalyzer::new(source, LayoutConfig::default());
///     match analyzer.page_content(0) {
///         Ok(page) => log::debug!("{} blocks", page.blocks.len()),
///         Err(LayoutError::PageOutOfRange { page, page_count }) => {
///             log::warn!("page {page} requested but document has {page_count}");
///         }
///         Err(e) => return Err(e),
///     }
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum LayoutError {
    /// Requested page index is not part of the document.
    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange {
        /// Requested page index
        page: usize,
        /// Number of pages reported by the source
        page_count: usize,
    },

    /// The page source failed to deliver primitives for a page.
    ///
    /// This wraps load-time failures of the document collaborator such as a
    /// corrupted content stream or a missing password.
    #[error("Page source failed on page {page}: {message}")]
    Source {
        /// Page index being loaded
        page: usize,
        /// Collaborator supplied description
        message: String,
    },

    /// A cache dropped the page before the analyzer could hand it out.
    #[error("Page {page} was evicted from the page cache")]
    Evicted {
        /// Page index being returned
        page: usize,
    },

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for layout analysis operations.
pub type Result<T> = std::result::Result<T, LayoutError>;
