// Layout analysis configuration
//
// Toggles controlling which page regions are kept in the output and which
// virtual markers are synthesized into line content. The analyzer treats the
// configuration as read-only per run; replacing it invalidates every cached page.

use crate::error::{LayoutError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on pages kept by [`crate::cache::LimitedCache`].
pub const MAX_CACHED_PAGES: usize = 20;
/// Upper bound on iterations of every fixed-point merge loop.
pub const MAX_MERGE_TRIES: usize = 20;
/// Default merge margin for vertically stacked columns.
pub const DEFAULT_VERTICAL_MARGIN: f32 = -6.0;
/// Default merge margin for side-by-side columns.
pub const DEFAULT_HORIZONTAL_MARGIN: f32 = -8.0;
/// Anything thinner than this is treated as zero extent.
pub const MIN_ITEM_SIZE: f32 = 0.01;
/// Maximum thickness of a ruler line.
pub const MAX_RULER_SIZE: f32 = 2.0;
/// Fraction of the page height treated as header/footer band.
pub const HEADER_FOOTER_PAGE_MARGIN_THRESHOLD: f32 = 0.25;
/// Fraction of the page width treated as left sidebar band.
pub const SIDEBAR_PAGE_MARGIN_THRESHOLD: f32 = 0.065;

/// Configuration for layout analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Drop primitives flagged as watermark before line assembly
    pub remove_watermarks: bool,
    /// Hide table blocks and their captions from visible output
    pub discard_tables_and_captions: bool,
    /// Hide image blocks and their captions from visible output
    pub discard_images_and_captions: bool,
    /// Route header lines to a side-channel block
    pub discard_headers: bool,
    /// Route footer lines to a side-channel block
    pub discard_footers: bool,
    /// Route sidebar lines to side-channel blocks
    pub discard_sidebars: bool,
    /// Hide footnote blocks from visible output
    pub discard_footnotes: bool,
    /// A single isolated last line is a footer
    pub assume_last_alone_line_as_footer: bool,
    /// A single isolated first line is a header
    pub assume_first_alone_line_as_header: bool,
    /// Ignore primitives lying within 2% of the page edges
    pub discard_items_in_2_percent_of_page_margin: bool,
    /// Surround subscript runs with virtual markers
    pub mark_subscripts: bool,
    /// Surround superscript runs with virtual markers
    pub mark_superscripts: bool,
    /// Surround bullet identifiers with virtual list markers
    pub mark_bullets: bool,
    /// Surround numbering identifiers with virtual list markers
    pub mark_numberings: bool,
    /// Offset added to every decoded character code
    pub ascii_offset: i8,
}

impl Default for LayoutConfig {
    #[inline]
    fn default() -> Self {
        Self {
            remove_watermarks: true,
            discard_tables_and_captions: true,
            discard_images_and_captions: true,
            discard_headers: true,
            discard_footers: true,
            discard_sidebars: true,
            discard_footnotes: true,
            assume_last_alone_line_as_footer: true,
            assume_first_alone_line_as_header: true,
            discard_items_in_2_percent_of_page_margin: true,
            mark_subscripts: true,
            mark_superscripts: true,
            mark_bullets: true,
            mark_numberings: true,
            ascii_offset: 0,
        }
    }
}

impl LayoutConfig {
    /// Configuration that keeps every region and synthesizes no markers.
    #[must_use = "returns a new config"]
    pub fn keep_everything() -> Self {
        Self {
            remove_watermarks: false,
            discard_tables_and_captions: false,
            discard_images_and_captions: false,
            discard_headers: false,
            discard_footers: false,
            discard_sidebars: false,
            discard_footnotes: false,
            assume_last_alone_line_as_footer: false,
            assume_first_alone_line_as_header: false,
            discard_items_in_2_percent_of_page_margin: false,
            mark_subscripts: false,
            mark_superscripts: false,
            mark_bullets: false,
            mark_numberings: false,
            ascii_offset: 0,
        }
    }

    /// Check that the configuration can be applied.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidConfig`] when the ASCII offset would move
    /// the space character below code point zero.
    pub fn validate(&self) -> Result<()> {
        if i32::from(self.ascii_offset) + i32::from(b' ') < 0 {
            return Err(LayoutError::InvalidConfig(format!(
                "ascii_offset {} maps ' ' below zero",
                self.ascii_offset
            )));
        }
        Ok(())
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Serialization`] for malformed JSON and
    /// [`LayoutError::InvalidConfig`] when validation fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Apply the configured code point offset to a decoded character.
    #[inline]
    #[must_use = "returns the shifted code point"]
    pub fn apply_ascii_offset(&self, code: char) -> char {
        if self.ascii_offset == 0 {
            return code;
        }
        let shifted = i64::from(u32::from(code)) + i64::from(self.ascii_offset);
        u32::try_from(shifted)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayoutConfig::default();
        assert!(config.discard_headers);
        assert!(config.mark_numberings);
        assert_eq!(config.ascii_offset, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_partial_fields_take_defaults() {
        let config = LayoutConfig::from_json(r#"{"discard_headers": false}"#).unwrap();
        assert!(!config.discard_headers);
        assert!(config.discard_footers);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = LayoutConfig {
            ascii_offset: 3,
            ..LayoutConfig::keep_everything()
        };
        let json = config.to_json().unwrap();
        assert_eq!(LayoutConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_offset_rejected() {
        let config = LayoutConfig {
            ascii_offset: -40,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LayoutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_ascii_offset() {
        let config = LayoutConfig {
            ascii_offset: 1,
            ..LayoutConfig::default()
        };
        assert_eq!(config.apply_ascii_offset('a'), 'b');
        assert_eq!(LayoutConfig::default().apply_ascii_offset('a'), 'a');
    }
}
