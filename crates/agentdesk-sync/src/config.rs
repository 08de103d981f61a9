//! Store configuration

use std::time::Duration;

/// Default delay between the last keystroke and the search request
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default remaining-distance (px) below which the next page is requested
pub const DEFAULT_SCROLL_THRESHOLD_PX: f64 = 100.0;

/// Default number of conversations requested per page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Debounce applied to `search_conversations`
    pub search_debounce: Duration,
    /// Infinite-scroll trigger distance from the bottom, in pixels
    pub scroll_threshold_px: f64,
    /// Page size for conversation listing
    pub page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            scroll_threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
