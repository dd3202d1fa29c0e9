//! Provider-agnostic result of fetching one `browse` page.

use crate::models::neo::NeoObject;

/// One page of objects plus the metadata the sync engine consumes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowsePage {
    /// Zero-based page index this result belongs to.
    pub page: u32,
    /// Objects on the page. Pages past the end are simply empty.
    pub objects: Vec<NeoObject>,
    /// Total page count reported by the source, when present.
    pub total_pages: Option<u32>,
    /// Remaining call budget reported by the source (`x-ratelimit-remaining`).
    pub rate_remaining: Option<u32>,
}
