use serde::Deserialize;

use crate::models::neo::NeoObject;

/// Name of the header NeoWs (api.data.gov) uses to report the remaining hourly budget.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Pagination block of a `browse` response; other keys are ignored.
#[derive(Deserialize, Debug)]
pub struct NeoPageInfo {
    pub total_pages: u32,
}

#[derive(Deserialize, Debug)]
pub struct NeoBrowseResponse {
    pub near_earth_objects: Vec<NeoObject>,
    pub page: Option<NeoPageInfo>,
}
