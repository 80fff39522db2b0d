use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::SearchRequest;

pub const DEFAULT_LISTING_TYPE: &str = "for_sale";

/// Filters forwarded to the scraper. Any request key outside this list is dropped.
pub const OPTIONAL_FILTERS: [&str; 30] = [
    "price_min",
    "price_max",
    "beds_min",
    "beds_max",
    "baths_min",
    "baths_max",
    "sqft_min",
    "sqft_max",
    "lot_sqft_min",
    "lot_sqft_max",
    "year_built_min",
    "year_built_max",
    "hoa_fee_min",
    "hoa_fee_max",
    "stories_min",
    "stories_max",
    "garage_spaces_min",
    "garage_spaces_max",
    "has_pool",
    "has_garage",
    "waterfront",
    "has_view",
    "past_days",
    "past_hours",
    "tag_filters",
    "tag_match_type",
    "tag_exclude",
    "sort_by",
    "sort_direction",
    "enable_advanced_sort",
];

/// Parameter set handed to the scraper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeParams {
    pub location: String,
    pub listing_type: String,
    pub mls_only: bool,
    pub clean_data: bool,
    pub add_derived_fields: bool,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(flatten)]
    pub filters: Map<String, Value>,
}

impl ScrapeParams {
    pub fn from_request(location: &str, request: &SearchRequest, default_limit: u32) -> Self {
        let filters = OPTIONAL_FILTERS
            .iter()
            .filter_map(|name| match request.extra.get(*name) {
                Some(Value::Null) | None => None,
                Some(value) => Some((name.to_string(), value.clone())),
            })
            .collect();

        Self {
            location: location.to_string(),
            listing_type: request
                .listing_type
                .clone()
                .unwrap_or_else(|| DEFAULT_LISTING_TYPE.to_string()),
            mls_only: true,
            clean_data: true,
            add_derived_fields: true,
            limit: request.limit.unwrap_or(default_limit),
            preset: request.preset.clone().filter(|p| !p.is_empty()),
            filters,
        }
    }
}
