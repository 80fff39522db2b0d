pub mod params;
pub mod stats;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::info;

use crate::harvest::PropertyEngine;
use crate::table::Table;
use params::ScrapeParams;
use stats::MarketStats;

pub const STATUS: &str = "status";

/// Listing states that are no longer actionable for an acquisition
pub const INACTIVE_STATUSES: [&str; 3] = ["pending", "contingent", "pending_continue_to_show"];

#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub properties: Vec<Map<String, Value>>,
    pub market_stats: MarketStats,
}

/// Scrapes, filters, optionally scores, sanitizes and summarizes one search.
pub async fn run_search(
    engine: &dyn PropertyEngine,
    params: &ScrapeParams,
    include_analytics: bool,
    high_potential_threshold: f64,
) -> Result<SearchOutcome> {
    info!(location = %params.location, "Scraping properties");
    let mut properties = engine
        .scrape(params)
        .await
        .context("Property scrape failed")?;

    if properties.is_empty() {
        info!("No properties found");
        return Ok(SearchOutcome::default());
    }
    info!(count = properties.len(), "Found properties");

    let filtered = drop_inactive_listings(&mut properties);
    if filtered > 0 {
        info!(filtered, "Filtered out pending sales");
    }

    if include_analytics && !properties.is_empty() {
        info!("Calculating investment scores");
        properties = engine
            .rank_by_investment_potential(properties)
            .await
            .context("Investment ranking failed")?;
    }

    let market_stats = MarketStats::compute(&properties, high_potential_threshold);
    Ok(SearchOutcome {
        properties: properties.to_records(),
        market_stats,
    })
}

/// Removes pending and contingent listings, returning how many were dropped.
/// Rows without a textual status are kept.
pub fn drop_inactive_listings(properties: &mut Table) -> usize {
    let before = properties.len();
    properties.retain(|row| match row.read::<String>(STATUS) {
        Some(status) => !INACTIVE_STATUSES.contains(&status.to_lowercase().as_str()),
        None => true,
    });
    before - properties.len()
}
