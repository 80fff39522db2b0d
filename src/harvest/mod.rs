pub mod client;
pub mod wire;

#[cfg(test)]
pub(crate) mod stub;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::search::params::ScrapeParams;
use crate::table::Table;

pub use client::HarvestClient;

/// The homeharvest operations this service depends on.
///
/// Scraping, scoring and agent heuristics all live behind this trait; the
/// service only shapes what comes back.
#[async_trait]
pub trait PropertyEngine: Send + Sync {
    async fn scrape(&self, params: &ScrapeParams) -> Result<Table>;

    /// Returns the table with an `investment_score` column attached
    async fn rank_by_investment_potential(&self, properties: Table) -> Result<Table>;

    /// One row per agent with at least `min_listings` listings in the batch
    async fn wholesale_friendly_agents(
        &self,
        properties: &Table,
        min_listings: u32,
    ) -> Result<Table>;

    /// One row per agent carrying a `price_category`
    async fn agent_specialization(&self, properties: &Table) -> Result<Table>;

    async fn presets(&self) -> Result<Value>;
}
