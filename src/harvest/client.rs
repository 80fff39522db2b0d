use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use super::PropertyEngine;
use super::wire::WireTable;
use crate::search::params::ScrapeParams;
use crate::table::Table;

/// HTTP client for the homeharvest sidecar.
/// Cheap to clone; every clone shares one connection pool.
#[derive(Debug, Clone)]
pub struct HarvestClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct WholesaleRequest {
    properties: WireTable,
    min_listings: u32,
}

impl HarvestClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build homeharvest HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;
        decode(response, &url).await
    }

    async fn post_table<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Table> {
        let wire: WireTable = self.post(path, body).await?;
        wire.into_table()
            .with_context(|| format!("Malformed table from {}", self.url(path)))
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(anyhow!(
            "homeharvest request to {} failed with {}: {}",
            url,
            status,
            error_text
        ));
    }

    response
        .json()
        .await
        .with_context(|| format!("Invalid JSON from {}", url))
}

#[async_trait]
impl PropertyEngine for HarvestClient {
    async fn scrape(&self, params: &ScrapeParams) -> Result<Table> {
        info!(location = %params.location, limit = params.limit, "calling homeharvest scrape");
        self.post_table("/scrape", params).await
    }

    async fn rank_by_investment_potential(&self, properties: Table) -> Result<Table> {
        self.post_table("/rank", &WireTable::from_table(&properties)).await
    }

    async fn wholesale_friendly_agents(
        &self,
        properties: &Table,
        min_listings: u32,
    ) -> Result<Table> {
        let body = WholesaleRequest {
            properties: WireTable::from_table(properties),
            min_listings,
        };
        self.post_table("/agents/wholesale", &body).await
    }

    async fn agent_specialization(&self, properties: &Table) -> Result<Table> {
        self.post_table("/agents/specialization", &WireTable::from_table(properties))
            .await
    }

    async fn presets(&self) -> Result<Value> {
        let url = self.url("/presets");
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;
        decode(response, &url).await
    }
}
