use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::agents::AgentSummary;
use crate::search::stats::MarketStats;

/// Request payload for the search endpoint
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub location: Option<String>,
    pub listing_type: Option<String>,
    pub preset: Option<String>,
    pub limit: Option<u32>,
    /// On when left out; an explicit `null` turns it off
    #[serde(default = "analytics_on", deserialize_with = "null_as_off")]
    pub include_analytics: bool,
    /// Everything else the client sent; only allow-listed filters are read from it
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn analytics_on() -> bool {
    true
}

fn null_as_off<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Request payload for the agents endpoint
#[derive(Debug, Default, Deserialize)]
pub struct AgentsRequest {
    pub properties: Option<Vec<Value>>,
    pub min_listings: Option<u32>,
}

/// Response payload for the search endpoint
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub count: usize,
    pub properties: Vec<Map<String, Value>>,
    pub market_stats: MarketStats,
    pub scraped_at: String,
}

#[derive(Debug, Serialize)]
pub struct PresetsResponse {
    pub success: bool,
    pub presets: Value,
}

#[derive(Debug, Serialize)]
pub struct AgentsResponse {
    pub success: bool,
    pub count: usize,
    pub agents: Vec<AgentSummary>,
}

/// Response payload for the health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Service is healthy".to_string(),
        }
    }
}

impl SearchRequest {
    /// The requested location, if it is not empty or just whitespace
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.trim().is_empty())
    }
}

impl AgentsRequest {
    /// The property batch, if one with at least one record was sent
    pub fn properties(&self) -> Option<&[Value]> {
        self.properties.as_deref().filter(|p| !p.is_empty())
    }
}

impl SearchResponse {
    pub fn new(
        properties: Vec<Map<String, Value>>,
        market_stats: MarketStats,
        scraped_at: String,
    ) -> Self {
        Self {
            success: true,
            count: properties.len(),
            properties,
            market_stats,
            scraped_at,
        }
    }
}

impl AgentsResponse {
    pub fn new(agents: Vec<AgentSummary>) -> Self {
        Self {
            success: true,
            count: agents.len(),
            agents,
        }
    }
}
