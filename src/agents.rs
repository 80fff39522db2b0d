use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::harvest::PropertyEngine;
use crate::search::stats::{DAYS_ON_MLS, column_mean};
use crate::table::{Cell, FromCell, RowView, Table};

pub const AGENT_NAME: &str = "agent_name";
pub const PRICE_CATEGORY: &str = "price_category";

/// One wholesale-friendly agent as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    pub agent_name: Value,
    pub agent_email: Value,
    pub agent_phone: Value,
    pub broker_name: Value,
    pub office_name: Value,
    pub wholesale_score: Option<f64>,
    pub listing_count: Option<i64>,
    pub avg_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub price_category: Value,
    pub avg_days_on_market: Option<f64>,
}

#[derive(Debug, Error)]
pub enum AgentBuildError {
    #[error("agent row has no agent_name")]
    MissingName,

    #[error("{table} has no `{column}` column")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// Finds wholesale-friendly agents in a property batch and joins each with
/// its own listings and price specialization.
///
/// An agent whose record cannot be built is logged and left out; it never
/// fails the batch.
pub async fn find_wholesale_agents(
    engine: &dyn PropertyEngine,
    properties: &Table,
    min_listings: u32,
) -> Result<Vec<AgentSummary>> {
    info!(min_listings, "Finding wholesale agents");
    let candidates = engine
        .wholesale_friendly_agents(properties, min_listings)
        .await
        .context("Wholesale agent detection failed")?;

    if candidates.is_empty() {
        info!("No wholesale agents found");
        return Ok(Vec::new());
    }

    info!("Analyzing specializations");
    let specialization = engine
        .agent_specialization(properties)
        .await
        .context("Agent specialization analysis failed")?;

    let mut agents = Vec::with_capacity(candidates.len());
    for candidate in candidates.rows() {
        match build_agent(candidate, properties, &specialization) {
            Ok(agent) => agents.push(agent),
            Err(e) => warn!(error = %e, "Error processing agent"),
        }
    }

    info!(count = agents.len(), "Found wholesale agents");
    Ok(agents)
}

fn build_agent(
    candidate: RowView<'_>,
    properties: &Table,
    specialization: &Table,
) -> Result<AgentSummary, AgentBuildError> {
    let name = candidate
        .get(AGENT_NAME)
        .filter(|cell| !cell.is_missing())
        .ok_or(AgentBuildError::MissingName)?;

    let listings = properties
        .matching(AGENT_NAME, name)
        .ok_or(AgentBuildError::MissingColumn {
            table: "property batch",
            column: AGENT_NAME,
        })?;
    let specialty = specialization
        .matching(AGENT_NAME, name)
        .ok_or(AgentBuildError::MissingColumn {
            table: "specialization",
            column: AGENT_NAME,
        })?;

    let passthrough = |column: &str| candidate.value_or(column, Cell::Null).to_json();
    let number = |column: &str| candidate.read::<f64>(column);

    Ok(AgentSummary {
        agent_name: name.to_json(),
        agent_email: passthrough("agent_email"),
        agent_phone: passthrough("primary_phone"),
        broker_name: passthrough("broker_name"),
        office_name: passthrough("office_name"),
        wholesale_score: read_or_zero(&candidate, "wholesale_score"),
        listing_count: read_or_zero(&candidate, "listing_count"),
        avg_price: number("avg_price"),
        min_price: number("min_price"),
        max_price: number("max_price"),
        price_category: specialty
            .rows()
            .next()
            .and_then(|row| row.get(PRICE_CATEGORY))
            .map_or(Value::Null, Cell::to_json),
        avg_days_on_market: column_mean(&listings, DAYS_ON_MLS),
    })
}

/// Zero when the detector left the value out; a present but non-numeric value is still `None`.
fn read_or_zero<T: FromCell>(row: &RowView<'_>, column: &str) -> Option<T> {
    T::from_cell(&row.value_or(column, Cell::Int(0)))
}
