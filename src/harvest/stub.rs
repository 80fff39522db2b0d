//! Deterministic in-memory engine for pipeline and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::{Value, json};

use super::PropertyEngine;
use crate::search::params::ScrapeParams;
use crate::table::{Cell, Column, ColumnKind, Table};

#[derive(Default)]
pub struct StubEngine {
    pub scraped: Table,
    /// Scores attached by `rank_by_investment_potential`, by row position
    pub scores: Vec<f64>,
    /// Replaces the computed detector output when set
    pub candidates: Option<Table>,
    /// Replaces the computed specialization output when set
    pub specialization: Option<Table>,
    pub fail_scrape: bool,
    pub fail_presets: bool,
    pub scrape_calls: AtomicUsize,
    pub rank_calls: AtomicUsize,
    pub detect_calls: AtomicUsize,
    pub specialization_calls: AtomicUsize,
}

impl StubEngine {
    pub fn with_properties(records: Value) -> Self {
        let records = records.as_array().cloned().unwrap_or_default();
        Self {
            scraped: Table::from_records(&records).unwrap(),
            ..Self::default()
        }
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Groups listings by agent in first-seen order
fn listings_by_agent(properties: &Table) -> Vec<(String, Vec<f64>)> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for row in properties.rows() {
        let Some(name) = row.read::<String>("agent_name") else {
            continue;
        };
        let price = row.read::<f64>("list_price").unwrap_or(f64::NAN);
        match groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, prices)) => prices.push(price),
            None => groups.push((name, vec![price])),
        }
    }
    groups
}

#[async_trait]
impl PropertyEngine for StubEngine {
    async fn scrape(&self, _params: &ScrapeParams) -> Result<Table> {
        self.scrape_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_scrape {
            bail!("realtor.com returned 403");
        }
        Ok(self.scraped.clone())
    }

    async fn rank_by_investment_potential(&self, properties: Table) -> Result<Table> {
        self.rank_calls.fetch_add(1, Ordering::SeqCst);
        let mut columns = properties.columns().to_vec();
        columns.push(Column::new("investment_score", ColumnKind::Float));

        let mut ranked = Table::new(columns);
        for (i, row) in properties.rows().enumerate() {
            let mut cells: Vec<Cell> = properties
                .columns()
                .iter()
                .map(|c| row.get(&c.name).cloned().unwrap_or(Cell::Null))
                .collect();
            cells.push(Cell::Float(self.scores.get(i).copied().unwrap_or(f64::NAN)));
            ranked.push_row(cells)?;
        }
        Ok(ranked)
    }

    async fn wholesale_friendly_agents(
        &self,
        properties: &Table,
        min_listings: u32,
    ) -> Result<Table> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(candidates) = &self.candidates {
            return Ok(candidates.clone());
        }

        let records: Vec<Value> = listings_by_agent(properties)
            .into_iter()
            .filter(|(_, prices)| prices.len() >= min_listings as usize)
            .map(|(name, prices)| {
                let known: Vec<f64> = prices.iter().copied().filter(|p| !p.is_nan()).collect();
                let avg_price = (!known.is_empty())
                    .then(|| known.iter().sum::<f64>() / known.len() as f64);
                json!({
                    "agent_name": name,
                    "listing_count": prices.len(),
                    "wholesale_score": 10.0 * prices.len() as f64,
                    "avg_price": avg_price,
                    "min_price": known.iter().copied().reduce(f64::min),
                    "max_price": known.iter().copied().reduce(f64::max),
                })
            })
            .collect();
        Ok(Table::from_records(&records)?)
    }

    async fn agent_specialization(&self, properties: &Table) -> Result<Table> {
        self.specialization_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(specialization) = &self.specialization {
            return Ok(specialization.clone());
        }

        let records: Vec<Value> = listings_by_agent(properties)
            .into_iter()
            .map(|(name, prices)| {
                let top = prices.iter().copied().filter(|p| !p.is_nan()).fold(0.0, f64::max);
                let category = match top {
                    p if p < 200_000.0 => "Budget",
                    p if p < 400_000.0 => "Mid-Range",
                    p if p < 750_000.0 => "Upper-Mid",
                    _ => "Luxury",
                };
                json!({"agent_name": name, "price_category": category})
            })
            .collect();
        Ok(Table::from_records(&records)?)
    }

    async fn presets(&self) -> Result<Value> {
        if self.fail_presets {
            bail!("homeharvest presets unavailable");
        }
        Ok(json!({
            "investor_friendly": "Motivated sellers and value-add properties",
            "luxury": "High-end homes with premium features",
        }))
    }
}
