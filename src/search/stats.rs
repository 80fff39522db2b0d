use serde::Serialize;

use crate::table::Table;

pub const LIST_PRICE: &str = "list_price";
pub const PRICE_PER_SQFT: &str = "price_per_sqft";
pub const DAYS_ON_MLS: &str = "days_on_mls";
pub const INVESTMENT_SCORE: &str = "investment_score";

/// Aggregates over one search result. A metric whose source column is absent
/// or entirely null is left out of the serialized mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_price_per_sqft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_days_on_market: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_investment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_potential_count: Option<usize>,
}

impl MarketStats {
    pub fn compute(properties: &Table, high_potential_threshold: f64) -> Self {
        let mut stats = Self::default();

        if let Some(prices) = properties.numeric_column(LIST_PRICE) {
            stats.avg_price = Some(mean(&prices));
            stats.median_price = Some(median(&prices));
            stats.min_price = prices.iter().copied().reduce(f64::min);
            stats.max_price = prices.iter().copied().reduce(f64::max);
        }

        if let Some(per_sqft) = properties.numeric_column(PRICE_PER_SQFT) {
            stats.avg_price_per_sqft = Some(mean(&per_sqft));
        }

        if let Some(days) = properties.numeric_column(DAYS_ON_MLS) {
            stats.avg_days_on_market = Some(mean(&days));
        }

        if let Some(scores) = properties.numeric_column(INVESTMENT_SCORE) {
            stats.avg_investment_score = Some(mean(&scores));
            stats.high_potential_count = Some(
                scores
                    .iter()
                    .filter(|score| **score >= high_potential_threshold)
                    .count(),
            );
        }

        stats
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Mean of a column's numeric values; `None` when there are none.
pub(crate) fn column_mean(table: &Table, column: &str) -> Option<f64> {
    table.numeric_column(column).map(|values| mean(&values))
}
