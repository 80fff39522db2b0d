use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the homeharvest service
    pub harvest_url: String,
    pub default_limit: u32,
    pub default_min_listings: u32,
    pub high_potential_threshold: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            harvest_url: env::var("HARVEST_URL").unwrap_or(defaults.harvest_url),
            default_limit: parse_var("DEFAULT_RESULT_LIMIT", defaults.default_limit)?,
            default_min_listings: parse_var("DEFAULT_MIN_LISTINGS", defaults.default_min_listings)?,
            high_potential_threshold: parse_var(
                "HIGH_POTENTIAL_THRESHOLD",
                defaults.high_potential_threshold,
            )?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            harvest_url: "http://127.0.0.1:8000".to_string(),
            default_limit: 200,
            default_min_listings: 2,
            high_potential_threshold: 70.0,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("{} must be a valid number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
