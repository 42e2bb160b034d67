//! Handles settings for the application. Configuration is written in
//! `ledgerd.toml`.
//!
//! See `ledgerd.toml` at the repository root for a commented example.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level passed to the tracing env filter (`info`, `debug`, ...).
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Rates {
    /// Base URL of the external exchange-rate API.
    pub api_url: String,
    /// Currency balances are denominated in.
    pub base_currency: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub rates: Rates,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("ledgerd"))
            .build()?;

        settings.try_deserialize()
    }
}
