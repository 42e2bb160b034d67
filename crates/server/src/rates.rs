//! Exchange-rate lookup against an external rates API.
//!
//! The API returns every rate it knows for a base currency in one JSON
//! document; the requested code is picked out of the parsed map. An
//! unknown code is the caller's mistake, an unreachable API is ours.

use std::collections::HashMap;

use serde::Deserialize;

use crate::ServerError;

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// Client for the external currency-rate API.
#[derive(Debug)]
pub struct RatesClient {
    http: reqwest::Client,
    api_url: String,
    base_currency: String,
}

impl RatesClient {
    pub fn new(api_url: impl Into<String>, base_currency: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            base_currency: base_currency.into(),
        }
    }

    /// The currency balances are denominated and displayed in by
    /// default.
    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Fetches the multiplier from the base currency to `code`.
    pub async fn rate_for(&self, code: &str) -> Result<f64, ServerError> {
        let url = format!(
            "{}?base={}&symbols={}",
            self.api_url, self.base_currency, code
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| ServerError::Internal(format!("rates lookup failed: {err}")))?;
        let rates: RatesResponse = response
            .json()
            .await
            .map_err(|err| ServerError::Internal(format!("bad rates response: {err}")))?;

        lookup_rate(&rates, code)
    }
}

fn lookup_rate(rates: &RatesResponse, code: &str) -> Result<f64, ServerError> {
    rates
        .rates
        .get(code)
        .copied()
        .ok_or_else(|| ServerError::Generic("invalid currency".to_string()))
}
