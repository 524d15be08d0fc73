// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::exchange_rates::{RateProvider, RateTable};
use crate::models::RatesResponse;

/// Client for the `/latest/{base}` endpoint of exchangerate-api.com and compatible services
#[derive(Clone)]
pub struct ExchangeRateApiClient {
    client: Client,
    base_url: String,
}

impl ExchangeRateApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn latest_url(&self, base: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), base)
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiClient {
    async fn fetch_rates(&self, base: &str) -> Result<RateTable> {
        if base.is_empty() {
            anyhow::bail!("base currency empty");
        }

        let url = self.latest_url(base);
        debug!("Requesting exchange rates from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let text = response.text().await.context("Failed to get response text")?;

        if !status.is_success() {
            anyhow::bail!("API error: {} - {}", status, text);
        }

        parse_rates(&text)
    }
}

/// Parse a provider body into a rate table; a body without rates is an error.
pub fn parse_rates(text: &str) -> Result<RateTable> {
    let response: RatesResponse =
        serde_json::from_str(text).context("Failed to parse exchange rate response")?;

    let table = RateTable::new(response.rates);
    if table.is_empty() {
        anyhow::bail!("Exchange rate response contained no rates");
    }

    Ok(table)
}
