// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::clock::Clock;
use crate::currencies::{currency_info, supported_currencies};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use csv::Writer;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const BASE_CURRENCY: &str = "USD";

/// Multipliers relative to the base currency: 1 USD = `rate(code)` units of `code`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Codes with supported currencies first (registry order), then the rest alphabetically.
    pub fn ordered_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = supported_currencies()
            .iter()
            .map(|c| c.code)
            .filter(|code| self.rates.contains_key(*code))
            .collect();
        let mut others: Vec<&str> = self
            .rates
            .keys()
            .map(String::as_str)
            .filter(|code| currency_info(code).is_none())
            .collect();
        others.sort_unstable();
        codes.extend(others);
        codes
    }
}

impl FromIterator<(String, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Approximate rates served when the provider cannot be reached
pub fn fallback_rates() -> RateTable {
    [
        ("USD", 1.0),
        ("INR", 83.12),
        ("EUR", 0.85),
        ("GBP", 0.73),
        ("CAD", 1.25),
        ("AUD", 1.35),
        ("JPY", 110.50),
    ]
    .into_iter()
    .map(|(code, rate)| (code.to_string(), rate))
    .collect()
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self, base: &str) -> Result<RateTable>;
}

#[derive(Debug, Clone)]
struct CachedRates {
    table: Arc<RateTable>,
    fetched_at: DateTime<Utc>,
}

impl CachedRates {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.fetched_at).to_std() {
            Ok(age) => age < ttl,
            // Clock went backwards; the entry is younger than anything we could measure
            Err(_) => true,
        }
    }
}

/// Exchange rates cached for a fixed time-to-live.
///
/// A refresh holds the cache lock, so callers that find the cache expired
/// while a fetch is in flight wait for that fetch instead of starting their own.
pub struct ExchangeRateCache {
    provider: Arc<dyn RateProvider>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    cache_fallback: bool,
    state: Mutex<Option<CachedRates>>,
}

impl ExchangeRateCache {
    pub fn new(provider: Arc<dyn RateProvider>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            provider,
            clock,
            ttl,
            cache_fallback: false,
            state: Mutex::new(None),
        }
    }

    /// Keep the fallback table for a full TTL after a failed fetch instead of
    /// retrying on the next call.
    pub fn with_fallback_caching(mut self, enabled: bool) -> Self {
        self.cache_fallback = enabled;
        self
    }

    /// Current rate table. Never fails: provider errors yield [`fallback_rates`].
    pub async fn get_exchange_rates(&self) -> Arc<RateTable> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        if let Some(cached) = state.as_ref() {
            if cached.is_fresh(now, self.ttl) {
                debug!("Serving cached exchange rates from {}", cached.fetched_at);
                return Arc::clone(&cached.table);
            }
        }

        match self.provider.fetch_rates(BASE_CURRENCY).await {
            Ok(table) => {
                info!("Fetched {} exchange rates for base {}", table.len(), BASE_CURRENCY);
                let table = Arc::new(table);
                *state = Some(CachedRates {
                    table: Arc::clone(&table),
                    fetched_at: now,
                });
                table
            }
            Err(e) => {
                warn!("Failed to fetch exchange rates, using fallback rates: {:#}", e);
                let table = Arc::new(fallback_rates());
                if self.cache_fallback {
                    *state = Some(CachedRates {
                        table: Arc::clone(&table),
                        fetched_at: now,
                    });
                }
                table
            }
        }
    }

    /// When the cached table was fetched, if there is one.
    pub async fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.as_ref().map(|c| c.fetched_at)
    }

    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }
}

/// Export a rate table to `exchange_rates_<timestamp>.csv` in `output_dir`
pub fn export_rates_csv(table: &RateTable, base: &str, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let timestamp = Local::now();
    let csv_path = output_dir.join(format!(
        "exchange_rates_{}.csv",
        timestamp.format("%Y%m%d_%H%M%S")
    ));
    let mut writer = Writer::from_path(&csv_path)?;

    writer.write_record(["Currency", "Name", "Rate", "Base Currency", "Timestamp"])?;

    let unix_timestamp = timestamp.timestamp().to_string();
    for code in table.ordered_codes() {
        let name = currency_info(code).map(|c| c.name).unwrap_or("");
        let rate = table.rate(code).map(|r| r.to_string()).unwrap_or_default();
        writer.write_record([code, name, rate.as_str(), base, unix_timestamp.as_str()])?;
    }

    writer.flush()?;
    Ok(csv_path)
}
