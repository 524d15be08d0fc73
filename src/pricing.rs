// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

use crate::api::ExchangeRateApiClient;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::exchange_rates::{ExchangeRateCache, RateTable, BASE_CURRENCY};
use crate::format::format_price;
use crate::preferences::{CurrencyPreference, TomlFileStorage};

/// Rough price band for an amount in Indian Rupees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceTier {
    BudgetFriendly,
    Moderate,
    Premium,
    Luxury,
}

impl PriceTier {
    pub fn label(&self) -> &'static str {
        match self {
            PriceTier::BudgetFriendly => "Budget-friendly",
            PriceTier::Moderate => "Moderate",
            PriceTier::Premium => "Premium",
            PriceTier::Luxury => "Luxury",
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify an INR amount. The thresholds are calibrated for rupees only.
pub fn local_pricing_context(amount_inr: f64) -> PriceTier {
    if amount_inr <= 200.0 {
        PriceTier::BudgetFriendly
    } else if amount_inr <= 500.0 {
        PriceTier::Moderate
    } else if amount_inr <= 1000.0 {
        PriceTier::Premium
    } else {
        PriceTier::Luxury
    }
}

/// Convert a USD amount with a given rate table.
///
/// A missing rate leaves the amount unconverted.
pub fn convert_with_rates(amount_usd: f64, target: &str, rates: &RateTable) -> f64 {
    if target == BASE_CURRENCY {
        return amount_usd;
    }

    match rates.rate(target) {
        Some(rate) => amount_usd * rate,
        None => {
            warn!("No exchange rate for {}, showing unconverted amount", target);
            amount_usd
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceDisplay {
    pub currency: String,
    pub amount: f64,
    pub formatted: String,
    /// Only set for INR
    pub tier: Option<PriceTier>,
}

/// Conversion, formatting and preference handling for displaying USD prices
pub struct CurrencyService {
    rates: ExchangeRateCache,
    preference: CurrencyPreference,
}

impl CurrencyService {
    pub fn new(rates: ExchangeRateCache, preference: CurrencyPreference) -> Self {
        Self { rates, preference }
    }

    /// Wire up the live rate provider, the system clock and file-backed preferences
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = ExchangeRateApiClient::new(&config.exchange_rate_api_url, config.request_timeout())?;
        let rates = ExchangeRateCache::new(Arc::new(provider), Arc::new(SystemClock), config.rate_cache_ttl())
            .with_fallback_caching(config.cache_fallback_rates);
        let storage = TomlFileStorage::new(&config.preferences_path);
        let preference = CurrencyPreference::new(Arc::new(storage), config.default_currency.clone());
        Ok(Self::new(rates, preference))
    }

    pub fn rate_cache(&self) -> &ExchangeRateCache {
        &self.rates
    }

    pub async fn get_exchange_rates(&self) -> Arc<RateTable> {
        self.rates.get_exchange_rates().await
    }

    pub async fn convert_price(&self, amount_usd: f64, target: &str) -> f64 {
        if target == BASE_CURRENCY {
            return amount_usd;
        }
        let rates = self.rates.get_exchange_rates().await;
        convert_with_rates(amount_usd, target, &rates)
    }

    pub fn format_price(&self, amount: f64, code: &str) -> String {
        format_price(amount, code)
    }

    pub async fn convert_and_format_price(&self, amount_usd: f64, target: &str) -> String {
        let converted = self.convert_price(amount_usd, target).await;
        format_price(converted, target)
    }

    /// Price tier for a USD amount when shown in `currency`; `None` unless it is INR
    pub async fn price_context(&self, amount_usd: f64, currency: &str) -> Option<PriceTier> {
        if currency != "INR" {
            return None;
        }
        let amount_inr = self.convert_price(amount_usd, "INR").await;
        Some(local_pricing_context(amount_inr))
    }

    /// Everything needed to show a USD price in `currency`
    pub async fn price_display(&self, amount_usd: f64, currency: &str) -> PriceDisplay {
        let amount = self.convert_price(amount_usd, currency).await;
        let tier = if currency == "INR" {
            Some(local_pricing_context(amount))
        } else {
            None
        };
        PriceDisplay {
            currency: currency.to_string(),
            amount,
            formatted: format_price(amount, currency),
            tier,
        }
    }

    pub fn user_currency(&self) -> String {
        self.preference.get_user_currency()
    }

    pub fn set_user_currency(&self, code: &str) -> Result<()> {
        self.preference.set_user_currency(code)
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.preference.subscribe()
    }
}
