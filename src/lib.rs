// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

pub mod api;
pub mod clock;
pub mod config;
pub mod currencies;
pub mod exchange_rates;
pub mod format;
pub mod models;
pub mod preferences;
pub mod pricing;
pub mod recipe_detail;

pub use currencies::{currency_info, supported_currencies, CurrencyInfo};
pub use exchange_rates::{fallback_rates, ExchangeRateCache, RateProvider, RateTable};
pub use format::format_price;
pub use pricing::{local_pricing_context, CurrencyService, PriceDisplay, PriceTier};

#[cfg(test)]
mod test_support;
