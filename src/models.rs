// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Body returned by the exchange rate provider for `/latest/{base}`
#[derive(Debug, Deserialize)]
pub struct RatesResponse {
    pub base: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBreakdownIngredient {
    pub name: String,
    #[serde(default)]
    pub amount: Option<Value>,
    /// US cents
    pub price: f64,
}

/// Cost of a recipe as reported by the recipe API. All prices are in US cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBreakdown {
    #[serde(default)]
    pub ingredients: Vec<PriceBreakdownIngredient>,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    #[serde(rename = "totalCostPerServing")]
    pub total_cost_per_serving: f64,
}

impl PriceBreakdown {
    pub fn total_cost_usd(&self) -> f64 {
        cents_to_usd(self.total_cost)
    }

    pub fn per_serving_usd(&self) -> f64 {
        cents_to_usd(self.total_cost_per_serving)
    }
}

pub fn cents_to_usd(cents: f64) -> f64 {
    cents / 100.0
}
