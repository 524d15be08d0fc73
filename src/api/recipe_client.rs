// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::models::PriceBreakdown;

pub type Params<'a> = [(&'a str, &'a str)];

/// Thin client for the recipe backend mounted at `{backend}/api/recipes`.
///
/// Responses are returned as the provider shaped them. Errors are surfaced to
/// the caller, unlike the currency layer which degrades silently.
#[derive(Clone)]
pub struct RecipeClient {
    client: Client,
    base_url: String,
}

impl RecipeClient {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("{}/api/recipes", backend_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Value> {
        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let text = response.text().await.context("Failed to get response text")?;
        debug!("{} responded with {}", path, status);

        if !status.is_success() {
            anyhow::bail!("API error: {} - {}", status, text);
        }

        serde_json::from_str(&text).with_context(|| format!("Failed to parse response from {}", path))
    }

    async fn get(&self, path: &str, params: &Params<'_>) -> Result<Value> {
        let request = self.client.get(self.endpoint(path)).query(params);
        self.send(request, path).await
    }

    pub async fn search_recipes(&self, params: &Params<'_>) -> Result<Value> {
        self.get("search", params).await
    }

    pub async fn random_recipes(&self, params: &Params<'_>) -> Result<Value> {
        self.get("random", params).await
    }

    pub async fn find_by_ingredients(&self, params: &Params<'_>) -> Result<Value> {
        self.get("find-by-ingredients", params).await
    }

    pub async fn search_food_videos(&self, params: &Params<'_>) -> Result<Value> {
        self.get("videos", params).await
    }

    pub async fn recipe(&self, id: u64) -> Result<Value> {
        self.get(&id.to_string(), &[]).await
    }

    pub async fn similar_recipes(&self, id: u64, params: &Params<'_>) -> Result<Value> {
        self.get(&format!("{}/similar", id), params).await
    }

    pub async fn recipe_nutrition(&self, id: u64) -> Result<Value> {
        self.get(&format!("{}/nutrition", id), &[]).await
    }

    pub async fn recipe_price_breakdown(&self, id: u64) -> Result<PriceBreakdown> {
        let body = self.get(&format!("{}/price-breakdown", id), &[]).await?;
        parse_price_breakdown(body)
    }

    pub async fn recipe_instructions(&self, id: u64) -> Result<Value> {
        self.get(&format!("{}/instructions", id), &[]).await
    }

    pub async fn generate_meal_plan(&self, params: &Params<'_>) -> Result<Value> {
        self.get("meal-plan/generate", params).await
    }

    pub async fn wine_pairing(&self, params: &Params<'_>) -> Result<Value> {
        self.get("wine/pairing", params).await
    }

    pub async fn analyze_nutrition(&self, body: &Value) -> Result<Value> {
        let path = "analyze-nutrition";
        let request = self.client.post(self.endpoint(path)).json(body);
        self.send(request, path).await
    }
}

/// The backend wraps most payloads as `{"success": true, "data": ...}`
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

pub fn parse_price_breakdown(body: Value) -> Result<PriceBreakdown> {
    serde_json::from_value(unwrap_data(body)).context("Failed to parse price breakdown")
}
