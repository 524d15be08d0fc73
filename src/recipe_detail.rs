// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use futures::future::join_all;
use serde_json::Value;
use tracing::warn;

use crate::api::recipe_client::unwrap_data;
use crate::api::RecipeClient;
use crate::models::{cents_to_usd, PriceBreakdown};
use crate::pricing::CurrencyService;

const SIMILAR_RECIPES: &str = "6";
const NUTRITION_FIELDS: [(&str, &str); 4] = [
    ("calories", "Calories"),
    ("carbs", "Carbs"),
    ("fat", "Fat"),
    ("protein", "Protein"),
];

/// A recipe plus the sections loaded alongside it. Each section may fail on its own.
#[derive(Debug)]
pub struct RecipeDetail {
    pub id: u64,
    pub recipe: Value,
    pub nutrition: Result<Value>,
    pub price_breakdown: Result<PriceBreakdown>,
    pub instructions: Result<Value>,
    pub similar: Result<Value>,
}

/// Fetch the recipe, then its nutrition, price breakdown, instructions and
/// similar recipes concurrently. Only a failure of the recipe itself is an error.
pub async fn load_recipe_detail(client: &RecipeClient, id: u64) -> Result<RecipeDetail> {
    let recipe = unwrap_data(client.recipe(id).await?);

    let similar_params = [("number", SIMILAR_RECIPES)];
    let (nutrition, price_breakdown, instructions, similar) = tokio::join!(
        client.recipe_nutrition(id),
        client.recipe_price_breakdown(id),
        client.recipe_instructions(id),
        client.similar_recipes(id, &similar_params),
    );

    for (section, failed) in [
        ("nutrition", nutrition.is_err()),
        ("price breakdown", price_breakdown.is_err()),
        ("instructions", instructions.is_err()),
        ("similar recipes", similar.is_err()),
    ] {
        if failed {
            warn!("Could not load {} for recipe {}", section, id);
        }
    }

    Ok(RecipeDetail {
        id,
        recipe,
        nutrition: nutrition.map(unwrap_data),
        price_breakdown,
        instructions: instructions.map(unwrap_data),
        similar: similar.map(unwrap_data),
    })
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn nutrition_lines(nutrition: &Value) -> Vec<String> {
    let lines: Vec<String> = NUTRITION_FIELDS
        .iter()
        .filter_map(|(key, label)| nutrition.get(*key).and_then(text).map(|v| format!("  {}: {}", label, v)))
        .collect();
    if lines.is_empty() {
        vec!["  No nutrition data".to_string()]
    } else {
        lines
    }
}

fn instruction_lines(instructions: &Value) -> Vec<String> {
    let groups: &[Value] = match instructions {
        Value::Array(groups) => groups.as_slice(),
        _ => &[],
    };

    let mut lines = Vec::new();
    for group in groups {
        if let Some(name) = group.get("name").and_then(Value::as_str).filter(|n| !n.is_empty()) {
            lines.push(format!("  {}", name));
        }
        for (i, step) in group.get("steps").and_then(Value::as_array).into_iter().flatten().enumerate() {
            let number = step.get("number").and_then(Value::as_u64).unwrap_or(i as u64 + 1);
            let description = step.get("step").and_then(Value::as_str).unwrap_or_default();
            lines.push(format!("  {}. {}", number, description));
        }
    }
    if lines.is_empty() {
        lines.push("  No instructions".to_string());
    }
    lines
}

fn similar_lines(similar: &Value) -> Vec<String> {
    let recipes = similar.as_array().map(Vec::as_slice).unwrap_or_default();
    if recipes.is_empty() {
        return vec!["  No similar recipes".to_string()];
    }
    recipes
        .iter()
        .map(|r| {
            let id = r.get("id").and_then(Value::as_u64).unwrap_or_default();
            let title = r.get("title").and_then(Value::as_str).unwrap_or("Untitled recipe");
            format!("  #{:<8} {}", id, title)
        })
        .collect()
}

async fn cost_lines(service: &CurrencyService, breakdown: &PriceBreakdown, currency: &str) -> Vec<String> {
    let total = service.price_display(breakdown.total_cost_usd(), currency).await;
    let per_serving = service.price_display(breakdown.per_serving_usd(), currency).await;

    let mut lines = vec![format!("  Total:       {}", total.formatted)];
    lines.push(match per_serving.tier {
        Some(tier) => format!("  Per serving: {} ({})", per_serving.formatted, tier),
        None => format!("  Per serving: {}", per_serving.formatted),
    });

    let ingredient_prices = join_all(
        breakdown
            .ingredients
            .iter()
            .map(|i| service.convert_and_format_price(cents_to_usd(i.price), currency)),
    )
    .await;
    for (ingredient, price) in breakdown.ingredients.iter().zip(ingredient_prices) {
        lines.push(format!("    {:<30} {}", ingredient.name, price));
    }
    lines
}

fn section<T>(
    lines: &mut Vec<String>,
    heading: &str,
    result: &Result<T>,
    render: impl FnOnce(&T) -> Vec<String>,
) {
    lines.push(String::new());
    match result {
        Ok(value) => {
            lines.push(format!("{}:", heading));
            lines.extend(render(value));
        }
        Err(e) => lines.push(format!("{} unavailable: {:#}", heading, e)),
    }
}

/// Text view of a recipe with prices in `currency`
pub async fn render_recipe_detail(service: &CurrencyService, detail: &RecipeDetail, currency: &str) -> String {
    let recipe = &detail.recipe;
    let title = recipe.get("title").and_then(Value::as_str).unwrap_or("Untitled recipe");

    let mut lines = vec![format!("{} (#{})", title, detail.id)];
    if let Some(minutes) = recipe.get("readyInMinutes").and_then(Value::as_u64) {
        lines.push(format!("  Ready in {} minutes", minutes));
    }
    if let Some(servings) = recipe.get("servings").and_then(Value::as_u64) {
        lines.push(format!("  Serves {}", servings));
    }

    lines.push(String::new());
    match &detail.price_breakdown {
        Ok(breakdown) => {
            lines.push("Cost:".to_string());
            lines.extend(cost_lines(service, breakdown, currency).await);
        }
        Err(e) => lines.push(format!("Cost unavailable: {:#}", e)),
    }

    section(&mut lines, "Nutrition", &detail.nutrition, nutrition_lines);
    section(&mut lines, "Instructions", &detail.instructions, instruction_lines);
    section(&mut lines, "Similar recipes", &detail.similar, similar_lines);

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::recipe_client::parse_price_breakdown;
    use crate::clock::ManualClock;
    use crate::exchange_rates::{ExchangeRateCache, MockRateProvider, RateTable};
    use crate::preferences::{CurrencyPreference, MemoryStorage, DEFAULT_CURRENCY};
    use crate::test_support::{serve_json, Route};
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn service() -> CurrencyService {
        let mut provider = MockRateProvider::new();
        provider.expect_fetch_rates().returning(|_| {
            Ok([("USD".to_string(), 1.0), ("INR".to_string(), 80.0)].into_iter().collect::<RateTable>())
        });
        let cache = ExchangeRateCache::new(
            Arc::new(provider),
            Arc::new(ManualClock::new(Utc::now())),
            Duration::from_secs(3600),
        );
        let preference = CurrencyPreference::new(Arc::new(MemoryStorage::new()), DEFAULT_CURRENCY);
        CurrencyService::new(cache, preference)
    }

    fn breakdown_json() -> Value {
        json!({
            "ingredients": [
                {"name": "basmati rice", "price": 150.0},
                {"name": "paneer", "price": 350.0}
            ],
            "totalCost": 500.0,
            "totalCostPerServing": 125.0
        })
    }

    fn full_detail() -> RecipeDetail {
        RecipeDetail {
            id: 716429,
            recipe: json!({"title": "Paneer Pulao", "readyInMinutes": 45, "servings": 4}),
            nutrition: Ok(json!({"calories": "520", "carbs": "61g", "fat": "22g", "protein": 18})),
            price_breakdown: parse_price_breakdown(breakdown_json()),
            instructions: Ok(json!([
                {"name": "", "steps": [
                    {"number": 1, "step": "Rinse the rice."},
                    {"number": 2, "step": "Fry the paneer."}
                ]}
            ])),
            similar: Ok(json!([{"id": 1001, "title": "Veg Biryani"}])),
        }
    }

    #[tokio::test]
    async fn test_render_full_recipe() {
        let view = render_recipe_detail(&service(), &full_detail(), "INR").await;

        assert!(view.starts_with("Paneer Pulao (#716429)\n"));
        assert!(view.contains("  Ready in 45 minutes"));
        assert!(view.contains("  Serves 4"));
        // 5 USD total, 1.25 USD per serving at 80 INR/USD
        assert!(view.contains("  Total:       ₹400"));
        assert!(view.contains("  Per serving: ₹100 (Budget-friendly)"));
        assert!(view.contains("basmati rice"));
        assert!(view.contains("₹120"));
        assert!(view.contains("  Calories: 520"));
        assert!(view.contains("  Protein: 18"));
        assert!(view.contains("  1. Rinse the rice."));
        assert!(view.contains("  2. Fry the paneer."));
        assert!(view.contains("Veg Biryani"));
        assert!(!view.contains("unavailable"));
    }

    #[tokio::test]
    async fn test_failed_sections_do_not_hide_the_rest() {
        let mut detail = full_detail();
        detail.nutrition = Err(anyhow::anyhow!("API error: 500 Internal Server Error"));
        detail.similar = Err(anyhow::anyhow!("timed out"));

        let view = render_recipe_detail(&service(), &detail, "USD").await;
        assert!(view.contains("Nutrition unavailable: API error: 500"));
        assert!(view.contains("Similar recipes unavailable: timed out"));
        assert!(view.contains("  Per serving: $1.25\n"));
        assert!(view.contains("  1. Rinse the rice."));
    }

    #[tokio::test]
    async fn test_render_empty_sections() {
        let mut detail = full_detail();
        detail.recipe = json!({});
        detail.nutrition = Ok(json!({}));
        detail.instructions = Ok(json!([]));
        detail.similar = Ok(json!([]));
        detail.price_breakdown = Err(anyhow::anyhow!("API error: 402 Payment Required"));

        let view = render_recipe_detail(&service(), &detail, "EUR").await;
        assert!(view.starts_with("Untitled recipe (#716429)"));
        assert!(view.contains("Cost unavailable: API error: 402"));
        assert!(view.contains("  No nutrition data"));
        assert!(view.contains("  No instructions"));
        assert!(view.contains("  No similar recipes"));
    }

    #[tokio::test]
    async fn test_load_recipe_detail_over_http() -> Result<()> {
        let server = serve_json(vec![
            Route::new("/api/recipes/42", 200, r#"{"success":true,"data":{"title":"Dal Tadka","servings":2}}"#),
            Route::new("/api/recipes/42/nutrition", 500, r#"{"error":"upstream failed"}"#),
            Route::new("/api/recipes/42/price-breakdown", 200, breakdown_json().to_string()),
            Route::new(
                "/api/recipes/42/instructions",
                200,
                r#"{"data":[{"name":"","steps":[{"number":1,"step":"Boil the lentils."}]}]}"#,
            ),
            Route::new("/api/recipes/42/similar", 200, r#"{"data":[{"id":7,"title":"Chana Masala"}]}"#),
        ])
        .await;
        let client = RecipeClient::new(&server, Duration::from_secs(5))?;

        let detail = load_recipe_detail(&client, 42).await?;
        assert_eq!(detail.recipe["title"], "Dal Tadka");
        assert!(detail.nutrition.is_err());
        assert_eq!(detail.price_breakdown.as_ref().map(|b| b.ingredients.len()).ok(), Some(2));
        assert_eq!(detail.instructions.as_ref().ok().map(|v| v[0]["steps"][0]["number"].clone()), Some(json!(1)));
        assert_eq!(detail.similar.as_ref().ok().map(|v| v[0]["title"].clone()), Some(json!("Chana Masala")));

        let view = render_recipe_detail(&service(), &detail, "USD").await;
        assert!(view.contains("Nutrition unavailable"));
        assert!(view.contains("Chana Masala"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_recipe_is_an_error() -> Result<()> {
        let server = serve_json(vec![Route::new("/api/recipes/42/nutrition", 200, "{}")]).await;
        let client = RecipeClient::new(&server, Duration::from_secs(5))?;
        assert!(load_recipe_detail(&client, 99).await.is_err());
        Ok(())
    }
}
