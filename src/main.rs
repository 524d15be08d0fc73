// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use futures::future::join_all;
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use recipe_fx::api::recipe_client::unwrap_data;
use recipe_fx::api::RecipeClient;
use recipe_fx::config::{self, Config};
use recipe_fx::currencies::{currency_info, supported_currencies};
use recipe_fx::exchange_rates::{export_rates_csv, BASE_CURRENCY};
use recipe_fx::models::cents_to_usd;
use recipe_fx::recipe_detail::{load_recipe_detail, render_recipe_detail};
use recipe_fx::CurrencyService;

const EXAMPLE_PRICES: [f64; 4] = [2.50, 5.75, 12.99, 25.00];

#[derive(Parser)]
#[command(name = "recipe-fx", version, about = "Browse recipes with prices in your own currency")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported currencies
    Currencies,
    /// Show current exchange rates
    Rates {
        /// Also write the rates to a CSV file
        #[arg(long)]
        export: bool,
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },
    /// Convert a USD amount
    Convert {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Target currency, defaults to the preferred one
        #[arg(long)]
        to: Option<String>,
    },
    /// Show the preferred currency
    GetCurrency,
    /// Change the preferred currency
    SetCurrency { code: String },
    /// Show example prices in the preferred currency
    Preview,
    /// Show a recipe with its cost, nutrition, instructions and similar recipes
    Recipe { id: u64 },
    /// Search recipes
    Search {
        query: String,
        #[arg(long, default_value_t = 12)]
        number: u32,
    },
    /// Random recipes
    Random {
        #[arg(long, default_value_t = 12)]
        number: u32,
        #[arg(long)]
        tags: Option<String>,
    },
    /// Find recipes using the given comma-separated ingredients
    Ingredients {
        ingredients: String,
        #[arg(long, default_value_t = 12)]
        number: u32,
    },
    /// Wine pairing for a dish
    Wine {
        food: String,
        #[arg(long)]
        max_price: Option<String>,
    },
    /// Generate a meal plan
    MealPlan {
        #[arg(long, default_value = "day")]
        time_frame: String,
        #[arg(long)]
        target_calories: Option<u32>,
        #[arg(long)]
        diet: Option<String>,
    },
    /// Write a config file with default values
    InitConfig {
        #[arg(default_value = "config.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("recipe_fx=info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = config::load_config()?;
    let service = CurrencyService::from_config(&config)?;

    match cli.command {
        Commands::Currencies => list_currencies(&service),
        Commands::Rates { export, output_dir } => show_rates(&service, &config, export, output_dir).await?,
        Commands::Convert { amount, to } => {
            let currency = to.unwrap_or_else(|| service.user_currency());
            let display = service.price_display(amount, &currency).await;
            match display.tier {
                Some(tier) => println!("{} ({})", display.formatted, tier),
                None => println!("{}", display.formatted),
            }
        }
        Commands::GetCurrency => println!("{}", service.user_currency()),
        Commands::SetCurrency { code } => {
            service.set_user_currency(&code)?;
            match currency_info(&code) {
                Some(info) => println!("✅ Preferred currency set to {} ({})", info.code, info.name),
                None => println!("⚠️  {} is not a supported currency, prices will show unconverted", code),
            }
        }
        Commands::Preview => preview(&service).await,
        Commands::Recipe { id } => show_recipe(&service, &recipe_client(&config)?, id).await?,
        Commands::Search { query, number } => {
            let number = number.to_string();
            let body = recipe_client(&config)?
                .search_recipes(&[("query", query.as_str()), ("number", number.as_str())])
                .await?;
            print_recipe_list(&service, &body).await;
        }
        Commands::Random { number, tags } => {
            let number = number.to_string();
            let mut params = vec![("number", number.as_str())];
            if let Some(tags) = tags.as_deref() {
                params.push(("tags", tags));
            }
            let body = recipe_client(&config)?.random_recipes(&params).await?;
            print_recipe_list(&service, &body).await;
        }
        Commands::Ingredients { ingredients, number } => {
            let number = number.to_string();
            let body = recipe_client(&config)?
                .find_by_ingredients(&[("ingredients", ingredients.as_str()), ("number", number.as_str())])
                .await?;
            print_recipe_list(&service, &body).await;
        }
        Commands::Wine { food, max_price } => {
            let mut params = vec![("food", food.as_str())];
            if let Some(max_price) = max_price.as_deref() {
                params.push(("maxPrice", max_price));
            }
            let body = recipe_client(&config)?.wine_pairing(&params).await?;
            print_wine_pairing(&unwrap_data(body));
        }
        Commands::MealPlan {
            time_frame,
            target_calories,
            diet,
        } => {
            let calories = target_calories.map(|c| c.to_string());
            let mut params = vec![("timeFrame", time_frame.as_str())];
            if let Some(calories) = calories.as_deref() {
                params.push(("targetCalories", calories));
            }
            if let Some(diet) = diet.as_deref() {
                params.push(("diet", diet));
            }
            let body = recipe_client(&config)?.generate_meal_plan(&params).await?;
            println!("{}", serde_json::to_string_pretty(&unwrap_data(body))?);
        }
        Commands::InitConfig { path } => {
            config::save_config_to(&Config::default(), &path)?;
            println!("✅ Config written to {}", path.display());
        }
    }

    Ok(())
}

fn recipe_client(config: &Config) -> Result<RecipeClient> {
    RecipeClient::new(&config.recipe_api_url, config.request_timeout())
}

fn list_currencies(service: &CurrencyService) {
    let preferred = service.user_currency();
    for info in supported_currencies() {
        let marker = if info.code == preferred { "*" } else { " " };
        println!("{} {:<4} {:<3} {:<18} {}", marker, info.code, info.symbol, info.name, info.locale);
    }
}

async fn show_rates(service: &CurrencyService, config: &Config, export: bool, output_dir: PathBuf) -> Result<()> {
    let rates = service.get_exchange_rates().await;
    match service.rate_cache().fetched_at().await {
        Some(at) => println!("Rates for 1 {} (fetched {})", BASE_CURRENCY, at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("Rates for 1 {} (approximate fallback rates)", BASE_CURRENCY),
    }
    for info in supported_currencies() {
        match rates.rate(info.code) {
            Some(rate) => println!("  {:<4} {:>12.4}", info.code, rate),
            None => println!("  {:<4} {:>12}", info.code, "n/a"),
        }
    }

    if export {
        let path = export_rates_csv(&rates, BASE_CURRENCY, &output_dir)?;
        println!("\n✅ Exchange rates written to {}", path.display());
    }
    Ok(())
}

async fn preview(service: &CurrencyService) {
    let currency = service.user_currency();
    println!("Prices in {}:", currency);
    let displays = join_all(EXAMPLE_PRICES.iter().map(|&usd| service.price_display(usd, &currency))).await;
    for (usd, display) in EXAMPLE_PRICES.iter().zip(displays) {
        let tier = display.tier.map(|t| format!("  [{}]", t)).unwrap_or_default();
        println!("  USD ${:<6} → {}{}", usd, display.formatted, tier);
    }
}

async fn show_recipe(service: &CurrencyService, client: &RecipeClient, id: u64) -> Result<()> {
    let detail = load_recipe_detail(client, id).await?;
    let currency = service.user_currency();
    print!("{}", render_recipe_detail(service, &detail, &currency).await);
    Ok(())
}

fn recipe_list(body: &Value) -> Vec<Value> {
    let data = unwrap_data(body.clone());
    match data {
        Value::Array(items) => items,
        Value::Object(mut map) => ["results", "recipes"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

async fn print_recipe_list(service: &CurrencyService, body: &Value) {
    let recipes = recipe_list(body);
    if recipes.is_empty() {
        println!("No recipes found");
        return;
    }

    let currency = service.user_currency();
    for recipe in &recipes {
        let id = recipe.get("id").and_then(Value::as_u64).unwrap_or_default();
        let title = recipe.get("title").and_then(Value::as_str).unwrap_or("Untitled recipe");
        match recipe.get("pricePerServing").and_then(Value::as_f64) {
            Some(cents) => {
                let display = service.price_display(cents_to_usd(cents), &currency).await;
                println!("{:>8}  {:<50} {}/serving", id, title, display.formatted);
            }
            None => println!("{:>8}  {}", id, title),
        }
    }
}

fn print_wine_pairing(pairing: &Value) {
    if let Some(wines) = pairing.get("pairedWines").and_then(Value::as_array) {
        let names: Vec<&str> = wines.iter().filter_map(Value::as_str).collect();
        println!("Paired wines: {}", names.join(", "));
    }
    if let Some(text) = pairing.get("pairingText").and_then(Value::as_str) {
        println!("\n{}", text);
    }
    if let Some(products) = pairing.get("productMatches").and_then(Value::as_array) {
        println!();
        for product in products {
            let title = product.get("title").and_then(Value::as_str).unwrap_or_default();
            let price = product.get("price").and_then(Value::as_str).unwrap_or_default();
            println!("  {:<50} {}", title, price);
        }
    }
}
