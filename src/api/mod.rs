// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

pub mod exchange_rate_client;
pub mod recipe_client;

pub use exchange_rate_client::ExchangeRateApiClient;
pub use recipe_client::RecipeClient;
