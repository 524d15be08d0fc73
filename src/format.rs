// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use num_format::{CustomFormat, Grouping, ToFormattedString};
use thiserror::Error;
use tracing::debug;

use crate::currencies::{currency_info, CurrencyInfo};

// Largest cent count an f64 holds exactly
const MAX_CENTS: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("no number format known for locale {0}")]
    UnknownLocale(String),
    #[error("cannot format non-finite amount {0}")]
    NonFinite(f64),
    #[error("amount {0} is too large to format")]
    OutOfRange(f64),
    #[error(transparent)]
    NumberFormat(#[from] num_format::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolPosition {
    Prefix,
    Suffix,
}

#[derive(Debug)]
struct LocaleStyle {
    grouping: Grouping,
    separator: &'static str,
    decimal: &'static str,
    position: SymbolPosition,
}

fn locale_style(tag: &str) -> Option<LocaleStyle> {
    let style = match tag {
        "en-US" | "en-GB" | "en-CA" | "en-AU" | "ja-JP" => LocaleStyle {
            grouping: Grouping::Standard,
            separator: ",",
            decimal: ".",
            position: SymbolPosition::Prefix,
        },
        "en-IN" => LocaleStyle {
            grouping: Grouping::Indian,
            separator: ",",
            decimal: ".",
            position: SymbolPosition::Prefix,
        },
        "de-DE" => LocaleStyle {
            grouping: Grouping::Standard,
            separator: ".",
            decimal: ",",
            position: SymbolPosition::Suffix,
        },
        _ => return None,
    };
    Some(style)
}

/// Symbol a currency uses inside its own locale, which can differ from the
/// disambiguated registry symbol (C$, A$).
fn local_symbol(info: &CurrencyInfo) -> &'static str {
    match (info.code, info.locale) {
        ("CAD", "en-CA") | ("AUD", "en-AU") => "$",
        ("JPY", "ja-JP") => "\u{FFE5}",
        _ => info.symbol,
    }
}

/// Format `amount` as currency in the currency's locale, with up to two
/// fraction digits and trailing zeros dropped.
///
/// Amounts of more than `MAX_CENTS` cents (about 9e13 units) return `OutOfRange`, so
/// [`format_with_info`] prints them as `symbol + {:.2}` without grouping.
/// A negative amount that rounds to zero cents has no minus sign: `-0.001`
/// is `$0`, not `-$0`.
pub fn format_in_locale(amount: f64, info: &CurrencyInfo) -> Result<String, FormatError> {
    if !amount.is_finite() {
        return Err(FormatError::NonFinite(amount));
    }
    let style = locale_style(info.locale).ok_or_else(|| FormatError::UnknownLocale(info.locale.to_string()))?;

    let cents = (amount.abs() * 100.0).round();
    if cents > MAX_CENTS {
        return Err(FormatError::OutOfRange(amount));
    }
    let cents = cents as u64;
    let (units, fraction) = (cents / 100, cents % 100);

    let format = CustomFormat::builder()
        .grouping(style.grouping)
        .separator(style.separator)
        .build()?;

    let mut number = units.to_formatted_string(&format);
    if fraction != 0 {
        number.push_str(style.decimal);
        if fraction % 10 == 0 {
            number.push_str(&(fraction / 10).to_string());
        } else {
            number.push_str(&format!("{:02}", fraction));
        }
    }

    let sign = if amount < 0.0 && cents != 0 { "-" } else { "" };
    let symbol = local_symbol(info);
    Ok(match style.position {
        SymbolPosition::Prefix => format!("{}{}{}", sign, symbol, number),
        SymbolPosition::Suffix => format!("{}{}\u{a0}{}", sign, number, symbol),
    })
}

/// Format with a known currency, falling back to `symbol + amount` when the
/// locale formatter cannot handle it.
pub fn format_with_info(amount: f64, info: &CurrencyInfo) -> String {
    match format_in_locale(amount, info) {
        Ok(formatted) => formatted,
        Err(e) => {
            debug!("Locale formatting failed for {}: {}", info.code, e);
            format!("{}{:.2}", info.symbol, amount)
        }
    }
}

/// Format `amount` in `code`. Unsupported codes get a bare two-decimal number.
pub fn format_price(amount: f64, code: &str) -> String {
    match currency_info(code) {
        Some(info) => format_with_info(amount, info),
        None => format!("{:.2}", amount),
    }
}
