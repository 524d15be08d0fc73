// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    /// BCP 47 tag used when formatting amounts in this currency
    pub locale: &'static str,
}

pub const SUPPORTED_CURRENCIES: [CurrencyInfo; 7] = [
    CurrencyInfo { code: "USD", symbol: "$", name: "US Dollar", locale: "en-US" },
    CurrencyInfo { code: "INR", symbol: "₹", name: "Indian Rupee", locale: "en-IN" },
    CurrencyInfo { code: "EUR", symbol: "€", name: "Euro", locale: "de-DE" },
    CurrencyInfo { code: "GBP", symbol: "£", name: "British Pound", locale: "en-GB" },
    CurrencyInfo { code: "CAD", symbol: "C$", name: "Canadian Dollar", locale: "en-CA" },
    CurrencyInfo { code: "AUD", symbol: "A$", name: "Australian Dollar", locale: "en-AU" },
    CurrencyInfo { code: "JPY", symbol: "¥", name: "Japanese Yen", locale: "ja-JP" },
];

/// All supported currencies in display order
pub fn supported_currencies() -> &'static [CurrencyInfo] {
    &SUPPORTED_CURRENCIES
}

/// Look up a currency by its ISO code
pub fn currency_info(code: &str) -> Option<&'static CurrencyInfo> {
    SUPPORTED_CURRENCIES.iter().find(|c| c.code == code)
}

pub fn is_supported(code: &str) -> bool {
    currency_info(code).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_contents() {
        let codes: Vec<&str> = supported_currencies().iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["USD", "INR", "EUR", "GBP", "CAD", "AUD", "JPY"]);

        let unique: HashSet<&str> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_currency_lookup() {
        let inr = currency_info("INR").unwrap();
        assert_eq!(inr.symbol, "₹");
        assert_eq!(inr.name, "Indian Rupee");
        assert_eq!(inr.locale, "en-IN");

        let eur = currency_info("EUR").unwrap();
        assert_eq!(eur.locale, "de-DE");

        assert!(currency_info("ZZZ").is_none());
        // Codes are case-sensitive
        assert!(currency_info("usd").is_none());
        assert!(is_supported("JPY"));
        assert!(!is_supported("CHF"));
    }
}
