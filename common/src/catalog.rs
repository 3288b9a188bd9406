//! Static currency metadata.
//!
//! The converter core only keys rate tables and ledgers by [`CurrencyCode`];
//! this catalog supplies the display name, symbol and flag used when rows are
//! rendered, plus the search and grouping used by the currency picker.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::currency::CurrencyCode;

/// Catalog entry for a supported currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub flag: &'static str,
    pub country: &'static str,
}

const fn entry(
    code: &'static str,
    name: &'static str,
    symbol: &'static str,
    flag: &'static str,
    country: &'static str,
) -> CurrencyInfo {
    CurrencyInfo {
        code,
        name,
        symbol,
        flag,
        country,
    }
}

/// All currencies the picker offers.
pub const CURRENCIES: &[CurrencyInfo] = &[
    entry("TWD", "New Taiwan Dollar", "NT$", "🇹🇼", "Taiwan"),
    entry("USD", "US Dollar", "$", "🇺🇸", "United States"),
    entry("EUR", "Euro", "€", "🇪🇺", "European Union"),
    entry("JPY", "Japanese Yen", "¥", "🇯🇵", "Japan"),
    entry("GBP", "British Pound", "£", "🇬🇧", "United Kingdom"),
    entry("KRW", "South Korean Won", "₩", "🇰🇷", "South Korea"),
    entry("CNY", "Chinese Yuan", "¥", "🇨🇳", "China"),
    entry("HKD", "Hong Kong Dollar", "HK$", "🇭🇰", "Hong Kong"),
    entry("SGD", "Singapore Dollar", "S$", "🇸🇬", "Singapore"),
    entry("AUD", "Australian Dollar", "A$", "🇦🇺", "Australia"),
    entry("CAD", "Canadian Dollar", "C$", "🇨🇦", "Canada"),
    entry("CHF", "Swiss Franc", "CHF", "🇨🇭", "Switzerland"),
    entry("NZD", "New Zealand Dollar", "NZ$", "🇳🇿", "New Zealand"),
    entry("THB", "Thai Baht", "฿", "🇹🇭", "Thailand"),
    entry("MYR", "Malaysian Ringgit", "RM", "🇲🇾", "Malaysia"),
    entry("VND", "Vietnamese Dong", "₫", "🇻🇳", "Vietnam"),
    entry("PHP", "Philippine Peso", "₱", "🇵🇭", "Philippines"),
    entry("IDR", "Indonesian Rupiah", "Rp", "🇮🇩", "Indonesia"),
    entry("INR", "Indian Rupee", "₹", "🇮🇳", "India"),
];

/// Codes pinned at the top of the picker. Codes missing from the catalog are skipped.
pub const FAVORITE_CODES: &[&str] = &["ETH", "MATIC", "KRW", "TWD", "CNY", "USD", "JPY", "EUR"];

/// Selection used on first launch.
pub const DEFAULT_SELECTED: &[&str] = &["TWD", "KRW", "USD", "JPY", "EUR"];

/// Owned display metadata for one currency, with a fallback for unknown codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyDescriptor {
    pub code: CurrencyCode,
    pub name: String,
    pub symbol: String,
    pub flag: String,
}

impl From<&CurrencyInfo> for CurrencyDescriptor {
    fn from(info: &CurrencyInfo) -> Self {
        Self {
            code: CurrencyCode::new(info.code),
            name: info.name.to_string(),
            symbol: info.symbol.to_string(),
            flag: info.flag.to_string(),
        }
    }
}

/// Find a catalog entry by code.
pub fn find(code: &CurrencyCode) -> Option<&'static CurrencyInfo> {
    CURRENCIES.iter().find(|c| c.code == code.code())
}

/// Describe a currency, falling back to the bare code when it is not cataloged.
pub fn describe(code: &CurrencyCode) -> CurrencyDescriptor {
    match find(code) {
        Some(info) => info.into(),
        None => CurrencyDescriptor {
            code: code.clone(),
            name: code.code().to_string(),
            symbol: String::new(),
            flag: String::new(),
        },
    }
}

/// Case-insensitive search over code, name and country.
pub fn search(query: &str) -> Vec<&'static CurrencyInfo> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return CURRENCIES.iter().collect();
    }

    CURRENCIES
        .iter()
        .filter(|c| {
            c.code.to_lowercase().contains(&query)
                || c.name.to_lowercase().contains(&query)
                || c.country.to_lowercase().contains(&query)
        })
        .collect()
}

/// Favorite currencies present in the catalog, in pinned order.
pub fn favorites() -> Vec<&'static CurrencyInfo> {
    FAVORITE_CODES
        .iter()
        .filter_map(|code| CURRENCIES.iter().find(|c| c.code == *code))
        .collect()
}

/// The default selection as currency codes.
pub fn default_selection() -> Vec<CurrencyCode> {
    DEFAULT_SELECTED.iter().map(|c| CurrencyCode::new(*c)).collect()
}

/// Group entries by the first letter of their code, alphabetically.
pub fn grouped_by_initial(
    entries: &[&'static CurrencyInfo],
) -> BTreeMap<char, Vec<&'static CurrencyInfo>> {
    let mut groups: BTreeMap<char, Vec<&'static CurrencyInfo>> = BTreeMap::new();
    for info in entries {
        if let Some(initial) = info.code.chars().next() {
            groups
                .entry(initial.to_ascii_uppercase())
                .or_default()
                .push(info);
        }
    }
    groups
}
