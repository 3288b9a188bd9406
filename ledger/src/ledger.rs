//! Multi-currency amount ledger.

use std::collections::HashMap;
use std::sync::Arc;

use tcurrency_common::{catalog, format_amount, parse_amount, CurrencyCode};
use tcurrency_fx::{ConversionEngine, RateTable};
use tracing::debug;

use crate::snapshot::{LedgerRow, LedgerSnapshot};

/// Displayed amount for every selected currency.
///
/// The active currency holds exactly what the user typed, partial input such
/// as `"12."` included. Every other amount is derived from it through the
/// current rate table and formatted to the configured decimal places.
#[derive(Debug, Clone)]
pub struct MultiCurrencyLedger {
    currencies: Vec<CurrencyCode>,
    amounts: HashMap<CurrencyCode, String>,
    active: Option<CurrencyCode>,
    rate_table: Option<Arc<RateTable>>,
    decimal_places: u32,
}

impl MultiCurrencyLedger {
    /// Create an empty ledger.
    pub fn new(decimal_places: u32) -> Self {
        Self {
            currencies: Vec::new(),
            amounts: HashMap::new(),
            active: None,
            rate_table: None,
            decimal_places,
        }
    }

    /// Reinitialize for a new currency sequence.
    ///
    /// The first currency gets `default_amount` and becomes active; the rest
    /// read 0 until the next edit or recompute.
    pub fn reset(&mut self, currencies: &[CurrencyCode], default_amount: f64) {
        self.currencies = currencies.to_vec();
        self.amounts = currencies
            .iter()
            .enumerate()
            .map(|(i, code)| {
                let text = if i == 0 {
                    default_amount.to_string()
                } else {
                    "0".to_string()
                };
                (code.clone(), text)
            })
            .collect();
        self.active = currencies.first().cloned();

        debug!(currencies = currencies.len(), active = ?self.active, "Ledger reset");
    }

    /// Record `raw_text` for `currency` and rederive every other amount.
    ///
    /// Returns `false` without touching anything when no rate table is loaded
    /// yet or `currency` is not on the ledger.
    pub fn set_amount(&mut self, currency: &CurrencyCode, raw_text: &str) -> bool {
        let Some(table) = self.rate_table.clone() else {
            debug!(currency = %currency, "No rate table loaded; edit ignored");
            return false;
        };
        if !self.amounts.contains_key(currency) {
            debug!(currency = %currency, "Currency not on ledger; edit ignored");
            return false;
        }

        let value = parse_amount(raw_text);
        self.active = Some(currency.clone());
        self.amounts.insert(currency.clone(), raw_text.to_string());

        let targets: Vec<CurrencyCode> = self
            .currencies
            .iter()
            .filter(|c| *c != currency)
            .cloned()
            .collect();

        for converted in ConversionEngine::convert_many(value, currency, &targets, &table) {
            self.amounts.insert(
                converted.currency,
                format_amount(converted.value, self.decimal_places),
            );
        }

        true
    }

    /// Rederive every amount from the active currency's current text.
    pub fn recompute(&mut self) -> bool {
        let Some(active) = self.active.clone() else {
            return false;
        };
        let text = self.amounts.get(&active).cloned().unwrap_or_default();
        self.set_amount(&active, &text)
    }

    /// Make `currency` the active one without changing any amount.
    pub fn focus(&mut self, currency: &CurrencyCode) -> bool {
        if self.amounts.contains_key(currency) {
            self.active = Some(currency.clone());
            true
        } else {
            false
        }
    }

    /// Install the table used for subsequent edits.
    pub fn set_rate_table(&mut self, table: Arc<RateTable>) {
        self.rate_table = Some(table);
    }

    pub fn rate_table(&self) -> Option<&Arc<RateTable>> {
        self.rate_table.as_ref()
    }

    /// Change display precision; takes effect on the next derivation.
    pub fn set_decimal_places(&mut self, decimal_places: u32) {
        self.decimal_places = decimal_places;
    }

    pub fn decimal_places(&self) -> u32 {
        self.decimal_places
    }

    pub fn active(&self) -> Option<&CurrencyCode> {
        self.active.as_ref()
    }

    pub fn amount(&self, currency: &CurrencyCode) -> Option<&str> {
        self.amounts.get(currency).map(String::as_str)
    }

    pub fn currencies(&self) -> &[CurrencyCode] {
        &self.currencies
    }

    /// Read-only view in display order.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let rows = self
            .currencies
            .iter()
            .map(|code| LedgerRow {
                currency: code.clone(),
                amount: self.amounts.get(code).cloned().unwrap_or_default(),
                active: self.active.as_ref() == Some(code),
                descriptor: catalog::describe(code),
            })
            .collect();

        LedgerSnapshot {
            rows,
            active: self.active.clone(),
            base: self.rate_table.as_ref().map(|t| t.base.clone()),
            last_update: None,
            loading: false,
            data_unavailable: false,
        }
    }
}
