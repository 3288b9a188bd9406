//! Rate tables and the rate source wire format.

use std::collections::HashMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tcurrency_common::{age_at, now, CurrencyCode, Timestamp};

use crate::error::{FxError, FxResult};

/// A snapshot of rates anchored at one base currency.
///
/// `rates[code]` is the amount of `code` bought by one unit of `base`.
/// The base's own rate may be absent and is read as 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    /// Currency the rates are expressed against.
    pub base: CurrencyCode,
    /// Units of each currency per one unit of base.
    pub rates: HashMap<CurrencyCode, f64>,
    /// Publication date reported by the source, if any.
    pub date: Option<String>,
    /// When this table was fetched.
    pub fetched_at: Timestamp,
}

impl RateTable {
    /// Create a table fetched now.
    pub fn new(base: CurrencyCode, rates: HashMap<CurrencyCode, f64>) -> Self {
        Self {
            base,
            rates,
            date: None,
            fetched_at: now(),
        }
    }

    /// Build a table from `(code, rate)` pairs.
    pub fn from_pairs<I, C>(base: CurrencyCode, pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, f64)>,
        C: Into<CurrencyCode>,
    {
        let rates = pairs.into_iter().map(|(c, r)| (c.into(), r)).collect();
        Self::new(base, rates)
    }

    /// Attach the source's publication date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Rate for `code`, or 1 when the table has no entry for it.
    ///
    /// Unknown codes convert at par. This keeps the UI responsive for
    /// currencies the source does not quote, at the cost of a wrong figure.
    pub fn rate(&self, code: &CurrencyCode) -> f64 {
        self.rates.get(code).copied().unwrap_or(1.0)
    }

    /// Check whether the source quoted `code`.
    pub fn has_rate(&self, code: &CurrencyCode) -> bool {
        self.rates.contains_key(code)
    }

    /// Number of quoted currencies.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check whether the table carries no rates at all.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Age of the table at `at`.
    pub fn age_at(&self, at: Timestamp) -> Duration {
        age_at(self.fetched_at, at)
    }
}

/// Body returned by `GET <endpoint>/{base}`.
#[derive(Debug, Deserialize)]
struct RatePayload {
    base: Option<String>,
    rates: Option<HashMap<String, f64>>,
    date: Option<String>,
}

/// Decode a rate source response body into a [`RateTable`].
///
/// A body without a `rates` mapping, or with an empty one, is rejected. A
/// missing `base` falls back to the currency that was requested.
pub fn parse_rate_payload(body: &[u8], requested: &CurrencyCode) -> FxResult<RateTable> {
    let payload: RatePayload = serde_json::from_slice(body)
        .map_err(|e| FxError::InvalidResponse(format!("undecodable payload: {}", e)))?;

    let rates = payload
        .rates
        .ok_or_else(|| FxError::InvalidResponse("payload has no rates mapping".to_string()))?;
    if rates.is_empty() {
        return Err(FxError::InvalidResponse("payload carries no rates".to_string()));
    }

    let base = payload
        .base
        .map(CurrencyCode::new)
        .unwrap_or_else(|| requested.clone());

    let rates = rates
        .into_iter()
        .map(|(code, rate)| (CurrencyCode::new(code), rate))
        .collect();

    let mut table = RateTable::new(base, rates);
    table.date = payload.date;
    Ok(table)
}
