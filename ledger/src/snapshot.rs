//! Read-only ledger view handed to the presentation layer.

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tcurrency_common::{update_label, CurrencyCode, CurrencyDescriptor, Timestamp};

/// One currency row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    /// Currency code.
    pub currency: CurrencyCode,
    /// Displayed amount text.
    pub amount: String,
    /// Whether this row is the one being edited.
    pub active: bool,
    /// Display metadata from the catalog.
    pub descriptor: CurrencyDescriptor,
}

/// Snapshot of everything the converter screen shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    /// Rows in display order.
    pub rows: Vec<LedgerRow>,
    /// Currency being edited.
    pub active: Option<CurrencyCode>,
    /// Base of the rate table in use.
    pub base: Option<CurrencyCode>,
    /// When rates were last loaded successfully.
    pub last_update: Option<Timestamp>,
    /// A rate fetch is in flight.
    pub loading: bool,
    /// The last refresh failed with nothing to fall back on.
    pub data_unavailable: bool,
}

impl LedgerSnapshot {
    /// Amount text for `currency`.
    pub fn amount(&self, currency: &CurrencyCode) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| &r.currency == currency)
            .map(|r| r.amount.as_str())
    }

    /// "just updated" / "N minutes ago" label, rendered in `now`'s time zone.
    pub fn update_label<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String {
        let last = self.last_update.map(|t| t.with_timezone(&now.timezone()));
        update_label(last.as_ref(), now)
    }
}
