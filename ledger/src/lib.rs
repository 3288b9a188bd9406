//! tCurrency Ledger
//!
//! Keeps the displayed amount of every selected currency consistent with the
//! one the user is editing.

pub mod selection;
pub mod ledger;
pub mod snapshot;

pub use selection::{SelectedCurrencySet, SelectionError, Toggled, MAX_SELECTED};
pub use ledger::MultiCurrencyLedger;
pub use snapshot::{LedgerRow, LedgerSnapshot};
