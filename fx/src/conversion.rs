//! Cross-rate conversion through a table's base currency.

use serde::{Deserialize, Serialize};
use tcurrency_common::CurrencyCode;
use tracing::warn;

use crate::error::{FxError, FxResult};
use crate::table::RateTable;

/// One converted amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Converted {
    /// Target currency.
    pub currency: CurrencyCode,
    /// Amount in the target currency.
    pub value: f64,
}

/// Pivot arithmetic over a [`RateTable`].
///
/// Amounts are routed through `table.base`: from base multiply by the target
/// rate, to base divide by the source rate, otherwise both. Missing rates read
/// as 1. A zero rate is not guarded and yields an infinite or NaN result.
pub struct ConversionEngine;

impl ConversionEngine {
    /// Convert `amount` of `from` into `to`.
    pub fn convert(
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
        table: &RateTable,
    ) -> FxResult<f64> {
        if from == to {
            return Ok(amount);
        }

        if table.is_empty() {
            return Err(FxError::InvalidRateTable(format!(
                "table for {} carries no rates",
                table.base
            )));
        }

        let value = if *from == table.base {
            amount * table.rate(to)
        } else if *to == table.base {
            amount / table.rate(from)
        } else {
            (amount / table.rate(from)) * table.rate(to)
        };

        Ok(value)
    }

    /// Convert `amount` into every currency of `targets`, in order.
    ///
    /// A target whose conversion fails reads as 0; the rest of the batch
    /// is unaffected.
    pub fn convert_many(
        amount: f64,
        from: &CurrencyCode,
        targets: &[CurrencyCode],
        table: &RateTable,
    ) -> Vec<Converted> {
        targets
            .iter()
            .map(|to| {
                let value = Self::convert(amount, from, to, table).unwrap_or_else(|e| {
                    warn!(from = %from, to = %to, error = %e, "Conversion failed");
                    0.0
                });
                Converted {
                    currency: to.clone(),
                    value,
                }
            })
            .collect()
    }
}
