//! User-facing converter settings.

use serde::{Deserialize, Serialize};

use crate::error::{ConverterError, ConverterResult};

/// Upper bound for [`Settings::decimal_places`].
pub const MAX_DECIMAL_PLACES: u32 = 8;

/// Which kind of rate the user asked to see. Display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExchangeSource {
    #[default]
    Simple,
    MidMarket,
}

impl ExchangeSource {
    /// Name shown next to the rates.
    pub fn label(&self) -> &'static str {
        match self {
            ExchangeSource::Simple => "Simple",
            ExchangeSource::MidMarket => "mid-market",
        }
    }
}

/// Persisted settings, stored under the `app_settings` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Precision of derived amounts.
    pub decimal_places: u32,
    /// Amount given to the first currency after a reset.
    pub default_amount: f64,
    pub show_symbol: bool,
    pub show_local_currency: bool,
    pub show_exchange_source: bool,
    pub exchange_source: ExchangeSource,
    /// Replacement flag for the home (TWD) row.
    pub custom_home_flag: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            default_amount: 100.0,
            show_symbol: true,
            show_local_currency: false,
            show_exchange_source: true,
            exchange_source: ExchangeSource::Simple,
            custom_home_flag: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> ConverterResult<()> {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(ConverterError::InvalidSettings(format!(
                "decimal_places must be at most {MAX_DECIMAL_PLACES}, got {}",
                self.decimal_places
            )));
        }
        if !self.default_amount.is_finite() || self.default_amount < 0.0 {
            return Err(ConverterError::InvalidSettings(format!(
                "default_amount must be a non-negative number, got {}",
                self.default_amount
            )));
        }
        Ok(())
    }
}

/// Partial settings update. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    pub decimal_places: Option<u32>,
    pub default_amount: Option<f64>,
    pub show_symbol: Option<bool>,
    pub show_local_currency: Option<bool>,
    pub show_exchange_source: Option<bool>,
    pub exchange_source: Option<ExchangeSource>,
    /// `Some(None)` clears the custom flag.
    pub custom_home_flag: Option<Option<String>>,
}

impl SettingsPatch {
    /// Merge over `current`.
    pub fn apply(&self, current: &Settings) -> Settings {
        let mut next = current.clone();
        if let Some(v) = self.decimal_places {
            next.decimal_places = v;
        }
        if let Some(v) = self.default_amount {
            next.default_amount = v;
        }
        if let Some(v) = self.show_symbol {
            next.show_symbol = v;
        }
        if let Some(v) = self.show_local_currency {
            next.show_local_currency = v;
        }
        if let Some(v) = self.show_exchange_source {
            next.show_exchange_source = v;
        }
        if let Some(v) = self.exchange_source {
            next.exchange_source = v;
        }
        if let Some(v) = &self.custom_home_flag {
            next.custom_home_flag = v.clone();
        }
        next
    }

    pub fn is_empty(&self) -> bool {
        self == &SettingsPatch::default()
    }
}
