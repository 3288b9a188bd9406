//! The ordered set of currencies shown on the converter screen.

use serde::{Deserialize, Serialize};
use tcurrency_common::{catalog, CurrencyCode};
use thiserror::Error;

/// Maximum number of currencies on screen at once.
pub const MAX_SELECTED: usize = 6;

/// Errors from editing the selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Currency is already selected.
    #[error("{0} is already selected")]
    Duplicate(CurrencyCode),

    /// Selection is at capacity.
    #[error("At most {max} currencies can be selected")]
    Full { max: usize },

    /// The home currency (first entry) cannot be removed.
    #[error("Home currency {0} cannot be removed")]
    HomeCurrency(CurrencyCode),

    /// The last remaining currency cannot be removed.
    #[error("At least one currency must stay selected")]
    LastCurrency,

    /// Currency is not part of the selection.
    #[error("{0} is not selected")]
    NotSelected(CurrencyCode),

    /// Position is outside the selection.
    #[error("Position {index} is out of range for {len} currencies")]
    IndexOutOfRange { index: usize, len: usize },

    /// A selection must hold at least one currency.
    #[error("Selection cannot be empty")]
    Empty,
}

/// Outcome of [`SelectedCurrencySet::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

/// Ordered, duplicate-free list of 1 to [`MAX_SELECTED`] currencies.
///
/// Entry 0 is the home currency and is never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CurrencyCode>", into = "Vec<CurrencyCode>")]
pub struct SelectedCurrencySet {
    codes: Vec<CurrencyCode>,
}

impl SelectedCurrencySet {
    /// Build a selection, validating size and uniqueness.
    pub fn new(codes: Vec<CurrencyCode>) -> Result<Self, SelectionError> {
        if codes.is_empty() {
            return Err(SelectionError::Empty);
        }
        if codes.len() > MAX_SELECTED {
            return Err(SelectionError::Full { max: MAX_SELECTED });
        }
        for (i, code) in codes.iter().enumerate() {
            if codes[..i].contains(code) {
                return Err(SelectionError::Duplicate(code.clone()));
            }
        }
        Ok(Self { codes })
    }

    /// The home currency.
    pub fn home(&self) -> &CurrencyCode {
        &self.codes[0]
    }

    /// Selected codes in display order.
    pub fn codes(&self) -> &[CurrencyCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.codes.contains(code)
    }

    pub fn position(&self, code: &CurrencyCode) -> Option<usize> {
        self.codes.iter().position(|c| c == code)
    }

    /// Append a currency.
    pub fn add(&mut self, code: CurrencyCode) -> Result<(), SelectionError> {
        if self.contains(&code) {
            return Err(SelectionError::Duplicate(code));
        }
        if self.codes.len() >= MAX_SELECTED {
            return Err(SelectionError::Full { max: MAX_SELECTED });
        }
        self.codes.push(code);
        Ok(())
    }

    /// Remove a currency other than the home currency.
    pub fn remove(&mut self, code: &CurrencyCode) -> Result<(), SelectionError> {
        let index = self
            .position(code)
            .ok_or_else(|| SelectionError::NotSelected(code.clone()))?;

        if self.codes.len() == 1 {
            return Err(SelectionError::LastCurrency);
        }
        if index == 0 {
            return Err(SelectionError::HomeCurrency(code.clone()));
        }

        self.codes.remove(index);
        Ok(())
    }

    /// Put `code` at `index`, keeping every other entry where it was.
    ///
    /// Returns the replaced code. Replacing an entry with itself is a no-op.
    pub fn replace(&mut self, index: usize, code: CurrencyCode) -> Result<CurrencyCode, SelectionError> {
        let len = self.codes.len();
        if index >= len {
            return Err(SelectionError::IndexOutOfRange { index, len });
        }
        if let Some(existing) = self.position(&code) {
            if existing != index {
                return Err(SelectionError::Duplicate(code));
            }
        }

        Ok(std::mem::replace(&mut self.codes[index], code))
    }

    /// Add the currency when absent, remove it when present.
    pub fn toggle(&mut self, code: CurrencyCode) -> Result<Toggled, SelectionError> {
        if self.contains(&code) {
            self.remove(&code)?;
            Ok(Toggled::Removed)
        } else {
            self.add(code)?;
            Ok(Toggled::Added)
        }
    }
}

impl Default for SelectedCurrencySet {
    fn default() -> Self {
        Self {
            codes: catalog::default_selection(),
        }
    }
}

impl TryFrom<Vec<CurrencyCode>> for SelectedCurrencySet {
    type Error = SelectionError;

    fn try_from(codes: Vec<CurrencyCode>) -> Result<Self, Self::Error> {
        Self::new(codes)
    }
}

impl From<SelectedCurrencySet> for Vec<CurrencyCode> {
    fn from(set: SelectedCurrencySet) -> Self {
        set.codes
    }
}
