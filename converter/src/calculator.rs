//! Calculator keypad state machine.
//!
//! Every key press updates a small [`CalculatorState`] and, for most keys,
//! yields the text the active currency should now display. While an operator
//! is pending the display shows the live result of `operand op input`, so
//! there is nothing left for `=` to compute: it only commits and starts a
//! fresh entry.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Longest entry accepted, in characters.
pub const MAX_INPUT_LEN: usize = 16;

/// Arithmetic operator keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// Keypad symbol.
    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '×',
            Operator::Divide => '÷',
        }
    }

    /// Apply `prev op current`.
    ///
    /// Division by zero leaves `prev` unchanged, as does any result that
    /// overflows the decimal range.
    pub fn apply(&self, prev: Decimal, current: Decimal) -> Decimal {
        let result = match self {
            Operator::Add => prev.checked_add(current),
            Operator::Subtract => prev.checked_sub(current),
            Operator::Multiply => prev.checked_mul(current),
            Operator::Divide if current.is_zero() => None,
            Operator::Divide => prev.checked_div(current),
        };
        result.unwrap_or(prev)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A key on the calculator keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Digit(u8),
    DecimalPoint,
    DoubleZero,
    Percent,
    Operator(Operator),
    Equals,
    Backspace,
    Clear,
}

/// Error for an unrecognised key token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown key: {0:?}")]
pub struct UnknownKey(pub String);

impl FromStr for KeyEvent {
    type Err = UnknownKey;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let key = match token.trim() {
            d if d.len() == 1 && d.as_bytes()[0].is_ascii_digit() => {
                KeyEvent::Digit(d.as_bytes()[0] - b'0')
            }
            "." => KeyEvent::DecimalPoint,
            "00" => KeyEvent::DoubleZero,
            "%" => KeyEvent::Percent,
            "+" => KeyEvent::Operator(Operator::Add),
            "-" => KeyEvent::Operator(Operator::Subtract),
            "×" | "*" | "x" => KeyEvent::Operator(Operator::Multiply),
            "÷" | "/" => KeyEvent::Operator(Operator::Divide),
            "=" => KeyEvent::Equals,
            "⌫" | "<" | "back" => KeyEvent::Backspace,
            "C" | "AC" | "c" | "clear" => KeyEvent::Clear,
            other => return Err(UnknownKey(other.to_string())),
        };
        Ok(key)
    }
}

/// Keypad state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorState {
    /// Text of the entry being typed.
    pub input: String,
    /// Left-hand side waiting for an operator to resolve.
    pub pending_operand: Option<Decimal>,
    /// Operator waiting for its right-hand side.
    pub pending_operator: Option<Operator>,
    /// Next digit starts a new entry instead of appending.
    pub awaiting_new_entry: bool,
}

impl Default for CalculatorState {
    fn default() -> Self {
        Self {
            input: "0".to_string(),
            pending_operand: None,
            pending_operator: None,
            awaiting_new_entry: true,
        }
    }
}

/// Translates key presses into display text for the active currency.
#[derive(Debug, Clone, Default)]
pub struct CalculatorInputMachine {
    state: CalculatorState,
}

impl CalculatorInputMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    /// Start over with a fresh entry.
    pub fn reset(&mut self) {
        self.state = CalculatorState::default();
    }

    /// Handle one key press.
    ///
    /// Returns the text to display for the active currency, or `None` when
    /// the display should stay as it is.
    pub fn press(&mut self, key: KeyEvent) -> Option<String> {
        match key {
            KeyEvent::Digit(d) => {
                self.push_digits(&(d % 10).to_string());
                Some(self.display())
            }
            KeyEvent::DecimalPoint => {
                if self.state.awaiting_new_entry {
                    self.state.input = "0.".to_string();
                    self.state.awaiting_new_entry = false;
                } else if !self.state.input.contains('.') && self.state.input.len() < MAX_INPUT_LEN {
                    self.state.input.push('.');
                }
                Some(self.display())
            }
            KeyEvent::DoubleZero => {
                if self.state.awaiting_new_entry {
                    self.state.input = "0".to_string();
                    self.state.awaiting_new_entry = false;
                } else if self.state.input != "0" {
                    self.append("00");
                }
                Some(self.display())
            }
            KeyEvent::Percent => {
                let value = parse_entry(&self.state.input) / Decimal::ONE_HUNDRED;
                self.state.input = render(value);
                self.state.awaiting_new_entry = true;
                Some(self.display())
            }
            KeyEvent::Operator(op) => {
                let current = parse_entry(&self.state.input);
                let shown = match (self.state.pending_operand, self.state.pending_operator) {
                    (Some(prev), Some(pending)) => {
                        let result = pending.apply(prev, current);
                        self.state.pending_operand = Some(result);
                        Some(render(result))
                    }
                    _ => {
                        self.state.pending_operand = Some(current);
                        None
                    }
                };
                self.state.pending_operator = Some(op);
                self.state.awaiting_new_entry = true;
                self.state.input = "0".to_string();
                shown
            }
            KeyEvent::Equals => {
                self.state.pending_operand = None;
                self.state.pending_operator = None;
                self.state.awaiting_new_entry = true;
                self.state.input = "0".to_string();
                None
            }
            KeyEvent::Backspace => {
                if self.state.input.chars().count() <= 1 {
                    self.state.input = "0".to_string();
                } else {
                    self.state.input.pop();
                }
                Some(self.display())
            }
            KeyEvent::Clear => {
                self.reset();
                Some("0".to_string())
            }
        }
    }

    fn push_digits(&mut self, digits: &str) {
        if self.state.awaiting_new_entry {
            self.state.input = digits.to_string();
            self.state.awaiting_new_entry = false;
        } else if self.state.input == "0" {
            self.state.input = digits.to_string();
        } else {
            self.append(digits);
        }
    }

    fn append(&mut self, digits: &str) {
        if self.state.input.len() + digits.len() <= MAX_INPUT_LEN {
            self.state.input.push_str(digits);
        }
    }

    /// Live result while an operator is pending, the raw entry otherwise.
    fn display(&self) -> String {
        match (self.state.pending_operand, self.state.pending_operator) {
            (Some(prev), Some(op)) => render(op.apply(prev, parse_entry(&self.state.input))),
            _ => self.state.input.clone(),
        }
    }
}

/// Read an entry such as `"12."` or `"0.05"`; anything unreadable is 0.
fn parse_entry(input: &str) -> Decimal {
    let trimmed = input.strip_suffix('.').unwrap_or(input);
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed).unwrap_or(Decimal::ZERO)
}

fn render(value: Decimal) -> String {
    value.normalize().to_string()
}
