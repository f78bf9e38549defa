//! # Keypad Price Entry
//!
//! Builds "open items" (ad hoc lines with no catalog SKU) from keypad input.
//!
//! ## Cents-First Entry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Press   Buffer   Display                                              │
//! │  ─────   ──────   ───────                                              │
//! │  "1"     1        0.01                                                 │
//! │  "5"     15       0.15                                                 │
//! │  "0"     150      1.50   ◄── NOT 150.00                                │
//! │  "00"    15000    150.00                                               │
//! │  ⌫       1500     15.00                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::cart::LineItem;
use crate::money::Money;
use crate::types::Rate;

/// Longest digit run the keypad accepts (9,999,999.99).
pub const MAX_KEYPAD_DIGITS: usize = 9;

/// SKU stamped on open items.
pub const OPEN_ITEM_SKU: &str = "OPEN-ITEM";

/// Formats a run of pressed digits as a cents-first price string.
///
/// Non-digit characters are ignored, leading zeros dropped, and input past
/// [`MAX_KEYPAD_DIGITS`] is cut off.
///
/// ```rust
/// use tally_core::keypad::get_price;
///
/// assert_eq!(get_price("150"), "1.50");
/// assert_eq!(get_price("7"), "0.07");
/// assert_eq!(get_price(""), "0.00");
/// assert_eq!(get_price("0005"), "0.05");
/// ```
pub fn get_price(digits: &str) -> String {
    let mut keypad = Keypad::new();
    for c in digits.chars() {
        keypad.press(c);
    }
    keypad.display()
}

/// Keypad buffer for an open item price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypad {
    digits: String,
}

impl Keypad {
    pub fn new() -> Self {
        Keypad::default()
    }

    /// Presses one key. Returns `false` when the key was ignored.
    pub fn press(&mut self, key: char) -> bool {
        if !key.is_ascii_digit() {
            return false;
        }
        if self.digits.is_empty() && key == '0' {
            return false;
        }
        if self.digits.len() >= MAX_KEYPAD_DIGITS {
            return false;
        }
        self.digits.push(key);
        true
    }

    /// The "00" key.
    pub fn press_double_zero(&mut self) {
        self.press('0');
        self.press('0');
    }

    pub fn backspace(&mut self) {
        self.digits.pop();
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// The digits entered so far (without leading zeros).
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Current value, reading the buffer as cents.
    pub fn price(&self) -> Money {
        // At most 9 ASCII digits, always fits in i64.
        Money::from_cents(self.digits.parse::<i64>().unwrap_or(0))
    }

    /// Current value formatted for the keypad display.
    pub fn display(&self) -> String {
        self.price().to_string()
    }

    /// Turns the entered price into an open item line (quantity 1) and
    /// resets the keypad.
    pub fn take_open_item(&mut self, name: impl Into<String>, vat_rate: Rate) -> LineItem {
        let price = self.price();
        self.clear();
        LineItem::open_item(name, price, vat_rate)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_shift_formatting() {
        let mut keypad = Keypad::new();
        keypad.press('1');
        keypad.press('5');
        keypad.press('0');
        assert_eq!(keypad.display(), "1.50");
        assert_eq!(keypad.price().cents(), 150);
    }

    #[test]
    fn test_double_zero_and_backspace() {
        let mut keypad = Keypad::new();
        keypad.press('1');
        keypad.press('5');
        keypad.press_double_zero();
        assert_eq!(keypad.display(), "15.00");

        keypad.backspace();
        assert_eq!(keypad.display(), "1.50");

        keypad.clear();
        assert!(keypad.is_empty());
        assert_eq!(keypad.display(), "0.00");
    }

    #[test]
    fn test_leading_zero_and_non_digits_ignored() {
        let mut keypad = Keypad::new();
        assert!(!keypad.press('0'));
        assert!(!keypad.press('.'));
        assert!(keypad.press('4'));
        assert_eq!(keypad.digits(), "4");
    }

    #[test]
    fn test_digit_cap() {
        let mut keypad = Keypad::new();
        for _ in 0..12 {
            keypad.press('9');
        }
        assert_eq!(keypad.digits().len(), MAX_KEYPAD_DIGITS);
        assert_eq!(keypad.display(), "9999999.99");
    }

    #[test]
    fn test_get_price_contract() {
        assert_eq!(get_price("150"), "1.50");
        assert_eq!(get_price("1a5b0"), "1.50");
        assert_eq!(get_price("15000"), "150.00");
    }

    #[test]
    fn test_take_open_item_resets_keypad() {
        let mut keypad = Keypad::new();
        for c in "1250".chars() {
            keypad.press(c);
        }
        let item = keypad.take_open_item("Misc", Rate::from_percent(15));

        assert!(keypad.is_empty());
        assert!(item.is_open_item);
        assert_eq!(item.sku, OPEN_ITEM_SKU);
        assert_eq!(item.unit_price.cents(), 1250);
        assert_eq!(item.quantity, 1);
    }
}
