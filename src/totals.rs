//! Item and invoice totals.
//!
//! Values keep full precision; rounding to two decimals happens only in
//! [`format_money`].

use crate::currency;
use crate::model::{Amount, Item};

pub const TAX_RATE: f64 = 0.2;

/// Blank or zero quantity counts as one unit.
pub fn effective_quantity(quantity: Amount) -> f64 {
    match quantity {
        Amount::Number(n) if n != 0.0 => n,
        _ => 1.0,
    }
}

/// Blank or zero unit price counts as zero.
pub fn effective_unit_price(unit_price: Amount) -> f64 {
    match unit_price {
        Amount::Number(n) if n != 0.0 => n,
        _ => 0.0,
    }
}

pub fn item_total(item: &Item) -> f64 {
    effective_quantity(item.quantity) * effective_unit_price(item.unit_price)
}

pub fn subtotal(items: &[Item]) -> f64 {
    items.iter().map(|item| item.total).sum()
}

pub fn tax(subtotal: f64) -> f64 {
    subtotal * TAX_RATE
}

pub fn grand_total(subtotal: f64, tax: f64) -> f64 {
    subtotal + tax
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl Totals {
    pub fn of(items: &[Item]) -> Self {
        let subtotal = subtotal(items);
        let tax = tax(subtotal);
        Totals { subtotal, tax, total: grand_total(subtotal, tax) }
    }
}

/// `value` with two decimals, prefixed by the currency symbol (default symbol if unknown).
pub fn format_money(value: f64, currency_code: &str) -> String {
    format!("{}{:.2}", currency::symbol_for(currency_code), value)
}
