//! Cart Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One pending line in a customer's cart
///
/// `unit_price` is the price captured when the item was added; checkout never
/// re-prices from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartLine {
    pub product_variant_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// A customer's cart (never deleted, only emptied)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub customer_id: i64,
    pub items: Vec<CartLine>,
}

impl Cart {
    /// Cart with no lines, used when a customer has never added anything
    pub fn empty(customer_id: i64) -> Self {
        Self {
            id: 0,
            customer_id,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Read-only projection of a cart returned to the customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub customer_id: i64,
    pub items: Vec<CartLine>,
    pub total: Decimal,
}
