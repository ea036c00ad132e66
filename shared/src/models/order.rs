//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::CartLine;

/// Order lifecycle status
///
/// Checkout only ever produces `Created`; the later states are set by
/// fulfillment tooling outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Immutable line-item snapshot copied from the cart at commit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub product_variant_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_variant_id: line.product_variant_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// Order waiting to be written by the order ledger (no id yet)
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: i64,
    pub address_id: i64,
    pub note: Option<String>,
    pub payment_method: String,
    pub voucher_code: Option<String>,
    pub voucher_id: Option<i64>,
    pub discount: Decimal,
    pub status: OrderStatus,
    pub items: Vec<OrderLine>,
}

/// A committed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub address_id: i64,
    pub note: Option<String>,
    pub payment_method: String,
    pub voucher_code: Option<String>,
    pub voucher_id: Option<i64>,
    pub discount: Decimal,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub items: Vec<OrderLine>,
    pub created_at: i64,
}

impl Order {
    /// Attach ledger-assigned identity to a pending order
    pub fn from_new(id: i64, created_at: i64, new: NewOrder) -> Self {
        Self {
            id,
            customer_id: new.customer_id,
            address_id: new.address_id,
            note: new.note,
            payment_method: new.payment_method,
            voucher_code: new.voucher_code,
            voucher_id: new.voucher_id,
            discount: new.discount,
            status: new.status,
            tracking_number: None,
            items: new.items,
            created_at,
        }
    }
}

/// Order view returned to the customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: i64,
    pub items: Vec<OrderLine>,
    pub total: Decimal,
    pub status: OrderStatus,
}
