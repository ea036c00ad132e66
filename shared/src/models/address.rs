//! Address Model

use serde::{Deserialize, Serialize};

/// Delivery address in a customer's address book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Address {
    pub id: i64,
    pub customer_id: i64,
    pub fullname: String,
    pub email: String,
    pub address: String,
    pub is_default: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create / update address payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressInput {
    pub fullname: String,
    pub email: String,
    pub address: String,
}
