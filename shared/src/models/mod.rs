//! Domain models shared between the server and its clients

pub mod address;
pub mod cart;
pub mod order;
pub mod voucher;

pub use address::{Address, AddressInput};
pub use cart::{Cart, CartLine, CartSummary};
pub use order::{NewOrder, Order, OrderLine, OrderStatus, Receipt};
pub use voucher::{Voucher, VoucherKind};

use serde::{Deserialize, Serialize};

/// Authenticated customer identifier
///
/// Only obtainable from a verified caller identity at the HTTP boundary, then
/// passed explicitly into every service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub i64);

impl CustomerId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
