//! Order workflow
//!
//! Checkout turns a customer's cart into an order in a fixed sequence:
//!
//! ```text
//! load cart ─▶ non-empty? ─▶ subtotal ─▶ voucher lookup + eligibility
//!     ─▶ discount/total ─▶ conditional decrement ─▶ persist order
//!     ─▶ clear cart (best effort) ─▶ receipt
//! ```
//!
//! The voucher unit is consumed before the order is written. If the write then
//! fails, the unit stays consumed and the gap is logged at ERROR.

pub mod error;
pub mod money;
mod workflow;

#[cfg(test)]
mod tests;

pub use error::{OrderError, OrderResult};
pub use workflow::{CheckoutInput, Clock, OrderService};
