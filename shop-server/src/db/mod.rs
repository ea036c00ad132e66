//! Storage layer
//!
//! One narrow capability trait per collaborator, each independently
//! substitutable:
//!
//! - [`CartStore`]: read a customer's cart and empty it
//! - [`VoucherLedger`]: look up vouchers and consume one usage atomically
//! - [`OrderLedger`]: append and read committed orders
//! - [`AddressBook`]: per-customer delivery addresses
//!
//! PostgreSQL implementations live in the entity modules; in-memory ones in
//! [`memory`].

pub mod address;
pub mod cart;
pub mod memory;
pub mod order;
pub mod voucher;

pub use address::PgAddressBook;
pub use cart::PgCartStore;
pub use order::PgOrderLedger;
pub use voucher::PgVoucherLedger;

use async_trait::async_trait;
use shared::models::{Address, AddressInput, Cart, NewOrder, Order, Voucher};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row".to_string()),
            other => RepoError::Database(other.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Outcome of a conditional decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    /// One unit consumed; carries the counter value after the write
    Applied { remaining: i32 },
    /// The counter was already zero when the write ran
    NoRowsAffected,
}

#[async_trait]
pub trait CartStore: Send + Sync {
    /// `NotFound` when the customer has never had a cart
    async fn get_cart_by_customer(&self, customer_id: i64) -> RepoResult<Cart>;

    /// Remove every line, keeping the cart itself
    async fn clear_cart(&self, customer_id: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait VoucherLedger: Send + Sync {
    /// Exact, case-sensitive code match
    async fn get_by_code(&self, code: &str) -> RepoResult<Voucher>;

    /// Decrement `remaining_usage` by one only if it is above zero, as a single
    /// storage-level write.
    async fn conditional_decrement_usage(&self, voucher_id: i64) -> RepoResult<Decrement>;
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Persist header and line items as one durable write, assigning the id
    async fn create_order(&self, order: NewOrder) -> RepoResult<Order>;

    async fn get_order_by_id(&self, id: i64) -> RepoResult<Order>;

    /// A page of the customer's orders, newest first, plus the total count
    async fn list_orders_by_customer(
        &self,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> RepoResult<(Vec<Order>, u64)>;
}

#[async_trait]
pub trait AddressBook: Send + Sync {
    async fn create(&self, customer_id: i64, input: AddressInput) -> RepoResult<Address>;

    async fn get(&self, id: i64) -> RepoResult<Address>;

    async fn update(&self, id: i64, input: AddressInput) -> RepoResult<Address>;

    async fn delete(&self, id: i64) -> RepoResult<()>;

    async fn list_by_customer(&self, customer_id: i64) -> RepoResult<Vec<Address>>;

    /// Make `id` the customer's only default address. `NotFound` unless the
    /// address exists and belongs to `customer_id`.
    async fn set_default(&self, customer_id: i64, id: i64) -> RepoResult<Address>;
}
