use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::db::RepoError;

/// Checkout and order-read errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart store unavailable")]
    CartUnavailable,

    #[error("Invalid voucher")]
    InvalidVoucher,

    #[error("Voucher not active")]
    VoucherNotActive,

    #[error("Voucher usage limit exceeded")]
    VoucherUsageExceeded,

    #[error("Order could not be persisted")]
    OrderPersistFailure,

    #[error("Order not found")]
    NotFound,

    #[error("Order belongs to another customer")]
    Forbidden,

    /// Storage failure outside the cases above (voucher lookup, order reads)
    #[error("Storage error: {0}")]
    Storage(#[from] RepoError),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let code = match err {
            OrderError::EmptyCart => ErrorCode::CartEmpty,
            OrderError::CartUnavailable => ErrorCode::CartUnavailable,
            OrderError::InvalidVoucher => ErrorCode::VoucherInvalid,
            OrderError::VoucherNotActive => ErrorCode::VoucherNotActive,
            OrderError::VoucherUsageExceeded => ErrorCode::VoucherUsageExceeded,
            OrderError::OrderPersistFailure => ErrorCode::OrderPersistFailed,
            OrderError::NotFound => ErrorCode::OrderNotFound,
            OrderError::Forbidden => ErrorCode::PermissionDenied,
            OrderError::Storage(e) => {
                tracing::error!(error = %e, "Order storage error");
                ErrorCode::DatabaseError
            }
        };
        // Default messages only: storage detail never reaches the client
        AppError::new(code)
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
