//! Caller identity
//!
//! - [`JwtService`]: bearer token issue / validation
//! - [`CurrentUser`]: verified caller, extracted per request
//! - [`require_auth`]: rejects unauthenticated `/api/` requests
//!
//! Services never read identity from request state; handlers convert
//! [`CurrentUser`] into a [`CustomerId`] and pass it explicitly.

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::require_auth;

use shared::error::{AppError, ErrorCode};
use shared::models::CustomerId;

pub const ROLE_CUSTOMER: &str = "customer";

/// Current user context (parsed from JWT claims)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: i64,
    pub role: String,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = std::num::ParseIntError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: claims.sub.parse()?,
            role: claims.role,
        })
    }
}

impl CurrentUser {
    pub fn is_customer(&self) -> bool {
        self.role == ROLE_CUSTOMER
    }

    /// Customer-only routes: admins and staff are refused
    pub fn require_customer(&self) -> Result<CustomerId, AppError> {
        if self.is_customer() {
            Ok(CustomerId(self.user_id))
        } else {
            Err(AppError::new(ErrorCode::CustomerRequired))
        }
    }
}
