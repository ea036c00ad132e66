//! Shared types for the shop backend
//!
//! Domain models, the unified error system, paging envelopes and small
//! utilities used by the server and by any Rust client of its API.

pub mod error;
pub mod models;
pub mod pagination;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use pagination::{Page, PageQuery, PaginatedResponse};
