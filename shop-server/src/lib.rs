//! shop-server: order checkout and voucher redemption backend
//!
//! # Module structure
//!
//! ```text
//! shop-server/src/
//! ├── config.rs      # environment configuration
//! ├── state.rs       # AppState, store wiring
//! ├── error.rs       # ServiceError (storage ⇄ AppError bridge)
//! ├── auth/          # JWT, CurrentUser extractor, require_auth
//! ├── db/            # capability traits, PostgreSQL + in-memory stores
//! ├── orders/        # checkout workflow, money, OrderError
//! ├── addresses/     # address book service
//! ├── api/           # axum routers and handlers
//! └── middleware/    # request logging
//! ```

pub mod addresses;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod orders;
pub mod state;

pub use auth::{CurrentUser, JwtService};
pub use config::Config;
pub use orders::{OrderError, OrderService};
pub use state::{AppState, Stores};
