//! Application state

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::addresses::AddressService;
use crate::auth::{JwtConfig, JwtService};
use crate::config::Config;
use crate::db::{
    AddressBook, CartStore, OrderLedger, PgAddressBook, PgCartStore, PgOrderLedger,
    PgVoucherLedger, VoucherLedger,
};
use crate::orders::OrderService;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Storage collaborators, one per capability
pub struct Stores {
    pub carts: Arc<dyn CartStore>,
    pub vouchers: Arc<dyn VoucherLedger>,
    pub orders: Arc<dyn OrderLedger>,
    pub addresses: Arc<dyn AddressBook>,
}

impl Stores {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            carts: Arc::new(PgCartStore::new(pool.clone())),
            vouchers: Arc::new(PgVoucherLedger::new(pool.clone())),
            orders: Arc::new(PgOrderLedger::new(pool.clone())),
            addresses: Arc::new(PgAddressBook::new(pool.clone())),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL pool (absent when running on in-memory stores)
    pub pool: Option<PgPool>,
    pub jwt: JwtService,
    pub orders: OrderService,
    pub addresses: AddressService,
}

impl AppState {
    /// Connect to PostgreSQL, run migrations and wire the services
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let jwt = JwtService::new(JwtConfig {
            secret: config.jwt_secret.clone(),
            expiry_hours: config.jwt_expiry_hours,
        });

        let mut state = Self::from_stores(jwt, Stores::postgres(&pool));
        state.pool = Some(pool);
        Ok(state)
    }

    /// Wire services over arbitrary stores (in-memory in tests)
    pub fn from_stores(jwt: JwtService, stores: Stores) -> Self {
        Self {
            pool: None,
            jwt,
            orders: OrderService::new(stores.carts, stores.vouchers, stores.orders),
            addresses: AddressService::new(stores.addresses),
        }
    }
}
