//! Cart Store (PostgreSQL)

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{Cart, CartLine};
use sqlx::PgPool;

use super::{CartStore, RepoError, RepoResult};

#[derive(sqlx::FromRow)]
struct CartItemRow {
    cart_id: i64,
    product_variant_id: Option<i64>,
    quantity: Option<i32>,
    unit_price: Option<Decimal>,
}

#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn get_cart_by_customer(&self, customer_id: i64) -> RepoResult<Cart> {
        // LEFT JOIN keeps one row for an existing but empty cart
        let rows: Vec<CartItemRow> = sqlx::query_as(
            "SELECT c.id AS cart_id, ci.product_variant_id, ci.quantity, ci.unit_price
             FROM carts c
             LEFT JOIN cart_items ci ON ci.cart_id = c.id
             WHERE c.customer_id = $1
             ORDER BY ci.id",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        let Some(first) = rows.first() else {
            return Err(RepoError::NotFound(format!("cart for customer {customer_id}")));
        };

        let id = first.cart_id;
        let items = rows
            .into_iter()
            .filter_map(|r| match (r.product_variant_id, r.quantity, r.unit_price) {
                (Some(product_variant_id), Some(quantity), Some(unit_price)) => Some(CartLine {
                    product_variant_id,
                    quantity,
                    unit_price,
                }),
                _ => None,
            })
            .collect();

        Ok(Cart {
            id,
            customer_id,
            items,
        })
    }

    async fn clear_cart(&self, customer_id: i64) -> RepoResult<()> {
        sqlx::query(
            "DELETE FROM cart_items
             WHERE cart_id IN (SELECT id FROM carts WHERE customer_id = $1)",
        )
        .bind(customer_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
