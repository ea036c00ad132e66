//! Order Ledger (PostgreSQL)

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{NewOrder, Order, OrderLine, OrderStatus};
use shared::util::now_millis;
use sqlx::PgPool;

use super::{OrderLedger, RepoError, RepoResult};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_id: i64,
    address_id: i64,
    note: Option<String>,
    payment_method: String,
    voucher_code: Option<String>,
    voucher_id: Option<i64>,
    discount: Decimal,
    status: String,
    tracking_number: Option<String>,
    created_at: i64,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: i64,
    product_variant_id: i64,
    quantity: i32,
    unit_price: Decimal,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderLine>) -> RepoResult<Order> {
        let status = OrderStatus::parse(&self.status).ok_or_else(|| {
            RepoError::Database(format!("order {} has unknown status '{}'", self.id, self.status))
        })?;
        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            address_id: self.address_id,
            note: self.note,
            payment_method: self.payment_method,
            voucher_code: self.voucher_code,
            voucher_id: self.voucher_id,
            discount: self.discount,
            status,
            tracking_number: self.tracking_number,
            items,
            created_at: self.created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, address_id, note, payment_method, voucher_code, \
     voucher_id, discount, status, tracking_number, created_at";

#[derive(Clone)]
pub struct PgOrderLedger {
    pool: PgPool,
}

impl PgOrderLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderLedger for PgOrderLedger {
    async fn create_order(&self, new: NewOrder) -> RepoResult<Order> {
        let created_at = now_millis();

        let mut tx = self.pool.begin().await?;

        // id comes from the BIGSERIAL sequence
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (customer_id, address_id, note, payment_method,
                                 voucher_code, voucher_id, discount, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
        )
        .bind(new.customer_id)
        .bind(new.address_id)
        .bind(&new.note)
        .bind(&new.payment_method)
        .bind(&new.voucher_code)
        .bind(new.voucher_id)
        .bind(new.discount)
        .bind(new.status.as_str())
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await?;

        for item in &new.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_variant_id, quantity, unit_price)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(item.product_variant_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order::from_new(id, created_at, new))
    }

    async fn get_order_by_id(&self, id: i64) -> RepoResult<Order> {
        let row: OrderRow = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("order {id}")))?;

        let items: Vec<OrderLine> = sqlx::query_as(
            "SELECT product_variant_id, quantity, unit_price
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        row.into_order(items)
    }

    async fn list_orders_by_customer(
        &self,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> RepoResult<(Vec<Order>, u64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE customer_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(customer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok((Vec::new(), total as u64));
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT order_id, product_variant_id, quantity, unit_price
             FROM order_items WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for r in item_rows {
            items_by_order.entry(r.order_id).or_default().push(OrderLine {
                product_variant_id: r.product_variant_id,
                quantity: r.quantity,
                unit_price: r.unit_price,
            });
        }

        let orders = rows
            .into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect::<RepoResult<Vec<_>>>()?;

        Ok((orders, total as u64))
    }
}
