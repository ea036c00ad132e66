//! Voucher Ledger (PostgreSQL)

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{Voucher, VoucherKind};
use sqlx::PgPool;

use super::{Decrement, RepoError, RepoResult, VoucherLedger};

#[derive(sqlx::FromRow)]
struct VoucherRow {
    id: i64,
    code: String,
    name: String,
    kind: String,
    discount: Decimal,
    remaining_usage: i32,
    start_at: i64,
    end_at: i64,
    published: bool,
}

impl From<VoucherRow> for Voucher {
    fn from(row: VoucherRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            kind: VoucherKind::from_db(&row.kind),
            discount: row.discount,
            remaining_usage: row.remaining_usage,
            start_at: row.start_at,
            end_at: row.end_at,
            published: row.published,
        }
    }
}

#[derive(Clone)]
pub struct PgVoucherLedger {
    pool: PgPool,
}

impl PgVoucherLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoucherLedger for PgVoucherLedger {
    async fn get_by_code(&self, code: &str) -> RepoResult<Voucher> {
        let row: Option<VoucherRow> = sqlx::query_as(
            "SELECT id, code, name, kind, discount, remaining_usage, start_at, end_at, published
             FROM vouchers WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Voucher::from)
            .ok_or_else(|| RepoError::NotFound(format!("voucher {code}")))
    }

    async fn conditional_decrement_usage(&self, voucher_id: i64) -> RepoResult<Decrement> {
        // Single conditional write: concurrent callers serialize on the row lock
        // and the losers see zero rows once the counter reaches 0.
        let remaining: Option<i32> = sqlx::query_scalar(
            "UPDATE vouchers
             SET remaining_usage = remaining_usage - 1, updated_at = NOW()
             WHERE id = $1 AND remaining_usage > 0
             RETURNING remaining_usage",
        )
        .bind(voucher_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match remaining {
            Some(remaining) => Decrement::Applied { remaining },
            None => Decrement::NoRowsAffected,
        })
    }
}
