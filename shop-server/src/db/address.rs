//! Address Book (PostgreSQL)

use async_trait::async_trait;
use shared::models::{Address, AddressInput};
use shared::util::now_millis;
use sqlx::PgPool;

use super::{AddressBook, RepoError, RepoResult};

const ADDRESS_COLUMNS: &str =
    "id, customer_id, fullname, email, address, is_default, created_at, updated_at";

#[derive(Clone)]
pub struct PgAddressBook {
    pool: PgPool,
}

impl PgAddressBook {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressBook for PgAddressBook {
    async fn create(&self, customer_id: i64, input: AddressInput) -> RepoResult<Address> {
        let now = now_millis();
        let address = sqlx::query_as(&format!(
            "INSERT INTO addresses (customer_id, fullname, email, address, is_default, created_at, updated_at)
             VALUES ($1, $2, $3, $4, FALSE, $5, $5)
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(customer_id)
        .bind(&input.fullname)
        .bind(&input.email)
        .bind(&input.address)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(address)
    }

    async fn get(&self, id: i64) -> RepoResult<Address> {
        sqlx::query_as(&format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("address {id}")))
    }

    async fn update(&self, id: i64, input: AddressInput) -> RepoResult<Address> {
        sqlx::query_as(&format!(
            "UPDATE addresses SET fullname = $2, email = $3, address = $4, updated_at = $5
             WHERE id = $1
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.fullname)
        .bind(&input.email)
        .bind(&input.address)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("address {id}")))
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("address {id}")));
        }
        Ok(())
    }

    async fn list_by_customer(&self, customer_id: i64) -> RepoResult<Vec<Address>> {
        let rows = sqlx::query_as(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses
             WHERE customer_id = $1
             ORDER BY is_default DESC, created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn set_default(&self, customer_id: i64, id: i64) -> RepoResult<Address> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<i64> =
            sqlx::query_scalar("SELECT customer_id FROM addresses WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if owner != Some(customer_id) {
            return Err(RepoError::NotFound(format!("address {id}")));
        }

        sqlx::query(
            "UPDATE addresses SET is_default = FALSE, updated_at = $2
             WHERE customer_id = $1 AND is_default",
        )
        .bind(customer_id)
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;

        let address: Address = sqlx::query_as(&format!(
            "UPDATE addresses SET is_default = TRUE, updated_at = $2
             WHERE id = $1
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(now_millis())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(address)
    }
}
