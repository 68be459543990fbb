use async_trait::async_trait;
use roster_core::PersistableRecord;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tracing::warn;

use crate::error::StoreError;
use crate::store::UserStore;

/// [`UserStore`] over one pooled PostgreSQL connection.
///
/// The connection is held for the lifetime of the store and goes back to the
/// pool on drop. A store dropped mid-transaction closes its connection instead,
/// so the open transaction dies with it.
pub struct PgUserStore {
    conn: PoolConnection<Postgres>,
    in_transaction: bool,
}

impl PgUserStore {
    pub async fn acquire(pool: &PgPool) -> Result<Self, StoreError> {
        let conn = pool.acquire().await?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: PoolConnection<Postgres>) -> Self {
        Self {
            conn,
            in_transaction: false,
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn begin(&mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            return Err(StoreError::TransactionActive);
        }
        sqlx::query("BEGIN").execute(&mut *self.conn).await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn insert_user(&mut self, record: &PersistableRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (name, age, address, additional_info)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&record.name)
        .bind(record.age)
        .bind(&record.address)
        .bind(&record.additional_info)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoTransaction);
        }
        // Postgres ends the transaction even when COMMIT fails.
        self.in_transaction = false;
        sqlx::query("COMMIT").execute(&mut *self.conn).await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoTransaction);
        }
        sqlx::query("ROLLBACK").execute(&mut *self.conn).await?;
        self.in_transaction = false;
        Ok(())
    }

    async fn count_users(&mut self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }

    async fn count_in_age_range(&mut self, min: i32, max: i32) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE age >= $1 AND age <= $2",
        )
        .bind(min)
        .bind(max)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(count)
    }
}

impl Drop for PgUserStore {
    fn drop(&mut self) {
        if self.in_transaction {
            warn!("Connection dropped with an open transaction; closing it");
            self.conn.close_on_drop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_user_store<S: UserStore + 'static>() {}

    // Transaction control runs through the same executor form as inserts, so
    // the boxed futures stay `Send` over the borrowed connection.
    #[test]
    fn pg_store_implements_user_store() {
        assert_user_store::<PgUserStore>();
    }
}
