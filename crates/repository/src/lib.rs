#![allow(clippy::needless_borrow)]

pub mod failed_refunds;
pub mod pagination;
pub mod pools;
pub mod positions;
pub mod tokens;
pub mod transactions;
pub mod users;

use sqlx::{Executor, PgPool};

// Design:
//
// Functions that execute multiple statements atomically take `&mut
// PgTransaction` to signal that the whole function succeeds or fails
// together. Functions that execute a single statement take `&mut
// PgConnection`. We call the parameter `ex` for `Executor`, the trait whose
// methods run queries. Callers decide whether to fold a repository call into
// a bigger transaction or run it standalone; `PgTransaction` derefs to
// `PgConnection` so either parameter type accepts it.
//
// Integration tests start a transaction, use it for every query, and never
// commit it; dropping an uncommitted transaction rolls it back. That lets
// Postgres-backed tests run concurrently without fixture cleanup between
// runs.

pub type PgTransaction<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

/// Retries an idempotent read once if its first attempt fails with a
/// retriable error (§7 "Infrastructure: one retry for idempotent reads").
/// Any other error, or a second failure, is surfaced as-is.
pub async fn retry_once<F, Fut, T>(mut attempt: F) -> model::Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = model::Result<T>>,
{
    match attempt().await {
        Ok(value) => Ok(value),
        Err(err) if err.retriable() => attempt().await,
        Err(err) => Err(err),
    }
}

pub const ALL_TABLES: &[&str] = &[
    "pools",
    "tokens",
    "users",
    "liquidity_positions",
    "transactions",
    "failed_refunds",
];

/// Deletes all data in the database. Only used by tests.
#[allow(non_snake_case)]
pub async fn clear_DANGER_(ex: &mut PgTransaction<'_>) -> sqlx::Result<()> {
    for table in ALL_TABLES {
        ex.execute(format!("TRUNCATE {table} CASCADE;").as_str())
            .await?;
    }
    Ok(())
}

/// Like above but more ergonomic for tests that hold a pool rather than a
/// transaction.
#[allow(non_snake_case)]
pub async fn clear_DANGER(pool: &PgPool) -> sqlx::Result<()> {
    let mut transaction = pool.begin().await?;
    clear_DANGER_(&mut transaction).await?;
    transaction.commit().await
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        sqlx::{Connection, PgConnection},
    };

    #[tokio::test]
    #[ignore]
    async fn postgres_clear() {
        let mut con = PgConnection::connect("postgresql://").await.unwrap();
        let mut con = con.begin().await.unwrap();
        clear_DANGER_(&mut con).await.unwrap();
    }
}
