use {
    crate::pagination::Page,
    model::{Error, NewTransaction, PoolId, Result, Transaction, TransactionStatus, TxHash},
    sqlx::PgPool,
};

/// Typed repository over the immutable `transactions` log (§3
/// `Transaction`).
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_tx: &NewTransaction) -> Result<Transaction> {
        let row: Transaction = sqlx::query_as(
            r#"
INSERT INTO transactions (tx_hash, tx_type, status, user_address, pool_id, amount_in, amount_out, created_at)
VALUES ($1, $2, 'pending', $3, $4, $5, $6, now())
RETURNING id, tx_hash, tx_type, status, user_address AS "user", pool_id, amount_in, amount_out, gas_used, gas_price, block_number, created_at, confirmed_at
            "#,
        )
        .bind(new_tx.tx_hash)
        .bind(new_tx.tx_type)
        .bind(new_tx.user)
        .bind(new_tx.pool_id)
        .bind(&new_tx.amount_in)
        .bind(&new_tx.amount_out)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_tx_hash(&self, tx_hash: TxHash) -> Result<Option<Transaction>> {
        let row = sqlx::query_as(
            r#"SELECT id, tx_hash, tx_type, status, user_address AS "user", pool_id, amount_in, amount_out, gas_used, gas_price, block_number, created_at, confirmed_at FROM transactions WHERE tx_hash = $1"#,
        )
        .bind(tx_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Transaction>> {
        if id == 0 {
            return Err(Error::InvalidInput("id must be non-zero".to_string()));
        }
        let row = sqlx::query_as(
            r#"SELECT id, tx_hash, tx_type, status, user_address AS "user", pool_id, amount_in, amount_out, gas_used, gas_price, block_number, created_at, confirmed_at FROM transactions WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Moves a transaction forward in its status machine. Rejects any
    /// transition that isn't `Pending -> {Confirmed, Failed}` (§3) by
    /// checking the current row's status before writing, inside the same
    /// statement via `WHERE status = 'pending'` so the check-then-write is
    /// race-free under concurrent confirmations.
    pub async fn confirm(
        &self,
        tx_hash: TxHash,
        next: TransactionStatus,
        block_number: i64,
    ) -> Result<bool> {
        if !TransactionStatus::Pending.can_transition_to(next) {
            return Err(Error::InvalidInput(format!(
                "{next:?} is not a valid transition from Pending"
            )));
        }
        let result = sqlx::query(
            "UPDATE transactions SET status = $2, block_number = $3, confirmed_at = now() WHERE \
             tx_hash = $1 AND status = 'pending'",
        )
        .bind(tx_hash)
        .bind(next)
        .bind(block_number)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn list_for_pool(
        &self,
        pool_id: PoolId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>> {
        let page = Page::clamped(limit, offset);
        let rows = sqlx::query_as(
            r#"SELECT id, tx_hash, tx_type, status, user_address AS "user", pool_id, amount_in, amount_out, gas_used, gas_price, block_number, created_at, confirmed_at FROM transactions WHERE pool_id = $1 ORDER BY id DESC LIMIT $2 OFFSET $3"#,
        )
        .bind(pool_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
