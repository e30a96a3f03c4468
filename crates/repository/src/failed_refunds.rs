use {
    bigdecimal::BigDecimal,
    chrono::{DateTime, Utc},
    model::{Address, Result},
    sqlx::PgPool,
};

/// A refund the router dispatched a route before attempting, and which then
/// failed to send. The route's side effects already happened and are not
/// reverted; the owed amount becomes a tracked debt here instead of being
/// silently dropped (§4.4 "Refund policy").
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct FailedRefund {
    pub id: i64,
    pub recipient: Address,
    pub amount: BigDecimal,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

pub struct FailedRefundRepository {
    pool: PgPool,
}

impl FailedRefundRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        recipient: Address,
        amount: &BigDecimal,
        reason: &str,
    ) -> Result<FailedRefund> {
        let row: FailedRefund = sqlx::query_as(
            "INSERT INTO failed_refunds (recipient, amount, reason, created_at) VALUES ($1, $2, \
             $3, now()) RETURNING id, recipient, amount, reason, created_at, resolved_at",
        )
        .bind(recipient)
        .bind(amount)
        .bind(reason)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn outstanding_for(&self, recipient: Address) -> Result<Vec<FailedRefund>> {
        let rows = sqlx::query_as(
            "SELECT id, recipient, amount, reason, created_at, resolved_at FROM failed_refunds \
             WHERE recipient = $1 AND resolved_at IS NULL ORDER BY id",
        )
        .bind(recipient)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn mark_resolved(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE failed_refunds SET resolved_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
