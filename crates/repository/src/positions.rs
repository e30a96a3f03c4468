use {
    crate::pagination::Page,
    bigdecimal::BigDecimal,
    model::{Address, Error, LiquidityPosition, NewLiquidityPosition, PoolId, Result},
    sqlx::{PgConnection, PgPool},
};

/// Typed repository over the `liquidity_positions` table (§3
/// `LiquidityPosition`).
pub struct PositionRepository {
    pool: PgPool,
}

impl PositionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_position: &NewLiquidityPosition) -> Result<LiquidityPosition> {
        if new_position.liquidity <= BigDecimal::from(0) {
            return Err(Error::InvalidInput("liquidity must be > 0".to_string()));
        }
        let row: LiquidityPosition = sqlx::query_as(
            r#"
INSERT INTO liquidity_positions (user_address, pool_id, liquidity, amount0, amount1, shares, created_at)
VALUES ($1, $2, $3, $4, $5, $6, now())
RETURNING id, user_address AS "user", pool_id, liquidity, amount0, amount1, shares, created_at, deleted_at
            "#,
        )
        .bind(new_position.user)
        .bind(new_position.pool_id)
        .bind(&new_position.liquidity)
        .bind(&new_position.amount0)
        .bind(&new_position.amount1)
        .bind(&new_position.shares)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<LiquidityPosition>> {
        if id == 0 {
            return Err(Error::InvalidInput("id must be non-zero".to_string()));
        }
        let row = sqlx::query_as(
            r#"SELECT id, user_address AS "user", pool_id, liquidity, amount0, amount1, shares, created_at, deleted_at FROM liquidity_positions WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// The caller's single active position in a pool, if any — used by the
    /// service layer to enforce the at-most-one-active-position soft
    /// invariant (§3) before inserting a new one.
    pub async fn get_active_for_user_pool(
        &self,
        user: Address,
        pool_id: PoolId,
    ) -> Result<Option<LiquidityPosition>> {
        let row = sqlx::query_as(
            r#"SELECT id, user_address AS "user", pool_id, liquidity, amount0, amount1, shares, created_at, deleted_at FROM liquidity_positions WHERE user_address = $1 AND pool_id = $2 AND deleted_at IS NULL"#,
        )
        .bind(user)
        .bind(pool_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_for_user(
        &self,
        user: Address,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LiquidityPosition>> {
        let page = Page::clamped(limit, offset);
        let rows = sqlx::query_as(
            r#"SELECT id, user_address AS "user", pool_id, liquidity, amount0, amount1, shares, created_at, deleted_at FROM liquidity_positions WHERE user_address = $1 AND deleted_at IS NULL ORDER BY id LIMIT $2 OFFSET $3"#,
        )
        .bind(user)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn soft_delete(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE liquidity_positions SET deleted_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Sum of `liquidity` across a user's active positions (§4.1
    /// `TotalLiquidityByUser`).
    pub async fn total_liquidity_by_user(
        ex: &mut PgConnection,
        user: Address,
    ) -> Result<BigDecimal> {
        let total: Option<BigDecimal> = sqlx::query_scalar(
            "SELECT SUM(liquidity) FROM liquidity_positions WHERE user_address = $1 AND \
             deleted_at IS NULL",
        )
        .bind(user)
        .fetch_one(ex)
        .await?;
        Ok(total.unwrap_or_else(|| BigDecimal::from(0)))
    }
}
