use {
    crate::{pagination::Page, retry_once, PgTransaction},
    bigdecimal::BigDecimal,
    model::{Address, Error, NewPool, Pool, PoolId, Result},
    sqlx::{PgConnection, PgPool},
};

/// Typed repository over the `pools` table (§4.1).
#[derive(Clone)]
pub struct PoolRepository {
    pool: PgPool,
}

impl PoolRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_pool: &NewPool) -> Result<Pool> {
        if new_pool.token0 == new_pool.token1 {
            return Err(Error::InvalidInput(
                "token0 and token1 must differ".to_string(),
            ));
        }
        if new_pool.fee_rate <= BigDecimal::from(0) || new_pool.fee_rate >= BigDecimal::from(1) / BigDecimal::from(10) {
            return Err(Error::InvalidInput(
                "fee_rate must be in (0, 0.1)".to_string(),
            ));
        }
        let (token0, token1) = Pool::normalize_pair(new_pool.token0, new_pool.token1);
        let pool_id = PoolId::derive(token0, token1);

        let row: Pool = sqlx::query_as(
            r#"
INSERT INTO pools (pool_id, token0, token1, fee_rate, reserve0, reserve1, liquidity, tvl, volume_24h, active, created_at)
VALUES ($1, $2, $3, $4, 0, 0, 0, 0, 0, true, now())
RETURNING id, pool_id, token0, token1, fee_rate, reserve0, reserve1, liquidity, tvl, volume_24h, active, created_at, deleted_at
            "#,
        )
        .bind(pool_id)
        .bind(token0)
        .bind(token1)
        .bind(&new_pool.fee_rate)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Pool>> {
        if id == 0 {
            return Err(Error::InvalidInput("id must be non-zero".to_string()));
        }
        retry_once(|| async {
            let row = sqlx::query_as(
                "SELECT id, pool_id, token0, token1, fee_rate, reserve0, reserve1, liquidity, \
                 tvl, volume_24h, active, created_at, deleted_at FROM pools WHERE id = $1 AND \
                 deleted_at IS NULL",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    pub async fn get_by_pool_id(&self, pool_id: PoolId) -> Result<Option<Pool>> {
        retry_once(|| async {
            let row = sqlx::query_as(
                "SELECT id, pool_id, token0, token1, fee_rate, reserve0, reserve1, liquidity, \
                 tvl, volume_24h, active, created_at, deleted_at FROM pools WHERE pool_id = $1 \
                 AND deleted_at IS NULL",
            )
            .bind(pool_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    /// Looks up a pool by an unordered token pair, normalizing order first
    /// (§4.1).
    pub async fn get_by_token_pair(&self, a: Address, b: Address) -> Result<Option<Pool>> {
        let (token0, token1) = Pool::normalize_pair(a, b);
        retry_once(|| async {
            let row = sqlx::query_as(
                "SELECT id, pool_id, token0, token1, fee_rate, reserve0, reserve1, liquidity, \
                 tvl, volume_24h, active, created_at, deleted_at FROM pools WHERE token0 = $1 \
                 AND token1 = $2 AND deleted_at IS NULL",
            )
            .bind(token0)
            .bind(token1)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    pub async fn list_active(&self, limit: i64, offset: i64) -> Result<Vec<Pool>> {
        let page = Page::clamped(limit, offset);
        retry_once(|| async {
            let rows = sqlx::query_as(
                "SELECT id, pool_id, token0, token1, fee_rate, reserve0, reserve1, liquidity, \
                 tvl, volume_24h, active, created_at, deleted_at FROM pools WHERE active = true \
                 AND deleted_at IS NULL ORDER BY id LIMIT $1 OFFSET $2",
            )
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        })
        .await
    }

    /// Top-N active pools ranked by TVL (§4.1).
    pub async fn top_by_tvl(&self, limit: i64) -> Result<Vec<Pool>> {
        let page = Page::clamped(limit, 0);
        retry_once(|| async {
            let rows = sqlx::query_as(
                "SELECT id, pool_id, token0, token1, fee_rate, reserve0, reserve1, liquidity, \
                 tvl, volume_24h, active, created_at, deleted_at FROM pools WHERE active = true \
                 AND deleted_at IS NULL ORDER BY tvl DESC LIMIT $1",
            )
            .bind(page.limit)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        })
        .await
    }

    /// Updates reserves and aggregate liquidity after a confirmed
    /// swap/add/remove. Callers that chain this with a transaction insert
    /// must pass the same `&mut PgTransaction` to keep the two statements
    /// atomic (§5 "add-liquidity/update-reserve sequences in a
    /// transaction").
    pub async fn update_reserves(
        tx: &mut PgTransaction<'_>,
        pool_id: PoolId,
        reserve0: &BigDecimal,
        reserve1: &BigDecimal,
        liquidity: &BigDecimal,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE pools SET reserve0 = $2, reserve1 = $3, liquidity = $4 WHERE pool_id = $1",
        )
        .bind(pool_id)
        .bind(reserve0)
        .bind(reserve1)
        .bind(liquidity)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn soft_delete(&self, pool_id: PoolId) -> Result<()> {
        sqlx::query("UPDATE pools SET deleted_at = now(), active = false WHERE pool_id = $1")
            .bind(pool_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Sum of `liquidity` across active (non soft-deleted) positions in one
    /// pool (§4.1 `TotalLiquidityByPool`).
    pub async fn total_liquidity_by_pool(
        ex: &mut PgConnection,
        pool_id: PoolId,
    ) -> Result<BigDecimal> {
        let total: Option<BigDecimal> = sqlx::query_scalar(
            "SELECT SUM(liquidity) FROM liquidity_positions WHERE pool_id = $1 AND deleted_at IS \
             NULL",
        )
        .bind(pool_id)
        .fetch_one(ex)
        .await?;
        Ok(total.unwrap_or_else(|| BigDecimal::from(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_pair_is_order_independent() {
        let a: Address = "0x0000000000000000000000000000000000000001"
            .parse()
            .unwrap();
        let b: Address = "0x0000000000000000000000000000000000000002"
            .parse()
            .unwrap();
        assert_eq!(Pool::normalize_pair(a, b), Pool::normalize_pair(b, a));
    }
}
