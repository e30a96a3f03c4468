use {
    crate::{address::Address, pool_id::PoolId},
    bigdecimal::BigDecimal,
    chrono::{DateTime, Utc},
};

/// A user's liquidity position in one pool. At-most-one active position per
/// `(user, pool)` is a soft invariant enforced by the service layer (`router`
/// / the repository's caller), not a DB constraint (§3).
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct LiquidityPosition {
    pub id: i64,
    pub user: Address,
    pub pool_id: PoolId,
    pub liquidity: BigDecimal,
    pub amount0: BigDecimal,
    pub amount1: BigDecimal,
    pub shares: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct NewLiquidityPosition {
    pub user: Address,
    pub pool_id: PoolId,
    pub liquidity: BigDecimal,
    pub amount0: BigDecimal,
    pub amount1: BigDecimal,
    pub shares: BigDecimal,
}
