use {
    crate::address::Address,
    crate::pool_id::PoolId,
    bigdecimal::BigDecimal,
    chrono::{DateTime, Utc},
};

/// A constant-product liquidity pool. `token0 < token1` lexicographically is
/// an invariant enforced at creation time, never re-checked on read (§3).
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Pool {
    pub id: i64,
    pub pool_id: PoolId,
    pub token0: Address,
    pub token1: Address,
    pub fee_rate: BigDecimal,
    pub reserve0: BigDecimal,
    pub reserve1: BigDecimal,
    pub liquidity: BigDecimal,
    pub tvl: BigDecimal,
    pub volume_24h: BigDecimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Pool {
    /// Returns the pair in the canonical order, swapping the caller's inputs
    /// if needed, matching §4.1's "must normalize order before query".
    pub fn normalize_pair(a: Address, b: Address) -> (Address, Address) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn reserve_of(&self, token: Address) -> Option<&BigDecimal> {
        if token == self.token0 {
            Some(&self.reserve0)
        } else if token == self.token1 {
            Some(&self.reserve1)
        } else {
            None
        }
    }
}

/// Input to [`crate::Error`]-validated pool creation. Kept separate from
/// `Pool` so callers can't construct a row with a surrogate key or
/// timestamps already set.
#[derive(Clone, Debug)]
pub struct NewPool {
    pub token0: Address,
    pub token1: Address,
    pub fee_rate: BigDecimal,
}
