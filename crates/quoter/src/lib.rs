//! Constant-product pool quoting (§4.3). All arithmetic is
//! `bigdecimal::BigDecimal`, multiplication before division, to preserve
//! precision the way the spec's "Decimal arithmetic" design note requires.

use {
    bigdecimal::BigDecimal,
    model::{Address, Error, Pool, Result},
};

pub struct Quoter;

impl Quoter {
    pub fn new() -> Self {
        Self
    }

    /// `amountOut = (amountIn * (1 - feeRate) * reserveOut) / (reserveIn +
    /// amountIn * (1 - feeRate))` (§4.3).
    pub fn quote(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: &BigDecimal,
        pool: &Pool,
    ) -> Result<BigDecimal> {
        if token_in == token_out {
            return Err(Error::InvalidInput(
                "tokenIn and tokenOut must differ".to_string(),
            ));
        }
        let reserve_in = pool
            .reserve_of(token_in)
            .ok_or_else(|| Error::InvalidInput("tokenIn is not part of this pool".to_string()))?;
        let reserve_out = pool
            .reserve_of(token_out)
            .ok_or_else(|| Error::InvalidInput("tokenOut is not part of this pool".to_string()))?;

        if reserve_in == &BigDecimal::from(0) || reserve_out == &BigDecimal::from(0) {
            return Err(Error::InsufficientLiquidity);
        }

        let one = BigDecimal::from(1);
        let fee_multiplier = &one - &pool.fee_rate;
        let amount_in_after_fee = amount_in * &fee_multiplier;
        let numerator = &amount_in_after_fee * reserve_out;
        let denominator = reserve_in + &amount_in_after_fee;
        let amount_out = (numerator / denominator).with_scale(model::amount::SCALE);

        if amount_out >= *reserve_out {
            return Err(Error::InsufficientLiquidity);
        }

        Ok(amount_out)
    }
}

impl Default for Quoter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use model::PoolId;
    use std::str::FromStr;

    fn token(n: u8) -> Address {
        let mut hex = "0".repeat(39);
        hex.push((b'0' + n) as char);
        format!("0x{hex}").parse().unwrap()
    }

    fn test_pool(reserve0: &str, reserve1: &str, fee: &str) -> Pool {
        let token0 = token(1);
        let token1 = token(2);
        Pool {
            id: 1,
            pool_id: PoolId::derive(token0, token1),
            token0,
            token1,
            fee_rate: BigDecimal::from_str(fee).unwrap(),
            reserve0: BigDecimal::from_str(reserve0).unwrap(),
            reserve1: BigDecimal::from_str(reserve1).unwrap(),
            liquidity: BigDecimal::from(0),
            tvl: BigDecimal::from(0),
            volume_24h: BigDecimal::from(0),
            active: true,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn rejects_same_token_quote() {
        let quoter = Quoter::new();
        let pool = test_pool("500000", "500000", "0.003");
        let amount_in = BigDecimal::from(1000);
        let err = quoter
            .quote(pool.token0, pool.token0, &amount_in, &pool)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn matches_constant_product_with_fee_formula() {
        // amountIn=1000, reserves=500000/500000, fee=0.003:
        // amountInAfterFee = 997, amountOut = 997*500000 / (500000+997).
        let quoter = Quoter::new();
        let pool = test_pool("500000", "500000", "0.003");
        let amount_in = BigDecimal::from(1000);
        let amount_out = quoter
            .quote(pool.token0, pool.token1, &amount_in, &pool)
            .unwrap();
        let expected = BigDecimal::from_str("995.015938219190933279").unwrap();
        let diff = (&amount_out - &expected).abs();
        assert!(diff < BigDecimal::from_str("0.000001").unwrap(), "{amount_out}");
    }

    #[test]
    fn zero_reserve_is_insufficient_liquidity() {
        let quoter = Quoter::new();
        let pool = test_pool("0", "500000", "0.003");
        let amount_in = BigDecimal::from(1000);
        let err = quoter
            .quote(pool.token0, pool.token1, &amount_in, &pool)
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientLiquidity));
    }

    #[test]
    fn repeated_quote_is_idempotent() {
        let quoter = Quoter::new();
        let pool = test_pool("500000", "500000", "0.003");
        let amount_in = BigDecimal::from(1000);
        let a = quoter.quote(pool.token0, pool.token1, &amount_in, &pool).unwrap();
        let b = quoter.quote(pool.token0, pool.token1, &amount_in, &pool).unwrap();
        assert_eq!(a, b);
    }
}
