use bigdecimal::BigDecimal;

/// Fractional digits every amount, fee, reserve and price is normalized to.
/// Never use binary floating point for monetary quantities; `BigDecimal`
/// (base-10, arbitrary precision) is the workspace's amount type end to end,
/// matching the teacher's `sqlx::types::BigDecimal` columns.
pub const SCALE: i64 = 18;

/// Total base-10 digits an amount may carry (36-digit precision, §6).
pub const MAX_PRECISION: u64 = 36;

/// Normalizes `value` to [`SCALE`] fractional digits, as required for every
/// amount that crosses a component boundary (quote output, reserves, fees).
pub fn normalize(value: BigDecimal) -> BigDecimal {
    value.with_scale(SCALE)
}

/// Builds an `Amount` from an integer numerator so callers don't need to
/// depend on `bigdecimal` directly just to construct round values in tests
/// and fixtures.
pub fn from_integer(value: i64) -> BigDecimal {
    normalize(BigDecimal::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn normalize_pads_scale() {
        let v = BigDecimal::from_str("1.5").unwrap();
        assert_eq!(normalize(v).to_string(), "1.500000000000000000");
    }
}
