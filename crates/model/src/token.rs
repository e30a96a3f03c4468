use {crate::address::Address, bigdecimal::BigDecimal, chrono::{DateTime, Utc}};

/// An ERC-20-style token descriptor, keyed by its (unique) contract address.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Token {
    pub id: i64,
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: i16,
    pub price_usd: Option<BigDecimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewToken {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: i16,
}
