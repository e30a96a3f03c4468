use {
    crate::pagination::Page,
    model::{Address, Error, NewToken, Result, Token},
    sqlx::PgPool,
};

/// Typed repository over the `tokens` table (§3 `Token`).
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_token: &NewToken) -> Result<Token> {
        if new_token.symbol.is_empty() {
            return Err(Error::InvalidInput("symbol must not be empty".to_string()));
        }
        if new_token.decimals > 18 {
            return Err(Error::InvalidInput("decimals must be <= 18".to_string()));
        }
        let row: Token = sqlx::query_as(
            "INSERT INTO tokens (address, symbol, name, decimals, created_at) VALUES ($1, $2, \
             $3, $4, now()) RETURNING id, address, symbol, name, decimals, price_usd, \
             created_at",
        )
        .bind(new_token.address)
        .bind(&new_token.symbol)
        .bind(&new_token.name)
        .bind(new_token.decimals)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Token>> {
        if id == 0 {
            return Err(Error::InvalidInput("id must be non-zero".to_string()));
        }
        let row =
            sqlx::query_as("SELECT id, address, symbol, name, decimals, price_usd, created_at FROM tokens WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    pub async fn get_by_address(&self, address: Address) -> Result<Option<Token>> {
        let row = sqlx::query_as(
            "SELECT id, address, symbol, name, decimals, price_usd, created_at FROM tokens WHERE \
             address = $1",
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Token>> {
        let page = Page::clamped(limit, offset);
        let rows = sqlx::query_as(
            "SELECT id, address, symbol, name, decimals, price_usd, created_at FROM tokens \
             ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
