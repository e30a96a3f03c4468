use {
    crate::pagination::Page,
    chrono::{DateTime, Utc},
    model::{Address, Error, Result, User},
    sqlx::PgPool,
};

/// Typed repository over the `users` table (§3 `User`).
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds the user by address, creating one with the default role set if
    /// none exists yet. A wallet's first authenticated request is the only
    /// "signup" this system has.
    pub async fn get_or_create(&self, address: Address) -> Result<User> {
        if let Some(user) = self.get_by_address(address).await? {
            return Ok(user);
        }
        let row: User = sqlx::query_as(
            "INSERT INTO users (address, roles, active, created_at) VALUES ($1, $2, true, \
             now()) ON CONFLICT (address) DO UPDATE SET address = EXCLUDED.address RETURNING \
             id, address, last_nonce, last_nonce_issued_at, roles, active, created_at",
        )
        .bind(address)
        .bind(vec![User::DEFAULT_ROLE.to_string()])
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        if id == 0 {
            return Err(Error::InvalidInput("id must be non-zero".to_string()));
        }
        let row = sqlx::query_as(
            "SELECT id, address, last_nonce, last_nonce_issued_at, roles, active, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_address(&self, address: Address) -> Result<Option<User>> {
        let row = sqlx::query_as(
            "SELECT id, address, last_nonce, last_nonce_issued_at, roles, active, created_at \
             FROM users WHERE address = $1",
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn record_issued_nonce(
        &self,
        address: Address,
        nonce: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET last_nonce = $2, last_nonce_issued_at = $3 WHERE address = $1",
        )
        .bind(address)
        .bind(nonce)
        .bind(issued_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Grants `role` to `address`, used to move a user into an admin-gated
    /// endpoint's allowed role set (§8 scenario 6).
    pub async fn grant_role(&self, address: Address, role: &str) -> Result<()> {
        sqlx::query(
            "UPDATE users SET roles = array_append(roles, $2) WHERE address = $1 AND NOT ($2 = \
             ANY(roles))",
        )
        .bind(address)
        .bind(role)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let page = Page::clamped(limit, offset);
        let rows = sqlx::query_as(
            "SELECT id, address, last_nonce, last_nonce_issued_at, roles, active, created_at \
             FROM users ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
