use {crate::address::Address, chrono::{DateTime, Utc}};

/// A wallet holder. Address and on-chain identity are the same; no password
/// exists — authentication is purely signature-based (see the `auth` crate).
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub address: Address,
    /// The most recently issued auth-challenge nonce, kept for audit; the
    /// live single-use store lives in memory in the `auth` crate and is not
    /// this column.
    pub last_nonce: Option<String>,
    pub last_nonce_issued_at: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const DEFAULT_ROLE: &'static str = "user";

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| self.roles.iter().any(|has| has == r))
    }
}
