//! Wallet-signature authentication, nonce lifecycle, and role authorization
//! (§4.5).

mod nonce;
mod signature;
mod token;

use {
    chrono::{Duration as ChronoDuration, Utc},
    model::{AuthCode, Error, Result, User},
    repository::users::UserRepository,
    std::time::Duration,
};

pub use {
    nonce::{spawn_sweeper, NonceSweeperHandle, NonceStore, NONCE_TTL},
    signature::{canonical_message, APP_TAG},
    token::BearerToken,
};

/// Timestamps carried in a bearer token must be within this window of the
/// server's clock, in either direction (§4.5 step 4).
const TIMESTAMP_SKEW: ChronoDuration = ChronoDuration::minutes(5);

/// Default interval the nonce sweeper runs at. Must be well under
/// [`NONCE_TTL`] so expired entries don't linger much past their deadline.
pub const SWEEPER_INTERVAL: Duration = Duration::from_secs(60);

/// The issued challenge returned from `/auth/challenge` (§6).
pub struct Challenge {
    pub nonce: String,
    pub issued_at: chrono::DateTime<Utc>,
}

pub struct AuthService {
    nonces: NonceStore,
    users: UserRepository,
}

impl AuthService {
    pub fn new(nonces: NonceStore, users: UserRepository) -> Self {
        Self { nonces, users }
    }

    /// Step 1: issues a fresh nonce (§4.5).
    pub fn challenge(&self) -> Challenge {
        let (nonce, issued_at) = self.nonces.issue();
        Challenge { nonce, issued_at }
    }

    /// Steps 3-5: verifies a bearer token end to end and, on success,
    /// consumes the nonce and returns the authenticated user (creating the
    /// user record on first sight).
    pub async fn verify(&self, authorization_header: &str) -> Result<User> {
        let token = BearerToken::parse(authorization_header)?;

        let now = Utc::now().timestamp();
        if (now - token.timestamp).abs() > TIMESTAMP_SKEW.num_seconds() {
            return Err(Error::Unauthenticated(AuthCode::Failed));
        }

        // Consuming the nonce here, before signature verification, is
        // deliberate: it makes replay of an already-accepted token fail the
        // same way as an unknown nonce (§8 "nonce single-use"), without
        // leaking whether the signature itself would have been valid.
        self.nonces
            .consume(&token.nonce)
            .ok_or(Error::Unauthenticated(AuthCode::Failed))?;

        let message = canonical_message(&token.nonce, token.timestamp);
        signature::verify(&token.signature_hex, &message, token.address)
            .map_err(|_| Error::Unauthenticated(AuthCode::Failed))?;

        let user = self.users.get_or_create(token.address).await?;
        Ok(user)
    }

    /// Checks the authenticated user carries at least one of `roles`
    /// (§4.5 "Role authorization"). Callers distinguish missing-auth (401,
    /// handled upstream by `verify` failing) from missing-role (403).
    pub fn require_role(user: &User, roles: &[&str]) -> Result<()> {
        if user.has_any_role(roles) {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_role_passes_when_any_role_matches() {
        let user = User {
            id: 1,
            address: "0x0000000000000000000000000000000000dead".parse().unwrap(),
            last_nonce: None,
            last_nonce_issued_at: None,
            roles: vec!["user".to_string(), "trader".to_string()],
            active: true,
            created_at: Utc::now(),
        };
        assert!(AuthService::require_role(&user, &["admin", "trader"]).is_ok());
    }

    #[test]
    fn require_role_fails_when_no_role_matches() {
        let user = User {
            id: 1,
            address: "0x0000000000000000000000000000000000dead".parse().unwrap(),
            last_nonce: None,
            last_nonce_issued_at: None,
            roles: vec!["user".to_string(), "trader".to_string()],
            active: true,
            created_at: Utc::now(),
        };
        let err = AuthService::require_role(&user, &["admin"]).unwrap_err();
        assert!(matches!(err, Error::Forbidden));
    }
}
