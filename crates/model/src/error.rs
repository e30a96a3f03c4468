use thiserror::Error;

/// The taxonomy shared by every component (§7). Each layer converts
/// lower-level errors into this taxonomy before returning; the HTTP surface
/// (`api` crate) is the sole place that maps a variant to a status code.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(AuthCode),

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("deadline expired")]
    DeadlineExpired,

    #[error("slippage exceeded: wanted at least {min}, got {actual}")]
    SlippageExceeded { min: String, actual: String },

    #[error("insufficient fee: needed {needed}, attached {attached}")]
    InsufficientFee { needed: String, attached: String },

    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    #[error("route unavailable: {0}")]
    RouteUnavailable(String),

    #[error("bridge failure: {0}")]
    BridgeFailure(String),

    #[error("infrastructure error: {0}")]
    Infrastructure(#[from] anyhow::Error),

    #[error("slow consumer")]
    SlowConsumer,
}

/// Stable, machine-readable codes that accompany 401/403 responses (§7) so
/// the UI can act on them without parsing prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthCode {
    HeaderMissing,
    InvalidFormat,
    Failed,
    NotAuthenticated,
}

impl AuthCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            AuthCode::HeaderMissing => "AUTH_HEADER_MISSING",
            AuthCode::InvalidFormat => "INVALID_AUTH_FORMAT",
            AuthCode::Failed => "AUTH_FAILED",
            AuthCode::NotAuthenticated => "USER_NOT_AUTHENTICATED",
        }
    }
}

impl std::fmt::Display for AuthCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const INSUFFICIENT_PERMISSIONS: &str = "INSUFFICIENT_PERMISSIONS";

impl Error {
    /// Whether this error kind may be retried transparently by the caller.
    /// Mirrors the "recoverable locally?" column of §7.
    pub fn retriable(&self) -> bool {
        matches!(self, Error::BridgeFailure(_) | Error::Infrastructure(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Infrastructure(anyhow::anyhow!(err))
    }
}
