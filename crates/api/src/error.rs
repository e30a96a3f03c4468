use {
    axum::{http::StatusCode, response::IntoResponse, Json},
    model::{AuthCode, Error, INSUFFICIENT_PERMISSIONS},
    serde_json::json,
};

/// Maps the shared domain taxonomy to an HTTP response (§7). This is the
/// only place in the workspace a `model::Error` becomes a status code.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self.0 {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, None, msg.clone()),
            Error::Unauthenticated(auth_code) => (
                StatusCode::UNAUTHORIZED,
                Some(auth_code.as_str()),
                self.0.to_string(),
            ),
            Error::Forbidden => (
                StatusCode::FORBIDDEN,
                Some(INSUFFICIENT_PERMISSIONS),
                self.0.to_string(),
            ),
            Error::NotFound => (StatusCode::NOT_FOUND, None, self.0.to_string()),
            Error::Conflict(msg) => (StatusCode::CONFLICT, None, msg.clone()),
            Error::DeadlineExpired => (StatusCode::REQUEST_TIMEOUT, None, self.0.to_string()),
            Error::SlippageExceeded { .. } => (StatusCode::UNPROCESSABLE_ENTITY, None, self.0.to_string()),
            Error::InsufficientFee { .. } => (StatusCode::UNPROCESSABLE_ENTITY, None, self.0.to_string()),
            Error::InsufficientLiquidity => (StatusCode::UNPROCESSABLE_ENTITY, None, self.0.to_string()),
            Error::RouteUnavailable(_) => (StatusCode::UNPROCESSABLE_ENTITY, None, self.0.to_string()),
            Error::BridgeFailure(_) => (StatusCode::BAD_GATEWAY, None, self.0.to_string()),
            Error::Infrastructure(_) => (StatusCode::INTERNAL_SERVER_ERROR, None, self.0.to_string()),
            Error::SlowConsumer => (StatusCode::INTERNAL_SERVER_ERROR, None, self.0.to_string()),
        };

        if !matches!(&self.0, Error::Infrastructure(_)) {
            tracing::debug!(error = %self.0, %status, "request failed");
        } else {
            tracing::error!(error = %self.0, "infrastructure error");
        }

        let body = match code {
            Some(code) => json!({ "error": message, "code": code }),
            None => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}

/// Surfaces a missing `Authorization` header as the same stable code the
/// rest of §7's 401 taxonomy uses, without going through `auth::verify`
/// (there's nothing to parse yet).
pub fn missing_auth_header() -> ApiError {
    ApiError(Error::Unauthenticated(AuthCode::HeaderMissing))
}
