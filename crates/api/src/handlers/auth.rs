use {
    crate::{error::ApiError, middleware::AuthUser, state::AppState},
    axum::{extract::State, Json},
    serde::Serialize,
};

#[derive(Serialize)]
pub struct ChallengeResponse {
    nonce: String,
    #[serde(rename = "issuedAt")]
    issued_at: chrono::DateTime<chrono::Utc>,
}

/// `POST /auth/challenge` (§6, §4.5 step 1).
pub async fn challenge(State(state): State<AppState>) -> Json<ChallengeResponse> {
    let challenge = state.auth.challenge();
    Json(ChallengeResponse {
        nonce: challenge.nonce,
        issued_at: challenge.issued_at,
    })
}

#[derive(Serialize)]
pub struct SessionResponse {
    address: model::Address,
    roles: Vec<String>,
}

/// `POST /auth/verify` (§6, §4.5 steps 3-5). Extracting `AuthUser` performs
/// the entire verification protocol; reaching the handler body at all means
/// the bearer token was valid and its nonce has been consumed.
pub async fn verify(AuthUser(user): AuthUser) -> Result<Json<SessionResponse>, ApiError> {
    Ok(Json(SessionResponse {
        address: user.address,
        roles: user.roles,
    }))
}
