use {
    crate::{
        error::ApiError,
        middleware::{check_rate_limit, AuthUser},
        state::AppState,
    },
    axum::{extract::State, Json},
    bigdecimal::BigDecimal,
    model::{Address, ChainId, Error},
    serde::{Deserialize, Serialize},
    std::str::FromStr,
};

fn parse_decimal(field: &'static str, raw: &str) -> Result<BigDecimal, ApiError> {
    BigDecimal::from_str(raw)
        .map_err(|_| ApiError::from(Error::InvalidInput(format!("{field} must be a base-10 decimal string"))))
}

#[derive(Serialize)]
pub struct ExecutionReceiptResponse {
    #[serde(rename = "amountOut")]
    amount_out: String,
    #[serde(rename = "feeRefunded")]
    fee_refunded: String,
    #[serde(rename = "txHash")]
    tx_hash: model::TxHash,
}

impl From<router::ExecutionReceipt> for ExecutionReceiptResponse {
    fn from(receipt: router::ExecutionReceipt) -> Self {
        Self {
            amount_out: receipt.amount_out.to_string(),
            fee_refunded: receipt.fee_refunded.to_string(),
            tx_hash: receipt.tx_hash,
        }
    }
}

#[derive(Deserialize)]
pub struct SwapRequest {
    #[serde(rename = "tokenIn")]
    token_in: Address,
    #[serde(rename = "tokenOut")]
    token_out: Address,
    #[serde(rename = "amountIn")]
    amount_in: String,
    #[serde(rename = "amountOutMin")]
    amount_out_min: String,
    deadline: i64,
    #[serde(rename = "feeAttached", default = "default_fee")]
    fee_attached: String,
}

fn default_fee() -> String {
    "0".to_string()
}

/// `POST /swap` (§6, §4.4 `ExecuteRoute`).
pub async fn execute(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<SwapRequest>,
) -> Result<Json<ExecutionReceiptResponse>, ApiError> {
    check_rate_limit(&*state.rate_limiter, user.address).await?;
    let amount_in = parse_decimal("amountIn", &body.amount_in)?;
    let amount_out_min = parse_decimal("amountOutMin", &body.amount_out_min)?;
    let fee_attached = parse_decimal("feeAttached", &body.fee_attached)?;
    let receipt = state
        .router
        .execute_route(
            user.address,
            body.token_in,
            body.token_out,
            &amount_in,
            &amount_out_min,
            body.deadline,
            &fee_attached,
        )
        .await?;
    Ok(Json(receipt.into()))
}

#[derive(Deserialize)]
pub struct CrossSwapRequest {
    #[serde(rename = "tokenIn")]
    token_in: Address,
    #[serde(rename = "tokenOut")]
    token_out: Address,
    #[serde(rename = "amountIn")]
    amount_in: String,
    #[serde(rename = "amountOutMin")]
    amount_out_min: String,
    deadline: i64,
    src: ChainId,
    dst: ChainId,
    #[serde(rename = "feeAttached")]
    fee_attached: String,
}

/// `POST /swap/cross` (§6, §4.4 `ExecuteCrossChainRoute`). The attached fee
/// is carried in the request body, as the endpoint table notes.
pub async fn execute_cross(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CrossSwapRequest>,
) -> Result<Json<ExecutionReceiptResponse>, ApiError> {
    check_rate_limit(&*state.rate_limiter, user.address).await?;
    let amount_in = parse_decimal("amountIn", &body.amount_in)?;
    let amount_out_min = parse_decimal("amountOutMin", &body.amount_out_min)?;
    let fee_attached = parse_decimal("feeAttached", &body.fee_attached)?;
    let receipt = state
        .router
        .execute_cross_chain_route(
            user.address,
            body.token_in,
            body.token_out,
            &amount_in,
            &amount_out_min,
            body.deadline,
            body.src,
            body.dst,
            &fee_attached,
        )
        .await?;
    Ok(Json(receipt.into()))
}
