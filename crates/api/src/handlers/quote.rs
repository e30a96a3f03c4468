use {
    crate::{error::ApiError, state::AppState},
    axum::{extract::State, extract::Query, Json},
    bigdecimal::BigDecimal,
    model::{Address, ChainId, Error},
    serde::{Deserialize, Serialize},
    std::str::FromStr,
};

fn parse_amount(raw: &str) -> Result<BigDecimal, ApiError> {
    BigDecimal::from_str(raw)
        .map_err(|_| ApiError::from(Error::InvalidInput("amountIn must be a base-10 decimal string".to_string())))
}

#[derive(Deserialize)]
pub struct QuoteParams {
    #[serde(rename = "tokenIn")]
    token_in: Address,
    #[serde(rename = "tokenOut")]
    token_out: Address,
    #[serde(rename = "amountIn")]
    amount_in: String,
    chain: ChainId,
}

#[derive(Serialize)]
pub struct QuoteResponse {
    #[serde(rename = "amountOut")]
    amount_out: String,
    #[serde(rename = "routeData")]
    route_data: String,
}

/// `GET /quote?tokenIn=&tokenOut=&amountIn=&chain=` (§6, §4.4 `OptimalRoute`).
pub async fn optimal(State(state): State<AppState>, Query(params): Query<QuoteParams>) -> Result<Json<QuoteResponse>, ApiError> {
    let amount_in = parse_amount(&params.amount_in)?;
    let quote = state
        .router
        .optimal_route(params.token_in, params.token_out, &amount_in, params.chain)
        .await?;
    Ok(Json(QuoteResponse {
        amount_out: quote.amount_out.to_string(),
        route_data: quote.route_data,
    }))
}

#[derive(Deserialize)]
pub struct CrossQuoteParams {
    #[serde(rename = "tokenIn")]
    token_in: Address,
    #[serde(rename = "tokenOut")]
    token_out: Address,
    #[serde(rename = "amountIn")]
    amount_in: String,
    src: ChainId,
    dst: ChainId,
}

#[derive(Serialize)]
pub struct CrossQuoteResponse {
    #[serde(rename = "amountOut")]
    amount_out: String,
    #[serde(rename = "routeData")]
    route_data: String,
    #[serde(rename = "useCCIP")]
    use_ccip: bool,
}

/// `GET /quote/cross?tokenIn=&tokenOut=&amountIn=&src=&dst=` (§6, §4.4
/// `CrossChainRoute`).
pub async fn cross(
    State(state): State<AppState>,
    Query(params): Query<CrossQuoteParams>,
) -> Result<Json<CrossQuoteResponse>, ApiError> {
    let amount_in = parse_amount(&params.amount_in)?;
    let quote = state
        .router
        .cross_chain_route(params.token_in, params.token_out, &amount_in, params.src, params.dst)
        .await?;
    Ok(Json(CrossQuoteResponse {
        amount_out: quote.amount_out.to_string(),
        route_data: quote.route_data,
        use_ccip: quote.use_ccip,
    }))
}
