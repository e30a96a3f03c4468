use {
    crate::{error::ApiError, state::AppState},
    axum::{
        extract::{Path, Query, State},
        Json,
    },
    model::{Error, Pool, PoolId},
    serde::{Deserialize, Serialize},
};

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Decimal fields are serialized as strings, not JSON numbers — a JSON
/// number can't carry 36-digit precision without a client silently
/// rounding it (§6 "all amounts as base-10 decimals").
#[derive(Serialize)]
pub struct PoolView {
    #[serde(rename = "poolId")]
    pool_id: PoolId,
    token0: model::Address,
    token1: model::Address,
    #[serde(rename = "feeRate")]
    fee_rate: String,
    reserve0: String,
    reserve1: String,
    tvl: String,
    #[serde(rename = "volume24h")]
    volume_24h: String,
}

impl From<Pool> for PoolView {
    fn from(pool: Pool) -> Self {
        Self {
            pool_id: pool.pool_id,
            token0: pool.token0,
            token1: pool.token1,
            fee_rate: pool.fee_rate.to_string(),
            reserve0: pool.reserve0.to_string(),
            reserve1: pool.reserve1.to_string(),
            tvl: pool.tvl.to_string(),
            volume_24h: pool.volume_24h.to_string(),
        }
    }
}

/// `GET /pools?limit=&offset=` (§6).
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> Result<Json<Vec<PoolView>>, ApiError> {
    let pools = state.pools.list_active(params.limit, params.offset).await?;
    Ok(Json(pools.into_iter().map(PoolView::from).collect()))
}

/// `GET /pools/{poolId}` (§6).
pub async fn get(State(state): State<AppState>, Path(pool_id): Path<String>) -> Result<Json<PoolView>, ApiError> {
    let pool_id: PoolId = pool_id
        .parse()
        .map_err(|_| ApiError::from(Error::InvalidInput("poolId must be a 66-char 0x-prefixed hex string".to_string())))?;
    let pool = state
        .pools
        .get_by_pool_id(pool_id)
        .await?
        .ok_or_else(|| ApiError::from(Error::NotFound))?;
    Ok(Json(pool.into()))
}
