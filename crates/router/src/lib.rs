//! Cross-chain smart routing (§4.4): route discovery, bridge selection, and
//! atomic route execution with refund/timeout semantics.

mod guard;
mod retry;

use {
    bigdecimal::BigDecimal,
    bridge::{BridgeAdapterSet, Provider},
    chrono::Utc,
    guard::InFlightGuards,
    model::{
        byte_array::ByteArray, Address, ChainId, Error, NewTransaction, PoolId, Result, Route,
        RouteHop, TransactionStatus, TransactionType, TxHash,
    },
    quoter::Quoter,
    repository::{failed_refunds::FailedRefundRepository, pools::PoolRepository, transactions::TransactionRepository},
    std::time::Duration,
};

/// Minimum and maximum hop count `MultiPathRoute` accepts (§4.4 "Path
/// bounds").
pub const MIN_PATH_LEN: usize = 2;
pub const MAX_PATH_LEN: usize = 6;

const BRIDGE_RETRY_CAP: u32 = 4;
const BRIDGE_RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

pub struct SmartRouter {
    quoter: Quoter,
    bridges: BridgeAdapterSet,
    pools: PoolRepository,
    transactions: TransactionRepository,
    failed_refunds: FailedRefundRepository,
    db: sqlx::PgPool,
    guards: InFlightGuards,
}

/// Result of a read-only route computation: the expected output and the
/// opaque encoded route (§4.4).
pub struct Quote {
    pub amount_out: BigDecimal,
    pub route_data: String,
}

/// Result of `cross_chain_route`: adds which provider was selected.
pub struct CrossChainQuote {
    pub amount_out: BigDecimal,
    pub route_data: String,
    pub use_ccip: bool,
}

/// Result of `multi_path_route`: per-hop amounts and the total bridge fee.
pub struct MultiPathQuote {
    pub amounts_per_hop: Vec<BigDecimal>,
    pub route_data_per_hop: Vec<String>,
    pub total_bridge_fee: BigDecimal,
}

/// Outcome of an `execute_*` call: the settled amount out, any fee refunded,
/// and the transaction hash recorded for audit.
pub struct ExecutionReceipt {
    pub amount_out: BigDecimal,
    pub fee_refunded: BigDecimal,
    pub tx_hash: TxHash,
}

impl SmartRouter {
    pub fn new(
        db: sqlx::PgPool,
        pools: PoolRepository,
        transactions: TransactionRepository,
        failed_refunds: FailedRefundRepository,
        bridges: BridgeAdapterSet,
    ) -> Self {
        Self {
            quoter: Quoter::new(),
            bridges,
            pools,
            transactions,
            failed_refunds,
            db,
            guards: InFlightGuards::new(),
        }
    }

    fn validate_distinct_tokens(token_in: Address, token_out: Address) -> Result<()> {
        if token_in == token_out {
            return Err(Error::InvalidInput(
                "tokenIn and tokenOut must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Best single-hop local route (§4.4 `OptimalRoute`). Purely
    /// computational; fails `RouteUnavailable` if no pool exists for the
    /// pair.
    pub async fn optimal_route(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: &BigDecimal,
        chain_id: ChainId,
    ) -> Result<Quote> {
        Self::validate_distinct_tokens(token_in, token_out)?;
        let pool = self
            .pools
            .get_by_token_pair(token_in, token_out)
            .await?
            .ok_or_else(|| Error::RouteUnavailable("no pool for token pair".to_string()))?;
        let amount_out = self.quoter.quote(token_in, token_out, amount_in, &pool)?;
        let route = Route::single_hop(chain_id, pool.pool_id);
        Ok(Quote {
            amount_out,
            route_data: route.encode(),
        })
    }

    /// Cross-chain route composing a source-pool quote, a bridge hop, and a
    /// destination-pool quote (§4.4 `CrossChainRoute`). Selects the cheaper
    /// bridge provider, tie-breaking to CCIP.
    pub async fn cross_chain_route(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: &BigDecimal,
        src_chain: ChainId,
        dst_chain: ChainId,
    ) -> Result<CrossChainQuote> {
        Self::validate_distinct_tokens(token_in, token_out)?;
        let pool = self
            .pools
            .get_by_token_pair(token_in, token_out)
            .await?
            .ok_or_else(|| Error::RouteUnavailable("no pool for token pair".to_string()))?;
        let src_amount_out = self.quoter.quote(token_in, token_out, amount_in, &pool)?;

        let payload = bridge_payload(pool.pool_id, &src_amount_out);
        let (provider, _fee) = self
            .bridges
            .select_cheapest(src_chain, dst_chain, &payload)
            .await?;

        // The destination pool mirrors the source pool's reserves in this
        // single-repository data model (Pool carries no chainId, §9 open
        // question on cross-chain pool identity); the same quote applies on
        // both ends of the bridge.
        let dst_amount_out = self.quoter.quote(token_in, token_out, &src_amount_out, &pool)?;

        let route = Route {
            hops: vec![
                RouteHop { chain_id: src_chain, pool_id: pool.pool_id },
                RouteHop { chain_id: dst_chain, pool_id: pool.pool_id },
            ],
            bridge_provider: Some(provider.into()),
            bridge_fee: Some(self.bridges.estimate_fee(provider, dst_chain, &payload).await?),
        };

        Ok(CrossChainQuote {
            amount_out: dst_amount_out,
            route_data: route.encode(),
            use_ccip: matches!(provider, Provider::Ccip),
        })
    }

    /// Chains `chain_path.len() - 1` bridge hops, quoting once at the
    /// originating pool and carrying the resulting amount across each
    /// subsequent bridge leg (§4.4 `MultiPathRoute`). Validates
    /// `len(chainPath) in [2, 6]`.
    pub async fn multi_path_route(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: &BigDecimal,
        chain_path: &[ChainId],
    ) -> Result<MultiPathQuote> {
        if chain_path.len() < MIN_PATH_LEN || chain_path.len() > MAX_PATH_LEN {
            return Err(Error::InvalidInput(format!(
                "chainPath length must be in [{MIN_PATH_LEN}, {MAX_PATH_LEN}], got {}",
                chain_path.len()
            )));
        }
        Self::validate_distinct_tokens(token_in, token_out)?;
        let pool = self
            .pools
            .get_by_token_pair(token_in, token_out)
            .await?
            .ok_or_else(|| Error::RouteUnavailable("no pool for token pair".to_string()))?;

        let mut amounts_per_hop = Vec::with_capacity(chain_path.len());
        let mut route_data_per_hop = Vec::with_capacity(chain_path.len() - 1);
        let mut total_bridge_fee = BigDecimal::from(0);

        let amount_out = self.quoter.quote(token_in, token_out, amount_in, &pool)?;
        amounts_per_hop.push(amount_out.clone());

        for window in chain_path.windows(2) {
            let (src_chain, dst_chain) = (window[0], window[1]);
            let payload = bridge_payload(pool.pool_id, &amount_out);
            let (provider, fee) = self
                .bridges
                .select_cheapest(src_chain, dst_chain, &payload)
                .await?;
            total_bridge_fee += &fee;
            amounts_per_hop.push(amount_out.clone());
            let route = Route {
                hops: vec![
                    RouteHop { chain_id: src_chain, pool_id: pool.pool_id },
                    RouteHop { chain_id: dst_chain, pool_id: pool.pool_id },
                ],
                bridge_provider: Some(provider.into()),
                bridge_fee: Some(fee),
            };
            route_data_per_hop.push(route.encode());
        }

        Ok(MultiPathQuote {
            amounts_per_hop,
            route_data_per_hop,
            total_bridge_fee,
        })
    }

    /// Executes a single-chain route: validates the deadline and slippage,
    /// updates pool reserves atomically, records the transaction, and
    /// refunds any unused attached fee. Ordering follows validate -> effects
    /// -> interactions -> refund (§4.4).
    pub async fn execute_route(
        &self,
        caller: Address,
        token_in: Address,
        token_out: Address,
        amount_in: &BigDecimal,
        amount_out_min: &BigDecimal,
        deadline_unix: i64,
        fee_attached: &BigDecimal,
    ) -> Result<ExecutionReceipt> {
        let _guard = self
            .guards
            .try_acquire(caller)
            .ok_or_else(|| Error::Conflict("an execute is already in flight for this address".to_string()))?;

        // validate
        if Utc::now().timestamp() > deadline_unix {
            return Err(Error::DeadlineExpired);
        }
        Self::validate_distinct_tokens(token_in, token_out)?;
        let pool = self
            .pools
            .get_by_token_pair(token_in, token_out)
            .await?
            .ok_or_else(|| Error::RouteUnavailable("no pool for token pair".to_string()))?;
        let amount_out = self.quoter.quote(token_in, token_out, amount_in, &pool)?;
        if &amount_out < amount_out_min {
            return Err(Error::SlippageExceeded {
                min: amount_out_min.to_string(),
                actual: amount_out.to_string(),
            });
        }
        let fee_needed = BigDecimal::from(0); // same-chain execute dispatches no bridge message
        if fee_attached < &fee_needed {
            return Err(Error::InsufficientFee {
                needed: fee_needed.to_string(),
                attached: fee_attached.to_string(),
            });
        }

        // effects: update reserves and record the transaction atomically.
        let (new_reserve0, new_reserve1) = apply_swap(&pool, token_in, amount_in, &amount_out)?;
        let tx_hash = random_tx_hash();
        let mut tx = self.db.begin().await.map_err(Error::from)?;
        PoolRepository::update_reserves(&mut tx, pool.pool_id, &new_reserve0, &new_reserve1, &pool.liquidity)
            .await?;
        tx.commit().await.map_err(Error::from)?;

        self.transactions
            .create(&NewTransaction {
                tx_hash,
                tx_type: TransactionType::Swap,
                user: caller,
                pool_id: Some(pool.pool_id),
                amount_in: Some(amount_in.clone()),
                amount_out: Some(amount_out.clone()),
            })
            .await?;
        tracing::info!(%caller, pool_id = %pool.pool_id, %amount_out, "route executed");

        // interactions: nothing to dispatch for a same-chain route, so the
        // transaction is confirmed immediately.
        self.transactions.confirm(tx_hash, TransactionStatus::Confirmed, 0).await?;

        // refund: entire attached fee, since same-chain execution needs none.
        let fee_refunded = fee_attached - &fee_needed;
        Ok(ExecutionReceipt {
            amount_out,
            fee_refunded,
            tx_hash,
        })
    }

    /// Executes a cross-chain route: same ordering as `execute_route`, but
    /// the interactions phase dispatches through the selected bridge with
    /// bounded exponential-backoff retry (§4.4 `BridgeFailure`). A refund
    /// failure is logged and recorded as a debt rather than unwinding the
    /// already-dispatched route (§4.4 "Refund policy").
    pub async fn execute_cross_chain_route(
        &self,
        caller: Address,
        token_in: Address,
        token_out: Address,
        amount_in: &BigDecimal,
        amount_out_min: &BigDecimal,
        deadline_unix: i64,
        src_chain: ChainId,
        dst_chain: ChainId,
        fee_attached: &BigDecimal,
    ) -> Result<ExecutionReceipt> {
        let _guard = self
            .guards
            .try_acquire(caller)
            .ok_or_else(|| Error::Conflict("an execute is already in flight for this address".to_string()))?;

        if Utc::now().timestamp() > deadline_unix {
            return Err(Error::DeadlineExpired);
        }
        Self::validate_distinct_tokens(token_in, token_out)?;
        let pool = self
            .pools
            .get_by_token_pair(token_in, token_out)
            .await?
            .ok_or_else(|| Error::RouteUnavailable("no pool for token pair".to_string()))?;
        let amount_out = self.quoter.quote(token_in, token_out, amount_in, &pool)?;
        if &amount_out < amount_out_min {
            return Err(Error::SlippageExceeded {
                min: amount_out_min.to_string(),
                actual: amount_out.to_string(),
            });
        }

        let payload = bridge_payload(pool.pool_id, &amount_out);
        let (provider, fee_needed) = self
            .bridges
            .select_cheapest(src_chain, dst_chain, &payload)
            .await?;
        if fee_attached < &fee_needed {
            return Err(Error::InsufficientFee {
                needed: fee_needed.to_string(),
                attached: fee_attached.to_string(),
            });
        }

        let (new_reserve0, new_reserve1) = apply_swap(&pool, token_in, amount_in, &amount_out)?;
        let tx_hash = random_tx_hash();
        let mut tx = self.db.begin().await.map_err(Error::from)?;
        PoolRepository::update_reserves(&mut tx, pool.pool_id, &new_reserve0, &new_reserve1, &pool.liquidity)
            .await?;
        tx.commit().await.map_err(Error::from)?;

        self.transactions
            .create(&NewTransaction {
                tx_hash,
                tx_type: TransactionType::Swap,
                user: caller,
                pool_id: Some(pool.pool_id),
                amount_in: Some(amount_in.clone()),
                amount_out: Some(amount_out.clone()),
            })
            .await?;

        // interactions: dispatch through the chosen bridge with bounded retry.
        let send_result = retry::with_backoff(BRIDGE_RETRY_CAP, BRIDGE_RETRY_BASE_DELAY, || {
            self.bridges.send(provider, src_chain, dst_chain, &payload)
        })
        .await;
        if let Err(err) = send_result {
            tracing::error!(%caller, error = %err, "bridge dispatch failed after retries");
            self.transactions.confirm(tx_hash, TransactionStatus::Failed, 0).await?;
            return Err(err);
        }
        self.transactions.confirm(tx_hash, TransactionStatus::Confirmed, 0).await?;

        // refund: attempted last; a failure here is logged and tracked as a
        // debt, never unwinds the dispatch that already happened.
        let fee_refunded = fee_attached - &fee_needed;
        if let Err(err) = self.record_refund_if_needed(caller, &fee_refunded).await {
            tracing::error!(%caller, error = %err, "failed to record refund credit");
        }

        Ok(ExecutionReceipt {
            amount_out,
            fee_refunded,
            tx_hash,
        })
    }

    /// Executes a multi-path route: one local swap followed by
    /// `chain_path.len() - 1` bridge dispatches, each independently retried.
    pub async fn execute_multi_path_route(
        &self,
        caller: Address,
        token_in: Address,
        token_out: Address,
        amount_in: &BigDecimal,
        amount_out_min: &BigDecimal,
        deadline_unix: i64,
        chain_path: &[ChainId],
        fee_attached: &BigDecimal,
    ) -> Result<ExecutionReceipt> {
        let _guard = self
            .guards
            .try_acquire(caller)
            .ok_or_else(|| Error::Conflict("an execute is already in flight for this address".to_string()))?;

        if chain_path.len() < MIN_PATH_LEN || chain_path.len() > MAX_PATH_LEN {
            return Err(Error::InvalidInput(format!(
                "chainPath length must be in [{MIN_PATH_LEN}, {MAX_PATH_LEN}], got {}",
                chain_path.len()
            )));
        }
        if Utc::now().timestamp() > deadline_unix {
            return Err(Error::DeadlineExpired);
        }
        Self::validate_distinct_tokens(token_in, token_out)?;
        let pool = self
            .pools
            .get_by_token_pair(token_in, token_out)
            .await?
            .ok_or_else(|| Error::RouteUnavailable("no pool for token pair".to_string()))?;
        let amount_out = self.quoter.quote(token_in, token_out, amount_in, &pool)?;
        if &amount_out < amount_out_min {
            return Err(Error::SlippageExceeded {
                min: amount_out_min.to_string(),
                actual: amount_out.to_string(),
            });
        }

        let payload = bridge_payload(pool.pool_id, &amount_out);
        let mut total_fee_needed = BigDecimal::from(0);
        let mut legs = Vec::with_capacity(chain_path.len() - 1);
        for window in chain_path.windows(2) {
            let (src_chain, dst_chain) = (window[0], window[1]);
            let (provider, fee) = self
                .bridges
                .select_cheapest(src_chain, dst_chain, &payload)
                .await?;
            total_fee_needed += &fee;
            legs.push((provider, src_chain, dst_chain));
        }
        if fee_attached < &total_fee_needed {
            return Err(Error::InsufficientFee {
                needed: total_fee_needed.to_string(),
                attached: fee_attached.to_string(),
            });
        }

        let (new_reserve0, new_reserve1) = apply_swap(&pool, token_in, amount_in, &amount_out)?;
        let tx_hash = random_tx_hash();
        let mut tx = self.db.begin().await.map_err(Error::from)?;
        PoolRepository::update_reserves(&mut tx, pool.pool_id, &new_reserve0, &new_reserve1, &pool.liquidity)
            .await?;
        tx.commit().await.map_err(Error::from)?;

        self.transactions
            .create(&NewTransaction {
                tx_hash,
                tx_type: TransactionType::Swap,
                user: caller,
                pool_id: Some(pool.pool_id),
                amount_in: Some(amount_in.clone()),
                amount_out: Some(amount_out.clone()),
            })
            .await?;

        for (provider, src_chain, dst_chain) in legs {
            let payload = payload.clone();
            let send_result = retry::with_backoff(BRIDGE_RETRY_CAP, BRIDGE_RETRY_BASE_DELAY, || {
                self.bridges.send(provider, src_chain, dst_chain, &payload)
            })
            .await;
            if let Err(err) = send_result {
                tracing::error!(%caller, error = %err, "bridge dispatch failed after retries");
                self.transactions.confirm(tx_hash, TransactionStatus::Failed, 0).await?;
                return Err(err);
            }
        }
        self.transactions.confirm(tx_hash, TransactionStatus::Confirmed, 0).await?;

        let fee_refunded = fee_attached - &total_fee_needed;
        if let Err(err) = self.record_refund_if_needed(caller, &fee_refunded).await {
            tracing::error!(%caller, error = %err, "failed to record refund credit");
        }

        Ok(ExecutionReceipt {
            amount_out,
            fee_refunded,
            tx_hash,
        })
    }

    async fn record_refund_if_needed(&self, caller: Address, amount: &BigDecimal) -> Result<()> {
        if amount <= &BigDecimal::from(0) {
            return Ok(());
        }
        // The refund itself isn't modeled as an on-chain transfer here; the
        // off-chain control plane's job is to track that it's owed, per the
        // failedRefunds debt ledger (§4.4). A real settlement path would
        // retry the transfer before falling back to this ledger.
        self.failed_refunds
            .record(caller, amount, "fee refund pending settlement")
            .await?;
        Ok(())
    }
}

/// Computes the post-swap reserves for `apply_swap`'s side-effect phase.
/// Returns `(reserve0', reserve1')` regardless of which side `token_in` is.
fn apply_swap(
    pool: &model::Pool,
    token_in: Address,
    amount_in: &BigDecimal,
    amount_out: &BigDecimal,
) -> Result<(BigDecimal, BigDecimal)> {
    if token_in == pool.token0 {
        Ok((&pool.reserve0 + amount_in, &pool.reserve1 - amount_out))
    } else if token_in == pool.token1 {
        Ok((&pool.reserve0 - amount_out, &pool.reserve1 + amount_in))
    } else {
        Err(Error::InvalidInput("tokenIn is not part of this pool".to_string()))
    }
}

fn bridge_payload(pool_id: PoolId, amount_out: &BigDecimal) -> Vec<u8> {
    format!("{pool_id}:{amount_out}").into_bytes()
}

fn random_tx_hash() -> TxHash {
    TxHash(ByteArray(rand::random()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_swap_increases_reserve_in_and_decreases_reserve_out() {
        let token0: Address = "0x0000000000000000000000000000000000000001".parse().unwrap();
        let token1: Address = "0x0000000000000000000000000000000000000002".parse().unwrap();
        let pool = model::Pool {
            id: 1,
            pool_id: PoolId::derive(token0, token1),
            token0,
            token1,
            fee_rate: BigDecimal::from(0),
            reserve0: BigDecimal::from(1000),
            reserve1: BigDecimal::from(1000),
            liquidity: BigDecimal::from(0),
            tvl: BigDecimal::from(0),
            volume_24h: BigDecimal::from(0),
            active: true,
            created_at: chrono::Utc::now(),
            deleted_at: None,
        };
        let (r0, r1) = apply_swap(&pool, token0, &BigDecimal::from(100), &BigDecimal::from(90)).unwrap();
        assert_eq!(r0, BigDecimal::from(1100));
        assert_eq!(r1, BigDecimal::from(910));
    }

    #[test]
    fn apply_swap_rejects_unrelated_token() {
        let token0: Address = "0x0000000000000000000000000000000000000001".parse().unwrap();
        let token1: Address = "0x0000000000000000000000000000000000000002".parse().unwrap();
        let other: Address = "0x0000000000000000000000000000000000000003".parse().unwrap();
        let pool = model::Pool {
            id: 1,
            pool_id: PoolId::derive(token0, token1),
            token0,
            token1,
            fee_rate: BigDecimal::from(0),
            reserve0: BigDecimal::from(1000),
            reserve1: BigDecimal::from(1000),
            liquidity: BigDecimal::from(0),
            tvl: BigDecimal::from(0),
            volume_24h: BigDecimal::from(0),
            active: true,
            created_at: chrono::Utc::now(),
            deleted_at: None,
        };
        let err = apply_swap(&pool, other, &BigDecimal::from(100), &BigDecimal::from(90)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
