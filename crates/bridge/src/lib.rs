//! Uniform interface over heterogeneous cross-chain messaging providers
//! (§4.2). Dispatch is a tagged variant rather than a trait object, per the
//! design note on bridge-adapter dispatch: adding a third provider means
//! extending the tag and the routing table, nothing else.

mod ccip;
mod hyperlane;

use {
    bigdecimal::BigDecimal,
    model::{ChainId, Error, Result},
    moka::future::Cache,
    std::time::Duration,
};

pub use ccip::Ccip;
pub use hyperlane::Hyperlane;

/// A bridge message identifier handed back by `send`, opaque to callers.
pub type MessageId = String;

/// The uniform capability set every provider exposes (§4.2).
#[async_trait::async_trait]
pub trait BridgeAdapter: Send + Sync {
    /// Whether this adapter's routing table carries a lane for the pair.
    fn supports(&self, src_chain: ChainId, dst_chain: ChainId) -> bool;
    async fn estimate_fee(&self, dst_chain: ChainId, payload: &[u8]) -> Result<BigDecimal>;
    async fn send(&self, dst_chain: ChainId, payload: &[u8]) -> Result<MessageId>;
    async fn delivered(&self, src_chain: ChainId, dst_chain: ChainId) -> Result<bool>;
}

/// The provider tag carried alongside a computed route (§9 "Dynamic dispatch
/// to bridge adapters").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Ccip,
    Hyperlane,
}

impl From<Provider> for model::BridgeProvider {
    fn from(value: Provider) -> Self {
        match value {
            Provider::Ccip => model::BridgeProvider::Ccip,
            Provider::Hyperlane => model::BridgeProvider::Hyperlane,
        }
    }
}

/// Default idempotency window: a retried `send` for the same
/// `(src, dst, payloadHash)` within this window returns the original
/// message id instead of dispatching twice (§4.2).
pub const IDEMPOTENCY_WINDOW: Duration = Duration::from_secs(300);

/// The full set of configured providers plus the dedup cache backing
/// `send`'s idempotency guarantee.
pub struct BridgeAdapterSet {
    ccip: Ccip,
    hyperlane: Hyperlane,
    sent: Cache<String, MessageId>,
}

impl BridgeAdapterSet {
    pub fn new(ccip: Ccip, hyperlane: Hyperlane) -> Self {
        Self {
            ccip,
            hyperlane,
            sent: Cache::builder().time_to_live(IDEMPOTENCY_WINDOW).build(),
        }
    }

    fn adapter(&self, provider: Provider) -> &dyn BridgeAdapter {
        match provider {
            Provider::Ccip => &self.ccip,
            Provider::Hyperlane => &self.hyperlane,
        }
    }

    pub async fn estimate_fee(
        &self,
        provider: Provider,
        dst_chain: ChainId,
        payload: &[u8],
    ) -> Result<BigDecimal> {
        self.adapter(provider).estimate_fee(dst_chain, payload).await
    }

    /// Selects the lower of the two providers' fee estimates for a given
    /// lane, tie-breaking to CCIP (§4.4 "Bridge selection monotonicity").
    /// Returns the selected provider and its fee. Fails `RouteUnavailable`
    /// if neither provider carries the lane.
    pub async fn select_cheapest(
        &self,
        src_chain: ChainId,
        dst_chain: ChainId,
        payload: &[u8],
    ) -> Result<(Provider, BigDecimal)> {
        let ccip_ok = self.ccip.supports(src_chain, dst_chain);
        let hyperlane_ok = self.hyperlane.supports(src_chain, dst_chain);
        match (ccip_ok, hyperlane_ok) {
            (false, false) => Err(Error::RouteUnavailable(format!(
                "no bridge lane {src_chain} -> {dst_chain}"
            ))),
            (true, false) => {
                let fee = self.ccip.estimate_fee(dst_chain, payload).await?;
                Ok((Provider::Ccip, fee))
            }
            (false, true) => {
                let fee = self.hyperlane.estimate_fee(dst_chain, payload).await?;
                Ok((Provider::Hyperlane, fee))
            }
            (true, true) => {
                let ccip_fee = self.ccip.estimate_fee(dst_chain, payload).await?;
                let hyperlane_fee = self.hyperlane.estimate_fee(dst_chain, payload).await?;
                if ccip_fee <= hyperlane_fee {
                    Ok((Provider::Ccip, ccip_fee))
                } else {
                    Ok((Provider::Hyperlane, hyperlane_fee))
                }
            }
        }
    }

    /// Idempotent send: a repeated call for the same `(src, dst, payload)`
    /// within the idempotency window returns the message id of the original
    /// attempt instead of dispatching again (§4.2).
    pub async fn send(
        &self,
        provider: Provider,
        src_chain: ChainId,
        dst_chain: ChainId,
        payload: &[u8],
    ) -> Result<MessageId> {
        let adapter = self.adapter(provider);
        if !adapter.supports(src_chain, dst_chain) {
            return Err(Error::RouteUnavailable(format!(
                "{provider:?} has no lane {src_chain} -> {dst_chain}"
            )));
        }
        let key = dedup_key(provider, src_chain, dst_chain, payload);
        if let Some(existing) = self.sent.get(&key).await {
            tracing::debug!(%key, "bridge send deduplicated within idempotency window");
            return Ok(existing);
        }
        let message_id = adapter.send(dst_chain, payload).await?;
        self.sent.insert(key, message_id.clone()).await;
        Ok(message_id)
    }

    pub async fn delivered(
        &self,
        provider: Provider,
        src_chain: ChainId,
        dst_chain: ChainId,
    ) -> Result<bool> {
        self.adapter(provider).delivered(src_chain, dst_chain).await
    }
}

fn dedup_key(provider: Provider, src_chain: ChainId, dst_chain: ChainId, payload: &[u8]) -> String {
    let payload_hash = blake3::hash(payload).to_hex();
    format!("{provider:?}:{}:{}:{payload_hash}", src_chain.0, dst_chain.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn select_cheapest_ties_to_ccip() {
        let set = BridgeAdapterSet::new(
            Ccip::new(vec![(ChainId::ETHEREUM, ChainId::BASE)], "100"),
            Hyperlane::new(vec![(ChainId::ETHEREUM, ChainId::BASE)], "100"),
        );
        let (provider, _) = set
            .select_cheapest(ChainId::ETHEREUM, ChainId::BASE, b"payload")
            .await
            .unwrap();
        assert_eq!(provider, Provider::Ccip);
    }

    #[tokio::test]
    async fn select_cheapest_prefers_lower_fee() {
        let set = BridgeAdapterSet::new(
            Ccip::new(vec![(ChainId::ETHEREUM, ChainId::BASE)], "100"),
            Hyperlane::new(vec![(ChainId::ETHEREUM, ChainId::BASE)], "80"),
        );
        let (provider, fee) = set
            .select_cheapest(ChainId::ETHEREUM, ChainId::BASE, b"payload")
            .await
            .unwrap();
        assert_eq!(provider, Provider::Hyperlane);
        assert_eq!(fee, BigDecimal::from(80));
    }

    #[tokio::test]
    async fn send_is_idempotent_within_window() {
        let set = BridgeAdapterSet::new(
            Ccip::new(vec![(ChainId::ETHEREUM, ChainId::BASE)], "100"),
            Hyperlane::new(vec![(ChainId::ETHEREUM, ChainId::BASE)], "80"),
        );
        let a = set
            .send(Provider::Ccip, ChainId::ETHEREUM, ChainId::BASE, b"payload")
            .await
            .unwrap();
        let b = set
            .send(Provider::Ccip, ChainId::ETHEREUM, ChainId::BASE, b"payload")
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn unsupported_lane_is_route_unavailable() {
        let set = BridgeAdapterSet::new(
            Ccip::new(vec![(ChainId::ETHEREUM, ChainId::BASE)], "100"),
            Hyperlane::new(vec![(ChainId::ETHEREUM, ChainId::BASE)], "80"),
        );
        let err = set
            .send(
                Provider::Ccip,
                ChainId::ETHEREUM,
                ChainId::GNOSIS,
                b"payload",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RouteUnavailable(_)));
    }
}
