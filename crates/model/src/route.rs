use {
    crate::{chain::ChainId, pool_id::PoolId},
    bigdecimal::BigDecimal,
    serde::{Serialize, Serializer},
};

/// The bridge provider a cross-chain route dispatches through. A tagged
/// variant set, not a trait object — adding a third provider means adding a
/// variant here and a branch in the `bridge` crate's adapter table, nowhere
/// else (per the spec's REDESIGN FLAGS note on dynamic dispatch).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BridgeProvider {
    Ccip,
    Hyperlane,
}

impl std::fmt::Display for BridgeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeProvider::Ccip => write!(f, "CCIP"),
            BridgeProvider::Hyperlane => write!(f, "Hyperlane"),
        }
    }
}

/// One hop of a route: trade through `pool_id` on `chain_id`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RouteHop {
    pub chain_id: ChainId,
    pub pool_id: PoolId,
}

/// An ephemeral, never-persisted description of a path from `token_in` to
/// `token_out` (§3 `Route`). Computed fresh on every quote request.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub hops: Vec<RouteHop>,
    pub bridge_provider: Option<BridgeProvider>,
    pub bridge_fee: Option<BigDecimal>,
}

/// Hand-written rather than derived: `bigdecimal`'s `serde` feature isn't
/// enabled workspace-wide (the `api` crate's handlers serialize every
/// `BigDecimal` as a string for the same reason), so `bridge_fee` is
/// serialized as a string here too.
impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Route", 3)?;
        state.serialize_field("hops", &self.hops)?;
        state.serialize_field("bridge_provider", &self.bridge_provider)?;
        state.serialize_field("bridge_fee", &self.bridge_fee.as_ref().map(BigDecimal::to_string))?;
        state.end()
    }
}

impl Route {
    pub fn single_hop(chain_id: ChainId, pool_id: PoolId) -> Self {
        Self {
            hops: vec![RouteHop { chain_id, pool_id }],
            bridge_provider: None,
            bridge_fee: None,
        }
    }

    /// The opaque encoded representation returned to callers (§4.4). Callers
    /// never parse this; it round-trips through `OptimalRoute`/execute calls
    /// as a bearer of intent. Hex encoding keeps `Route` idempotent to
    /// serialize byte-for-byte across repeated identical computations
    /// (§8 "Route idempotence").
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("Route serializes infallibly")
    }
}
