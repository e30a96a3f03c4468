use serde::{de, Deserialize, Deserializer};

/// A chain identifier. Unlike the teacher's closed `Chain` enum (which only
/// ever dispatched on a handful of networks it deployed settlement contracts
/// to) routes here may span an arbitrary path of chains (§4.4
/// `MultiPathRoute`), so this is an open newtype over the numeric id rather
/// than a closed enum. Well-known ids still get a human name for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const ETHEREUM: ChainId = ChainId(1);
    pub const ARBITRUM_ONE: ChainId = ChainId(42161);
    pub const BASE: ChainId = ChainId(8453);
    pub const GNOSIS: ChainId = ChainId(100);
    pub const OPTIMISM: ChainId = ChainId(10);

    pub fn name(&self) -> &'static str {
        match self.0 {
            1 => "Ethereum",
            10 => "Optimism",
            100 => "Gnosis",
            8453 => "Base",
            42161 => "Arbitrum One",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl serde::Serialize for ChainId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl de::Visitor<'_> for Visitor {
            type Value = ChainId;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a u64 or numeric string chain id")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ChainId(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.parse::<u64>().map(ChainId).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}
