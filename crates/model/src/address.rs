use {
    crate::byte_array::ByteArray,
    serde::{de, Deserialize, Deserializer, Serialize, Serializer},
    sqlx::{
        encode::IsNull,
        error::BoxDynError,
        postgres::{PgArgumentBuffer, PgHasArrayType, PgTypeInfo, PgValueRef},
        Decode, Encode, Postgres, Type,
    },
    std::{fmt, str::FromStr},
    thiserror::Error,
};

/// A wallet or contract address, the `(user, pool-owner, recipient)` key
/// throughout the system. Always stored and compared lowercased, the
/// canonical 42-char `0x`-prefixed hex form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub ByteArray<20>);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid address: expected 42-char 0x-prefixed hex")]
pub struct InvalidAddress;

impl Address {
    pub const ZERO: Address = Address(ByteArray([0u8; 20]));

    pub fn from_slice(bytes: &[u8]) -> Result<Self, InvalidAddress> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| InvalidAddress)?;
        Ok(Self(ByteArray(arr)))
    }

    pub fn to_hex(self) -> String {
        format!("0x{}", const_hex::encode(self.0 .0))
    }
}

impl FromStr for Address {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 40 {
            return Err(InvalidAddress);
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidAddress)?;
        Ok(Self(ByteArray(bytes)))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl From<alloy_primitives::Address> for Address {
    fn from(value: alloy_primitives::Address) -> Self {
        Self(ByteArray(*value.0))
    }
}

impl From<Address> for alloy_primitives::Address {
    fn from(value: Address) -> Self {
        alloy_primitives::Address::from(value.0 .0)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(de::Error::custom)
    }
}

impl Type<Postgres> for Address {
    fn type_info() -> PgTypeInfo {
        <ByteArray<20> as Type<Postgres>>::type_info()
    }
}

impl PgHasArrayType for Address {
    fn array_type_info() -> PgTypeInfo {
        <ByteArray<20> as PgHasArrayType>::array_type_info()
    }
}

impl Decode<'_, Postgres> for Address {
    fn decode(value: PgValueRef<'_>) -> Result<Self, BoxDynError> {
        Ok(Self(ByteArray::decode(value)?))
    }
}

impl Encode<'_, Postgres> for Address {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        self.0.encode_by_ref(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!(
            "not-an-address-at-all-not-an-address-at-all"
                .parse::<Address>()
                .is_err()
        );
    }

    #[test]
    fn round_trips_through_display() {
        let addr: Address = "0x0000000000000000000000000000000000000001"
            .parse()
            .unwrap();
        assert_eq!(addr.to_hex().len(), 42);
        assert_eq!(
            addr.to_hex(),
            "0x0000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn serde_round_trip() {
        let addr: Address = "0x000000000000000000000000000000000000abcd"
            .parse()
            .unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
