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

/// A transaction hash: a 66-char `0x`-prefixed hex string, unique per
/// transaction log row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxHash(pub ByteArray<32>);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid tx hash: expected 66-char 0x-prefixed hex")]
pub struct InvalidTxHash;

impl TxHash {
    pub fn to_hex(self) -> String {
        format!("0x{}", const_hex::encode(self.0 .0))
    }
}

impl FromStr for TxHash {
    type Err = InvalidTxHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 64 {
            return Err(InvalidTxHash);
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidTxHash)?;
        Ok(Self(ByteArray(bytes)))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TxHash::from_str(&s).map_err(de::Error::custom)
    }
}

impl Type<Postgres> for TxHash {
    fn type_info() -> PgTypeInfo {
        <ByteArray<32> as Type<Postgres>>::type_info()
    }
}

impl PgHasArrayType for TxHash {
    fn array_type_info() -> PgTypeInfo {
        <ByteArray<32> as PgHasArrayType>::array_type_info()
    }
}

impl Decode<'_, Postgres> for TxHash {
    fn decode(value: PgValueRef<'_>) -> Result<Self, BoxDynError> {
        Ok(Self(ByteArray::decode(value)?))
    }
}

impl Encode<'_, Postgres> for TxHash {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        self.0.encode_by_ref(buf)
    }
}
