use model::{Address, AuthCode, Error};

/// A parsed `Authorization: Bearer <sigHex>:<nonce>:<timestamp>:<address>`
/// token (§4.5 step 3, §6 "Bearer token format"). Exactly four
/// colon-separated fields.
pub struct BearerToken {
    pub signature_hex: String,
    pub nonce: String,
    pub timestamp: i64,
    pub address: Address,
}

impl BearerToken {
    pub fn parse(header_value: &str) -> Result<Self, Error> {
        let raw = header_value
            .strip_prefix("Bearer ")
            .ok_or(Error::Unauthenticated(AuthCode::InvalidFormat))?;
        let fields: Vec<&str> = raw.split(':').collect();
        let [sig, nonce, ts, addr] = fields[..] else {
            return Err(Error::Unauthenticated(AuthCode::InvalidFormat));
        };
        let timestamp: i64 = ts
            .parse()
            .map_err(|_| Error::Unauthenticated(AuthCode::InvalidFormat))?;
        let address: Address = addr
            .parse()
            .map_err(|_| Error::Unauthenticated(AuthCode::InvalidFormat))?;
        Ok(Self {
            signature_hex: sig.to_string(),
            nonce: nonce.to_string(),
            timestamp,
            address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_token_without_four_fields() {
        let err = BearerToken::parse("Bearer abc:def:123").unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(AuthCode::InvalidFormat)));
    }

    #[test]
    fn rejects_a_missing_bearer_prefix() {
        let err = BearerToken::parse("abc:def:123:0x0000000000000000000000000000000000dead")
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(AuthCode::InvalidFormat)));
    }

    #[test]
    fn parses_a_well_formed_token() {
        let token = BearerToken::parse(
            "Bearer deadbeef:noncevalue:1700000000:0x0000000000000000000000000000000000dead",
        )
        .unwrap();
        assert_eq!(token.signature_hex, "deadbeef");
        assert_eq!(token.nonce, "noncevalue");
        assert_eq!(token.timestamp, 1_700_000_000);
    }
}
