use {
    k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey},
    model::Address,
    sha3::{Digest, Keccak256},
};

/// Tag prepended to every challenge message so a signature produced for this
/// service can never be replayed against another app reusing the same
/// wallet (§4.5 step 2).
pub const APP_TAG: &str = "AetherRouter";

/// Builds the canonical challenge message the client must sign:
/// `"<AppTag> Auth:<nonce>:<timestamp>"`.
pub fn canonical_message(nonce: &str, timestamp: i64) -> String {
    format!("{APP_TAG} Auth:{nonce}:{timestamp}")
}

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("signature is not 65 bytes")]
    WrongLength,
    #[error("malformed signature hex")]
    Malformed,
    #[error("signature does not recover to the claimed address")]
    Mismatch,
}

/// Hashes `message` under the chain-native personal-message prefix
/// (`"\x19Ethereum Signed Message:\n<len><msg>"`) with Keccak-256 — the
/// digest ECDSA recovery is actually performed over.
fn eip191_prehash(message: &str) -> [u8; 32] {
    let prefixed = format!("\x19Ethereum Signed Message:\n{}{message}", message.len());
    Keccak256::digest(prefixed.as_bytes()).into()
}

/// Derives the Ethereum address a recovered public key corresponds to:
/// Keccak-256 of the uncompressed, prefix-stripped public key, last 20 bytes
/// (§8 "Signature recovery").
fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let uncompressed = key.to_encoded_point(false);
    let hash = Keccak256::digest(&uncompressed.as_bytes()[1..]);
    Address::from_slice(&hash[12..]).expect("keccak256 output is 32 bytes, last 20 always valid")
}

/// Recovers the signer of `message` under the chain-native personal-message
/// prefix via `k256`'s recoverable-ECDSA support and checks it matches
/// `claimed` (§4.5 step 4, §8 "Signature recovery").
pub fn verify(signature_hex: &str, message: &str, claimed: Address) -> Result<(), SignatureError> {
    let bytes = hex::decode(signature_hex.strip_prefix("0x").unwrap_or(signature_hex))
        .map_err(|_| SignatureError::Malformed)?;
    if bytes.len() != 65 {
        return Err(SignatureError::WrongLength);
    }
    let signature = K256Signature::from_slice(&bytes[..64]).map_err(|_| SignatureError::Malformed)?;
    let recovery_id = RecoveryId::from_byte(bytes[64].saturating_sub(27)).ok_or(SignatureError::Malformed)?;
    let prehash = eip191_prehash(message);
    let recovered = VerifyingKey::recover_from_prehash(&prehash, &signature, recovery_id)
        .map_err(|_| SignatureError::Malformed)?;
    if address_from_verifying_key(&recovered) == claimed {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        k256::ecdsa::{signature::hazmat::PrehashSigner, SigningKey},
    };

    fn sign(private_key: [u8; 32], message: &str) -> (String, Address) {
        let signing_key = SigningKey::from_bytes((&private_key).into()).unwrap();
        let prehash = eip191_prehash(message);
        let (sig, recovery_id): (K256Signature, RecoveryId) =
            signing_key.sign_prehash_recoverable(&prehash).unwrap();
        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&sig.to_bytes());
        bytes[64] = 27 + recovery_id.to_byte();
        let sig_hex = const_hex::encode(bytes);
        let address = address_from_verifying_key(signing_key.verifying_key());
        (sig_hex, address)
    }

    #[test]
    fn recovers_the_signing_address() {
        let message = canonical_message("abc123", 1_700_000_000);
        let (sig_hex, address) = sign([7u8; 32], &message);
        assert!(verify(&sig_hex, &message, address).is_ok());
    }

    #[test]
    fn rejects_a_mismatched_address() {
        let other: Address = "0x0000000000000000000000000000000000dead".parse().unwrap();
        let message = canonical_message("abc123", 1_700_000_000);
        let (sig_hex, address) = sign([7u8; 32], &message);
        assert_ne!(address, other);
        assert!(verify(&sig_hex, &message, other).is_err());
    }

    #[test]
    fn rejects_wrong_length_signature() {
        let message = canonical_message("abc123", 1_700_000_000);
        let claimed: Address = "0x0000000000000000000000000000000000dead".parse().unwrap();
        assert!(matches!(
            verify("0x1234", &message, claimed),
            Err(SignatureError::WrongLength)
        ));
    }
}
