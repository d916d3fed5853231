/*
[INPUT]:  API secret and the login payload string
[OUTPUT]: Lowercase hex HMAC-SHA256 signatures
[POS]:    Auth layer - cryptographic signing for the login request
[UPDATE]: When changing signing algorithm or payload layout
*/

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Result, StreamError};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signer keyed by the API secret
#[derive(Clone)]
pub struct HmacSigner {
    secret: Vec<u8>,
}

impl HmacSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Sign `payload` and return the hex digest
    pub fn sign(&self, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|err| StreamError::Config(format!("invalid hmac key: {err}")))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// `method || nonce || api_key || nonce`
    pub fn login_payload(method: &str, nonce: &str, api_key: &str) -> String {
        format!("{method}{nonce}{api_key}{nonce}")
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner").field("secret", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        let signer = HmacSigner::new("key");
        let sig = signer.sign("The quick brown fox jumps over the lazy dog");
        assert_eq!(
            sig.ok().as_deref(),
            Some("f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8")
        );
    }

    #[test]
    fn test_login_signature() {
        let payload = HmacSigner::login_payload("public/auth", "1587846358253", "api_key_1");
        assert_eq!(payload, "public/auth1587846358253api_key_11587846358253");
        let sig = HmacSigner::new("secret").sign(&payload);
        assert_eq!(
            sig.ok().as_deref(),
            Some("40b252f4d7acf79534eda817acfa3d90708faf806027264f46fd3aaad49434a6")
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", HmacSigner::new("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
