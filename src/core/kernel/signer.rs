use crate::core::config::Credentials;
use crate::core::errors::ExchangeError;
use crate::core::kernel::canonical::RequestParams;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the access key on private requests
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Result type for signing operations: (headers, signed payload)
pub type SignatureResult = Result<(HashMap<String, String>, SignedPayload), ExchangeError>;

/// Canonical body that was signed, and its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    /// Sorted parameters followed by `timestamp=<ms>`
    pub body: String,
    /// Lowercase hex HMAC-SHA256 of `body`
    pub signature: String,
}

impl SignedPayload {
    /// The exact bytes to put on the wire: `body&signature=<hex>`
    pub fn into_request_body(self) -> String {
        format!("{}&signature={}", self.body, self.signature)
    }
}

/// Signer trait for request authentication
///
/// Implementations must be pure: the same parameters, timestamp and key
/// always produce the same payload.
pub trait Signer: Send + Sync {
    /// Sign a request and return the headers and the signed payload
    ///
    /// # Arguments
    /// * `params` - Request parameters, in any insertion order
    /// * `timestamp` - Request timestamp in milliseconds
    fn sign_request(&self, params: &RequestParams, timestamp: u64) -> SignatureResult;
}

/// HMAC-SHA256 signer over the canonical parameter string
pub struct HmacSigner {
    credentials: Arc<Credentials>,
}

impl HmacSigner {
    pub fn new(credentials: Arc<Credentials>) -> Self {
        Self { credentials }
    }

    /// Canonical string with the timestamp appended as the last field
    pub fn payload(params: &RequestParams, timestamp: u64) -> String {
        let canonical = params.canonical_string();
        if canonical.is_empty() {
            format!("timestamp={}", timestamp)
        } else {
            format!("{}&timestamp={}", canonical, timestamp)
        }
    }

    fn generate_signature(&self, payload: &str) -> Result<String, ExchangeError> {
        hmac_sha256_hex(self.credentials.secret_key(), payload)
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner").finish_non_exhaustive()
    }
}

impl Signer for HmacSigner {
    fn sign_request(&self, params: &RequestParams, timestamp: u64) -> SignatureResult {
        let body = Self::payload(params, timestamp);
        let signature = self.generate_signature(&body)?;

        let mut headers = HashMap::new();
        headers.insert(
            API_KEY_HEADER.to_string(),
            self.credentials.access_key().to_string(),
        );

        Ok((headers, SignedPayload { body, signature }))
    }
}

/// `sign(params, secret)` at a given timestamp, without any headers
pub fn sign(
    params: &RequestParams,
    secret_key: &str,
    timestamp: u64,
) -> Result<SignedPayload, ExchangeError> {
    let body = HmacSigner::payload(params, timestamp);
    let signature = hmac_sha256_hex(secret_key, &body)?;
    Ok(SignedPayload { body, signature })
}

pub fn hmac_sha256_hex(secret_key: &str, message: &str) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| ExchangeError::Signature(format!("Failed to create HMAC: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED_TS: u64 = 1_700_000_000_000;

    fn order_params() -> RequestParams {
        RequestParams::new()
            .with("symbol", "BTRUSDT")
            .with("side", "BUY")
            .with("type", "LIMIT")
            .with("price", "1.23")
            .with("quantity", "10")
    }

    #[test]
    fn test_fixed_vector() {
        let signed = sign(&order_params(), "s3cr3t", FIXED_TS).unwrap();

        assert_eq!(
            signed.body,
            "price=1.23&quantity=10&side=BUY&symbol=BTRUSDT&type=LIMIT&timestamp=1700000000000"
        );
        assert_eq!(
            signed.signature,
            "e56a9b4144278bc9f9b1fd5501448a7cad9cf8d750db6c9df038651e76d49259"
        );
        assert_eq!(
            signed.into_request_body(),
            "price=1.23&quantity=10&side=BUY&symbol=BTRUSDT&type=LIMIT&timestamp=1700000000000\
             &signature=e56a9b4144278bc9f9b1fd5501448a7cad9cf8d750db6c9df038651e76d49259"
        );
    }

    #[test]
    fn test_empty_params_sign_timestamp_only() {
        let signed = sign(&RequestParams::new(), "s3cr3t", FIXED_TS).unwrap();
        assert_eq!(signed.body, "timestamp=1700000000000");
        assert_eq!(
            signed.signature,
            "f46ab3ba35e725ca68d5a9bcd2499ff88a48f3c14e899a8c047f7b6cf82b6adf"
        );
    }

    #[test]
    fn test_deterministic_and_sensitive_to_values() {
        let first = sign(&order_params(), "s3cr3t", FIXED_TS).unwrap();
        let second = sign(&order_params(), "s3cr3t", FIXED_TS).unwrap();
        assert_eq!(first, second);

        let changed = sign(&order_params().with("quantity", "11"), "s3cr3t", FIXED_TS).unwrap();
        assert_ne!(first.signature, changed.signature);
        assert_eq!(
            changed.signature,
            "642b980523cddaa13806f9dfdd57dc0f3fb3549299f1da1901088c100bf3be43"
        );

        let later = sign(&order_params(), "s3cr3t", FIXED_TS + 1).unwrap();
        assert_ne!(first.signature, later.signature);
    }

    #[test]
    fn test_hmac_signer_sets_api_key_header() {
        let signer = HmacSigner::new(Arc::new(Credentials::new("access", "s3cr3t")));
        let (headers, payload) = signer.sign_request(&order_params(), FIXED_TS).unwrap();

        assert_eq!(headers.get(API_KEY_HEADER).map(String::as_str), Some("access"));
        assert_eq!(payload, sign(&order_params(), "s3cr3t", FIXED_TS).unwrap());
        assert_eq!(payload.signature.len(), 64);
        assert!(payload
            .signature
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
