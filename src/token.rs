//! HMAC-signed session tokens.
//!
//! A token is `base64url(payload).base64url(sig)` where the payload is JSON
//! `{sub, iat, exp}` and the signature is HMAC-SHA256 over the encoded
//! payload using the server-held secret. Tokens are valid for exactly 24
//! hours from issuance; there is no refresh and no server-side revocation —
//! expiry plus client-side discard are the only invalidation paths.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Session lifetime: 24 hours (seconds).
pub const TOKEN_TTL_SECS: u64 = 24 * 3600;

type HmacSha256 = Hmac<Sha256>;

/// Why a token failed verification. Exhaustive so the gateway's branching
/// needs no exception machinery.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature mismatch")]
    SignatureMismatch,
    #[error("token has expired")]
    Expired,
}

#[derive(Deserialize)]
struct Claims {
    /// Owner (user) id the token is bound to.
    sub: String,
    /// Issued-at, Unix seconds.
    iat: u64,
    /// Expiry, Unix seconds.
    exp: u64,
}

/// Issues and verifies signed session tokens.
pub struct TokenService {
    key: Vec<u8>,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    /// Mint a token bound to `owner_id`, valid for [`TOKEN_TTL_SECS`].
    pub fn issue(&self, owner_id: &str) -> String {
        self.issue_at(owner_id, epoch_secs())
    }

    fn issue_at(&self, owner_id: &str, now: u64) -> String {
        let claims = serde_json::json!({
            "sub": owner_id,
            "iat": now,
            "exp": now + TOKEN_TTL_SECS,
        });
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        let sig = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));
        format!("{payload}.{sig}")
    }

    /// Verify a token and return the owner id it is bound to.
    ///
    /// The signature is checked before the payload is ever parsed, so a
    /// forged payload cannot influence deserialization.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, epoch_secs())
    }

    fn verify_at(&self, token: &str, now: u64) -> Result<String, TokenError> {
        let (payload, sig) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| TokenError::Malformed)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig_bytes)
            .map_err(|_| TokenError::SignatureMismatch)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        // HMAC accepts keys of any length; new_from_slice cannot fail here.
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
