use std::collections::HashMap;
use std::time::Duration;

use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::AuthKey;
use crate::error::RpcError;

/// Claims carried by a validated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, used as the run's user id for tracing
    pub sub: String,
    /// Expiry as unix seconds
    pub exp: i64,
}

/// Validates signed bearer tokens against a named key set.
///
/// Token format: `<hex(claims-json)>.<key-id>.<hex(signature)>` where the
/// signature is SHA-256 over the key secret and the claims segment. A token
/// is rejected on unknown key id, signature mismatch, or expiry. Validated
/// tokens are cached briefly so repeated requests skip re-verification.
pub struct TokenValidator {
    keys: HashMap<String, Vec<u8>>,
    cache: Cache<String, Claims>,
}

impl TokenValidator {
    pub fn new(keys: &[AuthKey]) -> Self {
        if keys.is_empty() {
            tracing::warn!("no auth keys configured; every query will be rejected");
        }
        Self {
            keys: keys
                .iter()
                .map(|k| (k.id.clone(), k.secret.clone()))
                .collect(),
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(60))
                .build(),
        }
    }

    pub fn validate(&self, token: &str) -> Result<Claims, RpcError> {
        if let Some(claims) = self.cache.get(token) {
            // Cached entries can outlive their own expiry
            if claims.exp > now_unix() {
                return Ok(claims);
            }
            return Err(RpcError::Unauthorized("token expired".to_string()));
        }

        let mut parts = token.split('.');
        let (claims_hex, key_id, sig_hex) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(c), Some(k), Some(s), None) => (c, k, s),
            _ => return Err(RpcError::Unauthorized("malformed token".to_string())),
        };

        let secret = self
            .keys
            .get(key_id)
            .ok_or_else(|| RpcError::Unauthorized(format!("unknown key id: {}", key_id)))?;

        if sign(secret, claims_hex) != sig_hex {
            return Err(RpcError::Unauthorized("signature mismatch".to_string()));
        }

        let claims_json = hex::decode(claims_hex)
            .map_err(|_| RpcError::Unauthorized("malformed claims segment".to_string()))?;
        let claims: Claims = serde_json::from_slice(&claims_json)
            .map_err(|_| RpcError::Unauthorized("malformed claims".to_string()))?;

        if claims.exp <= now_unix() {
            return Err(RpcError::Unauthorized("token expired".to_string()));
        }

        self.cache.insert(token.to_string(), claims.clone());
        Ok(claims)
    }
}

/// Build a signed token for `claims` under the given key. Counterpart of
/// `TokenValidator::validate`, used by issuing scripts and tests.
pub fn sign_token(key_id: &str, secret: &[u8], claims: &Claims) -> String {
    let claims_hex = hex::encode(serde_json::to_vec(claims).expect("claims serialize"));
    let sig = sign(secret, &claims_hex);
    format!("{}.{}.{}", claims_hex, key_id, sig)
}

fn sign(secret: &[u8], payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(b".");
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
