use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const ADMIN_ROLE: &str = "admin";

const MAC_KEY_CONTEXT: &str = "MEDTABLE admin token 2025-08-30 bearer credential mac";

/// Auth failures are always surfaced to the caller as rejected operations,
/// never as process faults. The messages are shown to humans as-is.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Wrong password.")]
    WrongPassword,

    #[error("Missing Authorization header.")]
    MissingCredential,

    #[error("Invalid token.")]
    WrongRole,

    #[error("Invalid or expired token.")]
    InvalidCredential,
}

/// The single claim set this system knows: a fixed role and an expiry.
/// There is exactly one privilege level, no per-user identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminClaims {
    pub role: String,
    pub exp: u64,
}

fn mac_key(secret: &str) -> [u8; 32] {
    blake3::derive_key(MAC_KEY_CONTEXT, secret.as_bytes())
}

fn mac(secret: &str, payload: &[u8]) -> blake3::Hash {
    blake3::keyed_hash(&mac_key(secret), payload)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Issue a signed, time-limited admin bearer token: base64url claims
/// followed by a keyed BLAKE3 MAC over the encoded claims.
pub fn sign_admin_token(secret: &str, ttl: Duration) -> String {
    let claims = AdminClaims {
        role: ADMIN_ROLE.to_string(),
        exp: unix_now().saturating_add(ttl.as_secs()),
    };
    // Claims are a plain struct with string and integer fields, this cannot fail.
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap_or_default());
    let signature = URL_SAFE_NO_PAD.encode(mac(secret, payload.as_bytes()).as_bytes());
    format!("{payload}.{signature}")
}

/// Decode and check a bearer token: signature, expiry, and the fixed role
/// claim. Any mismatch rejects the guarded operation before side effects.
pub fn verify_admin_token(secret: &str, token: &str) -> Result<AdminClaims, AuthError> {
    let (payload, signature) = token
        .split_once('.')
        .ok_or(AuthError::InvalidCredential)?;

    let given_mac: [u8; 32] = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| AuthError::InvalidCredential)?
        .try_into()
        .map_err(|_| AuthError::InvalidCredential)?;

    // blake3::Hash comparison is constant-time.
    if mac(secret, payload.as_bytes()) != blake3::Hash::from_bytes(given_mac) {
        return Err(AuthError::InvalidCredential);
    }

    let claims: AdminClaims = URL_SAFE_NO_PAD
        .decode(payload)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or(AuthError::InvalidCredential)?;

    if claims.exp < unix_now() {
        return Err(AuthError::InvalidCredential);
    }
    if claims.role != ADMIN_ROLE {
        return Err(AuthError::WrongRole);
    }

    Ok(claims)
}

/// Extract the bearer token from an Authorization header value.
pub fn authorization_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredential)?;
    Ok(token.trim())
}
