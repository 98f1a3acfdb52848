//! Payload peek for compact user JWTs.
//!
//! The signature is never checked; the platform verifies tokens server-side.
//! Only the middle segment is decoded so builders can derive the user
//! identity from it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use crate::error::JwtError;
use crate::types::UserIdInput;

/// Decode the payload segment of a `header.payload.signature` token.
pub fn jwt_payload(jwt: &str) -> Result<Value, JwtError> {
    let parts: Vec<&str> = jwt.split('.').filter(|part| !part.is_empty()).collect();
    if parts.len() != 3 {
        return Err(JwtError::NotEnoughParts);
    }
    let bytes = base64_url_decode(parts[1])?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// The `user.id` / `user.accountId` pair of a payload, if both are strings.
pub fn payload_user(payload: &Value) -> Option<UserIdInput> {
    let user = payload.get("user")?;
    let user_id = user.get("id")?.as_str()?;
    let account_id = user.get("accountId")?.as_str()?;
    Some(UserIdInput::new(account_id, user_id))
}

fn base64_url_decode(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let mut base64 = segment.replace('-', "+").replace('_', "/");
    let padding = (4 - base64.len() % 4) % 4;
    base64.extend(std::iter::repeat('=').take(padding));
    STANDARD.decode(base64)
}
