use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

/// Claims carried in the access token payload.
///
/// The payload is decoded, not verified: these claims only drive UI
/// personalization and the profile ownership check. Every mutating call
/// forwards the raw bearer token upstream, and the external API re-validates
/// it there.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Decode the payload segment of a compact `header.payload.signature` token.
pub fn decode(token: &str) -> Result<Claims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => return Err(anyhow!("malformed token: expected three segments")),
    };
    if segments.next().is_some() {
        return Err(anyhow!("malformed token: expected three segments"));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|err| anyhow!("malformed token payload: {err}"))?;
    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|err| anyhow!("malformed token claims: {err}"))?;

    Ok(claims)
}
