//! Credential token decoding and expiry checks.
//!
//! SYSTEM CONTEXT
//! ==============
//! Access tokens are opaque `header.payload.signature` strings. The client
//! never verifies signatures; it only reads the payload's `exp` claim so it
//! can drop a session before the server starts rejecting it.
//!
//! TRADE-OFFS
//! ==========
//! Payload decoding accepts both the standard and URL-safe base64 alphabets,
//! with or without padding. Issuers differ and a stricter decoder would turn
//! a perfectly usable session into a "malformed" one.

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;

use std::fmt;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;
use serde_json::{Map, Value};

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Why a stored credential cannot back a session.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The token is not a `header.payload.signature` triple.
    #[error("token has {0} segments, expected 3")]
    SegmentCount(usize),
    /// The payload segment is not base64.
    #[error("token payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The payload decoded but is not a JSON claims object.
    #[error("token payload is not a claims object: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload carries an `exp` at or before the current time.
    #[error("token expired at {exp}")]
    Expired { exp: f64 },
}

/// Claims read from a token payload.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Claims {
    /// Expiration time in seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<f64>,
    /// Every other claim, untouched.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Claims {
    /// True when `exp` is present and at or before `now`.
    pub fn expired_at(&self, now: f64) -> bool {
        self.exp.is_some_and(|exp| exp <= now)
    }

    /// True only when `exp` is present and strictly after `now`.
    pub fn live_at(&self, now: f64) -> bool {
        self.exp.is_some_and(|exp| exp > now)
    }
}

/// Current wall-clock time in seconds since the Unix epoch.
pub fn now_secs() -> f64 {
    #[cfg(feature = "hydrate")]
    {
        js_sys::Date::now() / 1000.0
    }
    #[cfg(not(feature = "hydrate"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0.0, |elapsed| elapsed.as_secs_f64())
    }
}

fn payload_segment(token: &str) -> Result<&str, CredentialError> {
    let segments: Vec<&str> = token.split('.').collect();
    match segments.as_slice() {
        [_, payload, _] => Ok(*payload),
        other => Err(CredentialError::SegmentCount(other.len())),
    }
}

/// Decode the payload segment of `token` into raw JSON.
///
/// # Errors
///
/// Returns [`CredentialError`] when the token is not three segments or the
/// payload is not base64-encoded JSON.
pub fn decode_payload(token: &str) -> Result<Value, CredentialError> {
    let segment = payload_segment(token)?.replace('-', "+").replace('_', "/");
    let bytes = PAYLOAD_ENGINE.decode(segment)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Decode the claims carried by `token`.
///
/// # Errors
///
/// Returns [`CredentialError`] when the payload cannot be decoded or is not a
/// JSON object with a numeric (or absent) `exp`.
pub fn decode_claims(token: &str) -> Result<Claims, CredentialError> {
    Ok(serde_json::from_value(decode_payload(token)?)?)
}

/// Check whether a persisted token may seed a session at `now`.
///
/// A token without `exp` is accepted here; only an explicit past expiry or a
/// decode failure disqualifies it.
///
/// # Errors
///
/// Returns [`CredentialError::Expired`] for a past `exp`, or the decode error.
pub fn check_restorable(token: &str, now: f64) -> Result<Claims, CredentialError> {
    let claims = decode_claims(token)?;
    match claims.exp {
        Some(exp) if claims.expired_at(now) => Err(CredentialError::Expired { exp }),
        _ => Ok(claims),
    }
}

/// True only when `token` decodes and carries an `exp` strictly after `now`.
pub fn is_live(token: &str, now: f64) -> bool {
    decode_claims(token).is_ok_and(|claims| claims.live_at(now))
}

/// Human-readable diagnosis of a token, for debugging stuck sessions.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenReport {
    pub segments: usize,
    pub payload: Option<Value>,
    pub exp: Option<f64>,
    pub expired: Option<bool>,
    pub seconds_remaining: Option<f64>,
    pub error: Option<String>,
}

impl TokenReport {
    /// Inspect `token` relative to `now` without ever failing.
    pub fn inspect(token: &str, now: f64) -> Self {
        let segments = token.split('.').count();
        let mut report = Self {
            segments,
            payload: None,
            exp: None,
            expired: None,
            seconds_remaining: None,
            error: None,
        };
        match decode_payload(token) {
            Ok(payload) => {
                let exp = payload.get("exp").and_then(Value::as_f64);
                report.exp = exp;
                report.expired = exp.map(|exp| exp <= now);
                report.seconds_remaining = exp.map(|exp| exp - now);
                report.payload = Some(payload);
            }
            Err(e) => report.error = Some(e.to_string()),
        }
        report
    }
}

impl fmt::Display for TokenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "segments: {}", self.segments)?;
        if let Some(payload) = &self.payload {
            writeln!(f, "payload: {payload}")?;
        }
        match self.exp {
            Some(exp) => writeln!(f, "exp: {exp}")?,
            None => writeln!(f, "exp: (none)")?,
        }
        if let Some(expired) = self.expired {
            writeln!(f, "expired: {expired}")?;
        }
        if let Some(remaining) = self.seconds_remaining {
            writeln!(f, "seconds until expiry: {remaining:.0}")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "error: {error}")?;
        }
        Ok(())
    }
}
