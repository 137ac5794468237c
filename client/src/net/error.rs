//! Request failure classification.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend does not report credential problems consistently: some
//! handlers answer 401, others answer 4xx/5xx with a message that merely
//! mentions the token. Every request path funnels failures through
//! [`looks_like_auth_failure`] so that sniffing lives in one place.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use super::types::ErrorBody;

/// HTTP status the backend uses for missing or rejected credentials.
pub const UNAUTHORIZED: u16 = 401;

/// Case-sensitive fragments that mark an error message as credential-related.
pub const AUTH_FAILURE_MARKERS: [&str; 3] = ["token", "expired", "invalid"];

/// Failure of a REST call.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The server no longer accepts the session; it must be ended.
    #[error("session rejected ({status}): {message}")]
    Unauthorized { status: u16, message: String },
    /// Any other non-success status.
    #[error("request failed ({status}): {message}")]
    Status { status: u16, message: String },
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),
    /// The response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// True when this failure must end the current session.
    pub fn ends_session(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

fn mentions_credential(text: Option<&str>) -> bool {
    text.is_some_and(|text| AUTH_FAILURE_MARKERS.iter().any(|marker| text.contains(marker)))
}

/// Decide whether a failed response means the session is no longer valid.
///
/// True for a 401 status, or when either `message` or `msg` contains one of
/// [`AUTH_FAILURE_MARKERS`]. Matching is case-sensitive: `"Token"` alone does
/// not count. Unrelated messages such as "invalid image format" do match.
pub fn looks_like_auth_failure(status: u16, body: &ErrorBody) -> bool {
    status == UNAUTHORIZED
        || mentions_credential(body.message.as_deref())
        || mentions_credential(body.msg.as_deref())
}

/// Turn a non-success response into an [`ApiError`].
///
/// `fallback` is the message used when the body carries none.
pub fn classify_failure(status: u16, raw_body: &str, fallback: &str) -> ApiError {
    let body = ErrorBody::parse(raw_body);
    let message = body.text().unwrap_or(fallback).to_owned();
    if looks_like_auth_failure(status, &body) {
        ApiError::Unauthorized { status, message }
    } else {
        ApiError::Status { status, message }
    }
}
