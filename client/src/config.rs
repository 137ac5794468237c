//! Compile-time client configuration.
//!
//! SYSTEM CONTEXT
//! ==============
//! The browser bundle has no runtime environment, so the API origin is baked
//! in at build time. Everything else here is a fixed contract shared by the
//! session manager, request hooks, and route guards.

use std::time::Duration;

/// API base URL used when `BLOG_API_BASE_URL` is not set at build time.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Route that hosts the login form. Logout hard-redirects here.
pub const LOGIN_PATH: &str = "/login";

/// Persisted storage key holding the raw access token.
pub const TOKEN_KEY: &str = "token";

/// Persisted storage key holding the JSON-serialized user profile.
pub const USER_KEY: &str = "user";

/// How often authenticated pages re-check token expiry.
pub const VALIDITY_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Notice shown before an expired or rejected session is torn down.
pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please log in again.";

/// Character budget for post excerpts on listing cards.
pub const EXCERPT_CHARS: usize = 150;

/// API base URL, honoring a build-time `BLOG_API_BASE_URL` override.
pub fn api_base_url() -> &'static str {
    option_env!("BLOG_API_BASE_URL").unwrap_or(DEFAULT_API_BASE_URL)
}
