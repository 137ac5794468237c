//! REST API helpers for the blog backend.
//!
//! Requests are described as plain [`ApiRequest`] values so endpoint shapes
//! can be unit tested; only [`send`] touches the network.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Elsewhere: [`send`] reports the API as unavailable.
//!
//! ERROR HANDLING
//! ==============
//! Every failed response is classified by [`classify_failure`]. Failures that
//! mean the credential is dead end the session before the error is returned;
//! everything else is handed back for the page to display.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

#[cfg(feature = "hydrate")]
use leptos::prelude::WithUntracked;
use leptos::prelude::{RwSignal, Update};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;
#[cfg(feature = "hydrate")]
use super::error::classify_failure;
use super::types::{
    Comment, Credentials, DashboardStats, LoginResponse, NewComment, Post, PostDraft, PostPage,
    PostQuery, User,
};
use crate::config::{SESSION_EXPIRED_NOTICE, api_base_url};
use crate::state::session::{BrowserSession, Navigator, SessionManager, SessionStore};

/// HTTP verbs used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// A REST call before transport.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
    /// Message shown when the server's error body has none.
    pub fallback: &'static str,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>, fallback: &'static str) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            fallback,
        }
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Absolute URL under `base`, without the query string.
    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path)
    }

    pub fn login(credentials: &Credentials) -> Self {
        Self::new(Method::Post, "/auth/login", "Login failed").with_body(json_of(credentials))
    }

    pub fn register(credentials: &Credentials) -> Self {
        Self::new(Method::Post, "/auth/register", "Registration failed")
            .with_body(json_of(credentials))
    }

    pub fn list_posts(query: &PostQuery) -> Self {
        let mut request = Self::new(Method::Get, "/posts", "Failed to load posts");
        request.query = query.pairs();
        request
    }

    pub fn get_post(id: i64) -> Self {
        Self::new(Method::Get, format!("/posts/{id}"), "Failed to load post")
    }

    pub fn create_post(draft: &PostDraft) -> Self {
        Self::new(Method::Post, "/posts", "Failed to save post").with_body(json_of(draft))
    }

    pub fn update_post(id: i64, draft: &PostDraft) -> Self {
        Self::new(Method::Put, format!("/posts/{id}"), "Failed to save post")
            .with_body(json_of(draft))
    }

    pub fn delete_post(id: i64) -> Self {
        Self::new(Method::Delete, format!("/posts/{id}"), "Failed to delete post")
    }

    pub fn list_comments(post_id: i64) -> Self {
        Self::new(Method::Get, format!("/posts/{post_id}/comments"), "Failed to load comments")
    }

    pub fn add_comment(post_id: i64, comment: &NewComment) -> Self {
        Self::new(Method::Post, format!("/posts/{post_id}/comments"), "Failed to post comment")
            .with_body(json_of(comment))
    }

    pub fn list_categories() -> Self {
        Self::new(Method::Get, "/categories", "Failed to load categories")
    }

    pub fn dashboard_stats() -> Self {
        Self::new(Method::Get, "/dashboard/stats", "Failed to load stats")
    }
}

fn json_of<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Apply the session consequences of a failed request.
///
/// A live session is ended with an explanation; with no session held (for
/// example a rejected login) the stale storage is cleared quietly.
pub fn react_to_failure<S: SessionStore, N: Navigator>(
    session: &mut SessionManager<S, N>,
    error: &ApiError,
) {
    if !error.ends_session() {
        return;
    }
    if session.token().is_some() {
        session.end_session(SESSION_EXPIRED_NOTICE);
    } else {
        session.logout();
    }
}

/// Send `request` with the session's bearer token and decode the reply.
///
/// # Errors
///
/// Returns [`ApiError`] for transport, status, or decode failures. An
/// [`ApiError::Unauthorized`] has already ended the session.
pub async fn send<T: DeserializeOwned>(
    session: RwSignal<BrowserSession>,
    request: ApiRequest,
) -> Result<T, ApiError> {
    #[cfg(feature = "hydrate")]
    {
        use gloo_net::http::Request;

        let url = request.url(api_base_url());
        let mut builder = match request.method {
            Method::Get => Request::get(&url),
            Method::Post => Request::post(&url),
            Method::Put => Request::put(&url),
            Method::Delete => Request::delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(request.query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        if let Some(header) = session.with_untracked(|s| s.authorization_header()) {
            builder = builder.header("Authorization", &header);
        }
        let built = match &request.body {
            Some(body) => builder.json(body),
            None => builder.build(),
        }
        .map_err(|e| ApiError::Transport(e.to_string()))?;

        let resp = built
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !resp.ok() {
            let raw = resp.text().await.unwrap_or_default();
            let error = classify_failure(resp.status(), &raw, request.fallback);
            log::warn!("api: {} failed: {error}", request.path);
            session.update(|s| react_to_failure(s, &error));
            return Err(error);
        }
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (session, api_base_url(), request);
        Err(ApiError::Transport("not available on server".to_owned()))
    }
}

/// Exchange credentials for a session via `POST /auth/login`.
///
/// # Errors
///
/// Returns the request failure; the session is untouched on error.
pub async fn login(session: RwSignal<BrowserSession>, credentials: Credentials) -> Result<User, ApiError> {
    let response: LoginResponse = send(session, ApiRequest::login(&credentials)).await?;
    let user = response.user.clone();
    session.update(|s| s.login(response.user, response.access_token));
    Ok(user)
}

/// Create an account via `POST /auth/register`.
///
/// # Errors
///
/// Returns the request failure, e.g. a taken username.
pub async fn register(session: RwSignal<BrowserSession>, credentials: Credentials) -> Result<(), ApiError> {
    send::<Value>(session, ApiRequest::register(&credentials)).await.map(|_| ())
}

/// # Errors
///
/// Returns the request failure.
pub async fn list_posts(session: RwSignal<BrowserSession>, query: PostQuery) -> Result<PostPage, ApiError> {
    send(session, ApiRequest::list_posts(&query)).await
}

/// # Errors
///
/// Returns the request failure.
pub async fn get_post(session: RwSignal<BrowserSession>, id: i64) -> Result<Post, ApiError> {
    send(session, ApiRequest::get_post(id)).await
}

/// # Errors
///
/// Returns the request failure.
pub async fn create_post(session: RwSignal<BrowserSession>, draft: PostDraft) -> Result<Post, ApiError> {
    send(session, ApiRequest::create_post(&draft)).await
}

/// # Errors
///
/// Returns the request failure.
pub async fn update_post(
    session: RwSignal<BrowserSession>,
    id: i64,
    draft: PostDraft,
) -> Result<Post, ApiError> {
    send(session, ApiRequest::update_post(id, &draft)).await
}

/// # Errors
///
/// Returns the request failure.
pub async fn delete_post(session: RwSignal<BrowserSession>, id: i64) -> Result<(), ApiError> {
    send::<Value>(session, ApiRequest::delete_post(id)).await.map(|_| ())
}

/// # Errors
///
/// Returns the request failure.
pub async fn list_comments(session: RwSignal<BrowserSession>, post_id: i64) -> Result<Vec<Comment>, ApiError> {
    send(session, ApiRequest::list_comments(post_id)).await
}

/// # Errors
///
/// Returns the request failure.
pub async fn add_comment(
    session: RwSignal<BrowserSession>,
    post_id: i64,
    comment: NewComment,
) -> Result<Comment, ApiError> {
    send(session, ApiRequest::add_comment(post_id, &comment)).await
}

/// # Errors
///
/// Returns the request failure.
pub async fn list_categories(session: RwSignal<BrowserSession>) -> Result<Vec<String>, ApiError> {
    send(session, ApiRequest::list_categories()).await
}

/// # Errors
///
/// Returns the request failure; non-admins get a 403 status error.
pub async fn dashboard_stats(session: RwSignal<BrowserSession>) -> Result<DashboardStats, ApiError> {
    send(session, ApiRequest::dashboard_stats()).await
}
