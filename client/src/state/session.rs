//! Session manager: the single owner of the current credential.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages ask the manager who is logged in, the REST layer asks it for the
//! `Authorization` header, and both tell it when the session is over. The
//! token and user live in one `Option<Credential>` so they can only ever be
//! set or cleared together.
//!
//! Persistence and navigation are injected: the browser build writes to
//! `localStorage` and hard-redirects through `window.location`, the CLI
//! writes a JSON file and reports on stderr, and tests record calls.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here returns an error. A malformed or expired stored credential
//! is cleared and the session degrades to "not authenticated".

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::HashMap;

use crate::config::{LOGIN_PATH, TOKEN_KEY, USER_KEY};
use crate::net::types::User;
use crate::util::token::{self, now_secs};

/// Restart-durable key/value storage for the session.
///
/// Writes are best-effort; a failing backend logs and carries on.
pub trait SessionStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// Navigate-and-discard-state capability used when a session ends.
pub trait Navigator {
    /// Path of the page currently shown.
    fn current_path(&self) -> String;
    /// Tell the user why their session ended.
    fn notify(&self, notice: &str);
    /// Leave the current page entirely, dropping all in-memory UI state.
    fn hard_redirect(&self, path: &str);
}

#[derive(Clone, Debug, PartialEq)]
struct Credential {
    token: String,
    user: User,
}

/// Current authenticated identity, or its absence.
#[derive(Debug)]
pub struct SessionManager<S, N> {
    store: S,
    navigator: N,
    credential: Option<Credential>,
    loading: bool,
}

impl<S: SessionStore, N: Navigator> SessionManager<S, N> {
    /// Create an empty session that is still loading.
    pub fn new(store: S, navigator: N) -> Self {
        Self {
            store,
            navigator,
            credential: None,
            loading: true,
        }
    }

    /// Restore the persisted session against the current clock.
    pub fn restore(&mut self) {
        self.restore_at(now_secs());
    }

    /// Restore the persisted session as of `now` (seconds since epoch).
    ///
    /// Runs once; later calls are ignored so `loading` flips exactly once.
    pub fn restore_at(&mut self, now: f64) {
        if !self.loading {
            log::debug!("session: restore already ran");
            return;
        }
        self.credential = self.read_persisted(now);
        self.loading = false;
    }

    fn read_persisted(&mut self, now: f64) -> Option<Credential> {
        let raw_user = self.store.read(USER_KEY).filter(|v| !v.is_empty())?;
        let token = self.store.read(TOKEN_KEY).filter(|v| !v.is_empty())?;

        if let Err(e) = token::check_restorable(&token, now) {
            log::info!("session: discarding stored token: {e}");
            self.clear_persisted();
            return None;
        }
        match serde_json::from_str::<User>(&raw_user) {
            Ok(user) => Some(Credential { token, user }),
            Err(e) => {
                log::info!("session: discarding unreadable stored user: {e}");
                self.clear_persisted();
                None
            }
        }
    }

    /// Start a session for `user`, replacing any prior one.
    ///
    /// The token is trusted as issued; expiry is not checked here.
    pub fn login(&mut self, user: User, token: String) {
        match serde_json::to_string(&user) {
            Ok(raw_user) => self.store.write(USER_KEY, &raw_user),
            Err(e) => log::warn!("session: could not persist user: {e}"),
        }
        self.store.write(TOKEN_KEY, &token);
        log::info!("session: logged in as {}", user.username);
        self.credential = Some(Credential { token, user });
    }

    /// Clear the session and leave the page unless already on the login route.
    pub fn logout(&mut self) {
        self.credential = None;
        self.clear_persisted();
        log::info!("session: logged out");
        if self.navigator.current_path() != LOGIN_PATH {
            self.navigator.hard_redirect(LOGIN_PATH);
        }
    }

    /// Explain why the session is ending, then [`logout`](Self::logout).
    pub fn end_session(&mut self, notice: &str) {
        log::warn!("session: ended: {notice}");
        self.navigator.notify(notice);
        self.logout();
    }

    /// True only while a token with a future `exp` is held.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_secs())
    }

    /// [`is_valid`](Self::is_valid) evaluated at `now`.
    pub fn is_valid_at(&self, now: f64) -> bool {
        self.credential
            .as_ref()
            .is_some_and(|credential| token::is_live(&credential.token, now))
    }

    /// Bearer header value for outgoing requests, when logged in.
    pub fn authorization_header(&self) -> Option<String> {
        self.token().map(|token| format!("Bearer {token}"))
    }

    pub fn user(&self) -> Option<&User> {
        self.credential.as_ref().map(|credential| &credential.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.credential.as_ref().map(|credential| credential.token.as_str())
    }

    /// True until [`restore`](Self::restore) has run.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Read-only view of the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn clear_persisted(&mut self) {
        self.store.remove(USER_KEY);
        self.store.remove(TOKEN_KEY);
    }
}

/// In-process store for server rendering and tests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// `window.localStorage`. A no-op outside the browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStore;

#[cfg(feature = "hydrate")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

impl SessionStore for BrowserStore {
    fn read(&self, key: &str) -> Option<String> {
        #[cfg(feature = "hydrate")]
        {
            local_storage()?.get_item(key).ok().flatten()
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
            None
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        #[cfg(feature = "hydrate")]
        {
            let Some(storage) = local_storage() else {
                return;
            };
            if storage.set_item(key, value).is_err() {
                log::warn!("session: localStorage rejected write of {key}");
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (key, value);
        }
    }

    fn remove(&mut self, key: &str) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(storage) = local_storage() {
                let _ = storage.remove_item(key);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
        }
    }
}

/// `window.location` plus `alert()`. A no-op outside the browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn current_path(&self) -> String {
        #[cfg(feature = "hydrate")]
        {
            web_sys::window()
                .and_then(|w| w.location().pathname().ok())
                .unwrap_or_default()
        }
        #[cfg(not(feature = "hydrate"))]
        {
            String::new()
        }
    }

    fn notify(&self, notice: &str) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(window) = web_sys::window() {
                let _ = window.alert_with_message(notice);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = notice;
        }
    }

    fn hard_redirect(&self, path: &str) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(window) = web_sys::window() {
                let _ = window.location().set_href(path);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = path;
        }
    }
}

/// The session as held by the browser application.
pub type BrowserSession = SessionManager<BrowserStore, BrowserNavigator>;
