//! Shared auth UI helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route components should apply identical session bootstrapping, redirect,
//! and expiry polling behavior. The decisions are plain functions over the
//! session so they can be tested without a reactive runtime.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;

use crate::config::LOGIN_PATH;
#[cfg(feature = "hydrate")]
use crate::config::{SESSION_EXPIRED_NOTICE, VALIDITY_POLL_INTERVAL};
use crate::state::session::{BrowserNavigator, BrowserSession, BrowserStore, Navigator, SessionManager, SessionStore};

/// Create the browser session, restore it, and provide it as context.
///
/// Must run in the root component before any page reads the session.
pub fn provide_session() -> RwSignal<BrowserSession> {
    let mut session = BrowserSession::new(BrowserStore, BrowserNavigator);
    session.restore();
    let session = RwSignal::new(session);
    provide_context(session);
    session
}

/// True when restore has finished and nobody is logged in.
pub fn should_redirect_unauth<S: SessionStore, N: Navigator>(session: &SessionManager<S, N>) -> bool {
    !session.is_loading() && session.user().is_none()
}

/// True when a user is logged in but their token no longer validates at `now`.
pub fn should_end_session_at<S: SessionStore, N: Navigator>(
    session: &SessionManager<S, N>,
    now: f64,
) -> bool {
    !session.is_loading() && session.user().is_some() && !session.is_valid_at(now)
}

/// Redirect to `/login` whenever restore has finished and no user is present.
pub fn install_unauth_redirect<F>(session: RwSignal<BrowserSession>, navigate: F)
where
    F: Fn(&str, NavigateOptions) + 'static,
{
    Effect::new(move || {
        if session.with(should_redirect_unauth) {
            navigate(LOGIN_PATH, NavigateOptions::default());
        }
    });
}

/// Check token expiry now and then on a fixed interval while the calling
/// page is mounted. The poll stops on unmount so a page that is gone can
/// never trigger the logout redirect.
pub fn install_validity_poll(session: RwSignal<BrowserSession>) {
    #[cfg(feature = "hydrate")]
    {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        use crate::util::token::now_secs;

        let check = move || {
            if session.with_untracked(|s| should_end_session_at(s, now_secs())) {
                session.update(|s| s.end_session(SESSION_EXPIRED_NOTICE));
                return false;
            }
            true
        };
        if !check() {
            return;
        }

        let poll_alive = Arc::new(AtomicBool::new(true));
        let poll_alive_task = poll_alive.clone();
        leptos::task::spawn_local(async move {
            loop {
                gloo_timers::future::sleep(VALIDITY_POLL_INTERVAL).await;
                if !poll_alive_task.load(Ordering::Relaxed) {
                    break;
                }
                if !check() {
                    break;
                }
            }
        });
        on_cleanup(move || poll_alive.store(false, Ordering::Relaxed));
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = session;
    }
}
