//! Session gates for the application shell and protected routes.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionProvider` wraps the router so no page renders before the stored
//! session has been restored. `RequireAuth` wraps authenticated pages: it
//! redirects anonymous visitors and polls token expiry while mounted.

use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::state::session::BrowserSession;
use crate::util::auth::{install_unauth_redirect, install_validity_poll, provide_session};

/// Provide the browser session and hold back children until it is restored.
#[component]
pub fn SessionProvider(children: ChildrenFn) -> impl IntoView {
    let session = provide_session();
    view! {
        <Show when=move || !session.with(BrowserSession::is_loading)>
            {children()}
        </Show>
    }
}

/// Render children only for a signed-in user whose token is still valid.
#[component]
pub fn RequireAuth(children: ChildrenFn) -> impl IntoView {
    let session = expect_context::<RwSignal<BrowserSession>>();
    install_unauth_redirect(session, use_navigate());
    install_validity_poll(session);
    view! {
        <Show when=move || session.with(|s| s.user().is_some())>
            {children()}
        </Show>
    }
}
