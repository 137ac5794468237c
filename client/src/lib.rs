//! # client
//!
//! Leptos + WASM client core for the blog application.
//!
//! This crate owns the client's session (token lifecycle, persistence, and
//! request authorization), the markdown-subset preview transform, the editor
//! toolbar splice, the REST request layer, and the session gate components.
//! Pages and styling live with the application shell and call into these
//! modules.

pub mod components;
pub mod config;
pub mod net;
pub mod state;
pub mod util;

/// Install browser console logging and the panic hook.
///
/// Called once by the application shell before mounting.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        log::debug!("console logger already installed");
    }
}
