//! Reusable Leptos components.

pub mod session_gate;
