//! Networking for the blog REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` describes and sends requests, `error` classifies failures, and
//! `types` defines the wire schema.

pub mod api;
pub mod error;
pub mod types;
