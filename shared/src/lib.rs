//! Shared types for the clinic backend
//!
//! Data models and DTOs exchanged between the server and its clients,
//! plus common ID/time utilities. DB row derives are feature-gated so
//! client-side consumers do not pull in sqlx.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
