//! Data models
//!
//! Shared between clinic-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), all timestamps are
//! Unix millis (UTC).

pub mod face_image;
pub mod poster;
pub mod simulation;
pub mod skin_analysis;
pub mod user;

// Re-exports
pub use face_image::*;
pub use poster::*;
pub use simulation::*;
pub use skin_analysis::*;
pub use user::*;
