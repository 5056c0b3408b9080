//! Brand Guard
//!
//! Visual identity settings, poster templates and poster generation with a
//! built-in medical-advertising compliance scan.

pub mod compliance;
