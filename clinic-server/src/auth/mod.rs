//! Authentication and Authorization Module
//!
//! Handles JWT token generation/validation, role checks, and auth middleware

mod jwt;
mod middleware;

pub use jwt::{
    Claims, CurrentUser, JwtConfig, JwtError, JwtService, generate_secure_jwt_secret,
    generate_secure_printable_jwt_secret,
};
pub use middleware::{require_auth, require_manager};
