//! Authentication Handlers
//!
//! Handles staff registration, login and current-user lookup

use std::time::Duration;

use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::security_log;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_PASSWORD_LEN, MAX_SHORT_TEXT_LEN, validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{LoginRequest, LoginResponse, UserCreate, UserPublic};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// Minimum accepted password length
const MIN_PASSWORD_LEN: usize = 8;

/// Verify password using argon2
fn verify_password(password: &str, hashed: &str) -> Result<bool, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHash, PasswordVerifier},
    };

    let parsed_hash = PasswordHash::new(hashed)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash password using argon2
fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

/// Register handler
///
/// Creates a staff account and returns the public profile with 201
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<UserCreate>,
) -> AppResult<(StatusCode, Json<UserPublic>)> {
    validate_required_text(&req.username, "username", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&req.email, "email", MAX_EMAIL_LEN)?;

    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::validation("Invalid email address"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            "Password must be at least 8 characters",
        ));
    }
    if req.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation("Password is too long"));
    }

    // Uniqueness pre-checks so the caller gets a precise message
    if user::find_by_username(&state.pool, &req.username)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("Username already exists"));
    }
    if user::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::conflict("Email already registered"));
    }

    let hashed_password = hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?;

    let created = user::create(&state.pool, &req.username, &email, &hashed_password, req.role)
        .await?;

    tracing::info!(
        user_id = %created.id,
        username = %created.username,
        role = %created.role,
        "User registered"
    );

    Ok((StatusCode::CREATED, Json(created.into_public())))
}

/// Login handler
///
/// Authenticates user credentials and returns a JWT token
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = user::find_by_username(&state.pool, &req.username).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Check authentication result - unified error message to prevent username enumeration
    let user = match user {
        Some(u) => {
            // Verify password
            let password_valid = verify_password(&req.password, &u.hashed_password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

            if !password_valid {
                security_log!(
                    WARN,
                    "login_failed",
                    username = %req.username,
                    reason = "invalid_credentials"
                );
                tracing::warn!(username = %req.username, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            if !u.is_active {
                return Err(AppError::forbidden("Account has been disabled"));
            }

            u
        }
        None => {
            security_log!(
                WARN,
                "login_failed",
                username = %req.username,
                reason = "user_not_found"
            );
            tracing::warn!(username = %req.username, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    // Generate JWT token
    let jwt_service = state.get_jwt_service();
    let token = jwt_service
        .generate_token(user.id, &user.username, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(
        user_id = %user.id,
        username = %user.username,
        role = %user.role,
        "User logged in successfully"
    );

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: user.into_public(),
    }))
}

/// Get current user info
pub async fn me(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<UserPublic>> {
    // Query fresh user data so is_active and email reflect the database
    let user = user::find_by_id(&state.pool, current.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", current.id)))?;

    Ok(Json(user.into_public()))
}
