//! Brand Guard API Handlers
//!
//! VI configuration, the poster template catalogue, poster generation with
//! its medical-advertising compliance scan, and the standalone check endpoint.

use axum::{
    Json,
    extract::{Extension, State},
};

use crate::auth::CurrentUser;
use crate::brandguard::compliance;
use crate::core::ServerState;
use crate::db::repository::poster;
use crate::utils::validation::{
    MAX_CONTENT_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{
    ComplianceCheckRequest, ComplianceReport, GeneratedPoster, PosterGenerate, PosterTemplate,
    PosterTemplateCreate, ViConfig, ViConfigUpsert,
};

/// Accepted poster pixel dimensions
const MIN_DIMENSION: i64 = 100;
const MAX_DIMENSION: i64 = 4096;

fn validate_vi_config(payload: &ViConfigUpsert) -> AppResult<()> {
    validate_required_text(&payload.brand_name, "brand_name", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.font_family, "font_family", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.logo_url, "logo_url", MAX_URL_LEN)?;
    Ok(())
}

fn validate_template(payload: &PosterTemplateCreate) -> AppResult<()> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_CONTENT_LEN)?;
    validate_optional_text(&payload.thumbnail_url, "thumbnail_url", MAX_URL_LEN)?;
    for (field, value) in [("width", payload.width), ("height", payload.height)] {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
            return Err(AppError::validation(format!(
                "{field} must be between {MIN_DIMENSION} and {MAX_DIMENSION}"
            )));
        }
    }
    Ok(())
}

/// GET /api/brandguard/vi-config - Get the caller's VI configuration
pub async fn get_vi_config(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ViConfig>> {
    let config = poster::find_vi_config(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("VI config not found"))?;
    Ok(Json(config))
}

/// PUT /api/brandguard/vi-config - Create or replace the caller's VI configuration
pub async fn put_vi_config(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ViConfigUpsert>,
) -> AppResult<Json<ViConfig>> {
    validate_vi_config(&payload)?;

    let config = poster::upsert_vi_config(&state.pool, user.id, payload).await?;

    tracing::info!(user_id = user.id, "VI config saved");

    Ok(Json(config))
}

/// GET /api/brandguard/templates - List poster templates (shared catalogue)
pub async fn list_templates(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<PosterTemplate>>> {
    let templates = poster::list_templates(&state.pool).await?;
    Ok(Json(templates))
}

/// POST /api/brandguard/templates - Create a poster template (manager only)
pub async fn create_template(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<PosterTemplateCreate>,
) -> AppResult<Json<PosterTemplate>> {
    validate_template(&payload)?;

    let template = poster::create_template(&state.pool, payload).await?;

    tracing::info!(
        template_id = template.id,
        user_id = user.id,
        "Poster template created"
    );

    Ok(Json(template))
}

/// POST /api/brandguard/generate - Generate a poster, scanning the copy first
///
/// Compliance issues are recorded on the poster but never block generation.
pub async fn generate_poster(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<PosterGenerate>,
) -> AppResult<Json<GeneratedPoster>> {
    validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;
    validate_required_text(&payload.content, "content", MAX_CONTENT_LEN)?;

    // The referenced template must exist, but generation works without one
    if let Some(template_id) = payload.template_id {
        poster::find_template(&state.pool, template_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Template {template_id} not found")))?;
    }

    let report = compliance::check(&payload.content);
    if !report.is_compliant {
        tracing::warn!(
            user_id = user.id,
            issue_count = report.issues.len(),
            "Poster content flagged by compliance scan"
        );
    }

    // Rendering is not wired up yet; posters link to a deterministic placeholder
    let image_url = format!(
        "https://placeholder.com/poster_{}_{}.png",
        user.id, payload.title
    );

    let generated = poster::create_poster(
        &state.pool,
        user.id,
        payload.template_id,
        &payload.title,
        &payload.content,
        &image_url,
        &report.issues,
    )
    .await?;

    tracing::info!(poster_id = generated.id, user_id = user.id, "Poster generated");

    Ok(Json(generated))
}

/// GET /api/brandguard/posters - List the caller's generated posters (newest first)
pub async fn list_posters(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<GeneratedPoster>>> {
    let posters = poster::list_posters(&state.pool, user.id).await?;
    Ok(Json(posters))
}

/// POST /api/brandguard/check-compliance - Scan copy for prohibited claims
pub async fn check_compliance(
    Json(req): Json<ComplianceCheckRequest>,
) -> AppResult<Json<ComplianceReport>> {
    Ok(Json(compliance::check(&req.content)))
}
