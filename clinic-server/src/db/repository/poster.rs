//! Brand Material Repository
//!
//! Covers the vi_config, poster_template and generated_poster tables.

use super::{RepoError, RepoResult};
use shared::models::{
    GeneratedPoster, PosterTemplate, PosterTemplateCreate, ViConfig, ViConfigUpsert,
};
use sqlx::SqlitePool;

// ── VI config ───────────────────────────────────────────────────────

const VI_CONFIG_SELECT: &str = "SELECT id, user_id, brand_name, primary_color, secondary_color, accent_color, logo_url, font_family, created_at, updated_at FROM vi_config";

pub async fn find_vi_config(pool: &SqlitePool, user_id: i64) -> RepoResult<Option<ViConfig>> {
    let sql = format!("{} WHERE user_id = ?", VI_CONFIG_SELECT);
    let row = sqlx::query_as::<_, ViConfig>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// One VI config per user; a second save replaces the first.
pub async fn upsert_vi_config(
    pool: &SqlitePool,
    user_id: i64,
    data: ViConfigUpsert,
) -> RepoResult<ViConfig> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO vi_config (id, user_id, brand_name, primary_color, secondary_color, accent_color, logo_url, font_family, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
         ON CONFLICT(user_id) DO UPDATE SET
           brand_name = excluded.brand_name,
           primary_color = excluded.primary_color,
           secondary_color = excluded.secondary_color,
           accent_color = excluded.accent_color,
           logo_url = excluded.logo_url,
           font_family = excluded.font_family,
           updated_at = excluded.updated_at",
    )
    .bind(id)
    .bind(user_id)
    .bind(&data.brand_name)
    .bind(&data.primary_color)
    .bind(&data.secondary_color)
    .bind(&data.accent_color)
    .bind(&data.logo_url)
    .bind(&data.font_family)
    .bind(now)
    .execute(pool)
    .await?;
    find_vi_config(pool, user_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to save VI config".into()))
}

// ── Poster templates ────────────────────────────────────────────────

const POSTER_TEMPLATE_SELECT: &str = "SELECT id, name, description, layout_config, width, height, thumbnail_url, created_at, updated_at FROM poster_template";

pub async fn list_templates(pool: &SqlitePool) -> RepoResult<Vec<PosterTemplate>> {
    let sql = format!("{} ORDER BY created_at DESC, id DESC", POSTER_TEMPLATE_SELECT);
    let rows = sqlx::query_as::<_, PosterTemplate>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_template(pool: &SqlitePool, id: i64) -> RepoResult<Option<PosterTemplate>> {
    let sql = format!("{} WHERE id = ?", POSTER_TEMPLATE_SELECT);
    let row = sqlx::query_as::<_, PosterTemplate>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create_template(
    pool: &SqlitePool,
    data: PosterTemplateCreate,
) -> RepoResult<PosterTemplate> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let layout_json =
        serde_json::to_string(&data.layout_config).unwrap_or_else(|_| "{}".to_string());
    sqlx::query(
        "INSERT INTO poster_template (id, name, description, layout_config, width, height, thumbnail_url, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(&layout_json)
    .bind(data.width)
    .bind(data.height)
    .bind(&data.thumbnail_url)
    .bind(now)
    .execute(pool)
    .await?;
    find_template(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create poster template".into()))
}

// ── Generated posters ───────────────────────────────────────────────

const GENERATED_POSTER_SELECT: &str = "SELECT id, user_id, template_id, title, content, image_url, compliance_checked, compliance_issues, created_at FROM generated_poster";

pub async fn find_poster(pool: &SqlitePool, id: i64) -> RepoResult<Option<GeneratedPoster>> {
    let sql = format!("{} WHERE id = ?", GENERATED_POSTER_SELECT);
    let row = sqlx::query_as::<_, GeneratedPoster>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_posters(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<GeneratedPoster>> {
    let sql = format!(
        "{} WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        GENERATED_POSTER_SELECT
    );
    let rows = sqlx::query_as::<_, GeneratedPoster>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create_poster(
    pool: &SqlitePool,
    user_id: i64,
    template_id: Option<i64>,
    title: &str,
    content: &str,
    image_url: &str,
    compliance_issues: &[String],
) -> RepoResult<GeneratedPoster> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let issues_json = if compliance_issues.is_empty() {
        None
    } else {
        Some(serde_json::to_string(compliance_issues).unwrap_or_else(|_| "[]".to_string()))
    };
    sqlx::query(
        "INSERT INTO generated_poster (id, user_id, template_id, title, content, image_url, compliance_checked, compliance_issues, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8)",
    )
    .bind(id)
    .bind(user_id)
    .bind(template_id)
    .bind(title)
    .bind(content)
    .bind(image_url)
    .bind(&issues_json)
    .bind(now)
    .execute(pool)
    .await?;
    find_poster(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create poster".into()))
}
