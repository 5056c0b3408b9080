//! Skin Analysis Repository

use super::{RepoError, RepoResult};
use shared::models::{DetectedAreas, SkinAnalysis, SkinIssueType};
use sqlx::SqlitePool;

const SKIN_ANALYSIS_SELECT: &str = "SELECT id, image_id, issue_type, severity, detected_areas, confidence, created_at FROM skin_analysis";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<SkinAnalysis>> {
    let sql = format!("{} WHERE id = ?", SKIN_ANALYSIS_SELECT);
    let row = sqlx::query_as::<_, SkinAnalysis>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_image(pool: &SqlitePool, image_id: i64) -> RepoResult<Vec<SkinAnalysis>> {
    let sql = format!("{} WHERE image_id = ? ORDER BY created_at, id", SKIN_ANALYSIS_SELECT);
    let rows = sqlx::query_as::<_, SkinAnalysis>(&sql)
        .bind(image_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create(
    pool: &SqlitePool,
    image_id: i64,
    issue_type: SkinIssueType,
    severity: i64,
    detected_areas: &DetectedAreas,
    confidence: f64,
) -> RepoResult<SkinAnalysis> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let areas_json =
        serde_json::to_string(detected_areas).unwrap_or_else(|_| "{}".to_string());
    sqlx::query(
        "INSERT INTO skin_analysis (id, image_id, issue_type, severity, detected_areas, confidence, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(id)
    .bind(image_id)
    .bind(issue_type)
    .bind(severity)
    .bind(&areas_json)
    .bind(confidence)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create skin analysis".into()))
}
