//! Face Image Repository
//!
//! Rows are immutable after insert. Deleting an image cascades to its
//! analyses and simulations inside one transaction, children first.

use super::{RepoError, RepoResult};
use shared::models::{FaceImage, ImageQualityStatus, QualityReport};
use sqlx::SqlitePool;

const FACE_IMAGE_SELECT: &str = "SELECT id, user_id, file_path, quality_status, quality_score, quality_issues, created_at FROM face_image";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<FaceImage>> {
    let sql = format!("{} WHERE id = ?", FACE_IMAGE_SELECT);
    let row = sqlx::query_as::<_, FaceImage>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_owned(pool: &SqlitePool, id: i64, user_id: i64) -> RepoResult<Option<FaceImage>> {
    let sql = format!("{} WHERE id = ? AND user_id = ?", FACE_IMAGE_SELECT);
    let row = sqlx::query_as::<_, FaceImage>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    file_path: &str,
    quality_status: ImageQualityStatus,
    quality_score: f64,
    quality_issues: &QualityReport,
) -> RepoResult<FaceImage> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let issues_json =
        serde_json::to_string(quality_issues).unwrap_or_else(|_| "{}".to_string());
    sqlx::query(
        "INSERT INTO face_image (id, user_id, file_path, quality_status, quality_score, quality_issues, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(id)
    .bind(user_id)
    .bind(file_path)
    .bind(quality_status)
    .bind(quality_score)
    .bind(&issues_json)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create face image".into()))
}

/// Delete an image together with its analyses and simulations.
///
/// Children are removed first so the foreign keys stay satisfied at every
/// point inside the transaction.
pub async fn delete_cascade(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM simulation WHERE analysis_id IN (SELECT id FROM skin_analysis WHERE image_id = ?)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM skin_analysis WHERE image_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM face_image WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}
