//! Simulation Repository
//!
//! Simulation rows move through exactly one transition:
//! `processing` -> `completed` or `processing` -> `failed`.
//! Both terminal updates are guarded on the current status so a second
//! writer can never overwrite a finished row.

use super::{RepoError, RepoResult};
use shared::models::{Simulation, SimulationListItem};
use sqlx::SqlitePool;

const SIMULATION_SELECT: &str = "SELECT id, analysis_id, user_id, treatment_type, intensity, simulated_image_path, comparison_image_path, status, parameters, created_at, completed_at FROM simulation";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Simulation>> {
    let sql = format!("{} WHERE id = ?", SIMULATION_SELECT);
    let row = sqlx::query_as::<_, Simulation>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_owned(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
) -> RepoResult<Option<Simulation>> {
    let sql = format!("{} WHERE id = ? AND user_id = ?", SIMULATION_SELECT);
    let row = sqlx::query_as::<_, Simulation>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert a new simulation in `processing` state.
pub async fn create_processing(
    pool: &SqlitePool,
    analysis_id: i64,
    user_id: i64,
    treatment_type: &str,
    intensity: i64,
    parameters: Option<&serde_json::Value>,
) -> RepoResult<Simulation> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let parameters_json = parameters
        .map(|p| serde_json::to_string(p).unwrap_or_else(|_| "null".to_string()));
    sqlx::query(
        "INSERT INTO simulation (id, analysis_id, user_id, treatment_type, intensity, simulated_image_path, comparison_image_path, status, parameters, created_at, completed_at) VALUES (?1, ?2, ?3, ?4, ?5, '', NULL, 'processing', ?6, ?7, NULL)",
    )
    .bind(id)
    .bind(analysis_id)
    .bind(user_id)
    .bind(treatment_type)
    .bind(intensity)
    .bind(&parameters_json)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create simulation".into()))
}

/// Finish a simulation with its artifact paths.
///
/// Returns `false` when the row was not in `processing`, in which case
/// nothing was written.
pub async fn mark_completed(
    pool: &SqlitePool,
    id: i64,
    simulated_image_path: &str,
    comparison_image_path: &str,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE simulation SET simulated_image_path = ?1, comparison_image_path = ?2, status = 'completed', completed_at = ?3 WHERE id = ?4 AND status = 'processing'",
    )
    .bind(simulated_image_path)
    .bind(comparison_image_path)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Mark a simulation as failed. Guarded the same way as [`mark_completed`].
/// `completed_at` stays NULL; only successful runs carry a completion time.
pub async fn mark_failed(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE simulation SET status = 'failed' WHERE id = ? AND status = 'processing'",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn count_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<i64> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM simulation WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(total)
}

/// Newest first. The id tiebreak keeps the order stable when two rows
/// share a millisecond timestamp.
pub async fn list_by_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<SimulationListItem>> {
    let rows = sqlx::query_as::<_, SimulationListItem>(
        "SELECT id, treatment_type, status, created_at, completed_at FROM simulation WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
