//! Facial Simulation API Handlers
//!
//! Upload face photos, trigger skin analysis, run treatment simulations
//! and browse the resulting records. All heavy lifting lives in
//! [`crate::facesim::FaceSimService`]; handlers only translate HTTP.

use axum::{
    Json,
    extract::{Extension, Multipart, Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};
use shared::models::{
    FaceImage, Simulation, SimulationCreate, SimulationPage, SkinAnalysisBatch, SkinAnalysisCreate,
};

/// Pagination window for the simulations list
#[derive(Debug, Deserialize)]
pub struct SimulationListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// POST /api/facesim/upload - Upload a face photo (multipart, field `file`)
///
/// The photo is quality-checked and persisted with its verdict; a failed
/// verdict still returns the record so the client can show the findings.
pub async fn upload(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<Json<FaceImage>> {
    // Find the file field
    let mut field_data: Option<Vec<u8>> = None;
    let mut original_filename = None;
    let mut content_type = None;

    while let Some(f) = multipart.next_field().await? {
        let name = f.name().map(|s| s.to_string());
        if name.as_deref() == Some("file") || name.as_deref() == Some("") {
            original_filename = f.file_name().map(|s| s.to_string());
            content_type = f.content_type().map(|s| s.to_string());
            field_data = Some(f.bytes().await?.to_vec());
            break;
        }
    }

    let data = field_data.ok_or_else(|| {
        AppError::validation("No 'file' field found. Field name must be 'file'".to_string())
    })?;

    let filename = original_filename
        .ok_or_else(|| AppError::validation("No filename provided in file field".to_string()))?;

    // Clients that omit the part content type fall back to the filename
    let content_type = content_type
        .or_else(|| mime_guess::from_path(&filename).first().map(|m| m.to_string()));
    if !content_type.as_deref().is_some_and(|ct| ct.starts_with("image/")) {
        return Err(AppError::validation("Only image uploads are accepted"));
    }

    let image = state.facesim.upload(user.id, &filename, data).await?;

    Ok(Json(image))
}

/// POST /api/facesim/analyze - Detect skin issues on an uploaded photo
///
/// An empty `issue_types` list runs the default category set.
pub async fn analyze(
    State(state): State<ServerState>,
    Json(req): Json<SkinAnalysisCreate>,
) -> AppResult<Json<SkinAnalysisBatch>> {
    let batch = state.facesim.analyze(req.image_id, req.issue_types).await?;
    Ok(Json(batch))
}

/// POST /api/facesim/simulate - Run a treatment simulation for an analysis
pub async fn simulate(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SimulationCreate>,
) -> AppResult<Json<Simulation>> {
    let simulation = state.facesim.simulate(user.id, req).await?;
    Ok(Json(simulation))
}

/// GET /api/facesim/simulations - List the caller's simulations (newest first)
pub async fn list_simulations(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<SimulationListQuery>,
) -> AppResult<Json<SimulationPage>> {
    let page = state
        .facesim
        .list_simulations(user.id, query.skip, query.limit)
        .await?;
    Ok(Json(page))
}

/// GET /api/facesim/simulations/:id - Get one of the caller's simulations
pub async fn simulation_detail(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Simulation>> {
    let simulation = state.facesim.simulation_detail(user.id, id).await?;
    Ok(Json(simulation))
}

/// DELETE /api/facesim/images/:id - Delete a photo with its analyses and simulations
pub async fn delete_image(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.facesim.delete_image(user.id, id).await?;

    tracing::info!(image_id = id, user_id = user.id, "Face image deleted");

    Ok(Json(true))
}
