//! Simulation Workflow Service
//!
//! Drives the upload -> analyze -> simulate pipeline and owns the artifact
//! directory layout. Stored paths are relative to the work directory so the
//! database stays valid when the deployment moves.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use shared::models::{
    FaceImage, ImageQualityStatus, Simulation, SimulationCreate, SimulationPage, SkinAnalysis,
    SkinAnalysisBatch, SkinIssueType,
};

use crate::db::repository::{RepoError, face_image, simulation, skin_analysis};
use crate::facesim::providers::{
    ComparisonComposer, IssueDetector, QualityInspector, SimulationRenderer, StubModelProvider,
};
use crate::utils::AppError;
use crate::utils::validation::MAX_SHORT_TEXT_LEN;

/// Upload directory relative to the work dir
pub const FACESIM_UPLOAD_DIR: &str = "uploads/facesim";

/// Intensity scale bounds for simulations
pub const MIN_INTENSITY: i64 = 1;
pub const MAX_INTENSITY: i64 = 10;

/// Default categories when an analyze request names none
pub const DEFAULT_ISSUE_TYPES: [SkinIssueType; 2] = [SkinIssueType::Acne, SkinIssueType::Spot];

/// Workflow errors
#[derive(Debug, Error)]
pub enum FaceSimError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Model provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<RepoError> for FaceSimError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(msg) => FaceSimError::NotFound(msg),
            RepoError::Duplicate(msg) => FaceSimError::InvalidArgument(msg),
            RepoError::Database(msg) => FaceSimError::Database(msg),
            RepoError::Validation(msg) => FaceSimError::InvalidArgument(msg),
        }
    }
}

impl From<FaceSimError> for AppError {
    fn from(e: FaceSimError) -> Self {
        match e {
            FaceSimError::InvalidArgument(msg) => AppError::Validation(msg),
            FaceSimError::NotFound(msg) => AppError::NotFound(msg),
            FaceSimError::Storage(msg) => AppError::Internal(msg),
            FaceSimError::Provider(msg) => AppError::External(msg),
            FaceSimError::Database(msg) => AppError::Database(msg),
        }
    }
}

/// Facial skin simulation service
///
/// Cheap to clone; handlers share one instance through the server state.
#[derive(Clone)]
pub struct FaceSimService {
    pool: SqlitePool,
    work_dir: PathBuf,
    quality: Arc<dyn QualityInspector>,
    detector: Arc<dyn IssueDetector>,
    renderer: Arc<dyn SimulationRenderer>,
    composer: Arc<dyn ComparisonComposer>,
}

impl FaceSimService {
    /// Create a service backed by the stub providers.
    pub fn new(pool: SqlitePool, work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let stub = Arc::new(StubModelProvider::new(work_dir.join(FACESIM_UPLOAD_DIR)));
        Self {
            pool,
            work_dir,
            quality: stub.clone(),
            detector: stub.clone(),
            renderer: stub.clone(),
            composer: stub,
        }
    }

    /// Create a service with explicit providers.
    pub fn with_providers(
        pool: SqlitePool,
        work_dir: impl Into<PathBuf>,
        quality: Arc<dyn QualityInspector>,
        detector: Arc<dyn IssueDetector>,
        renderer: Arc<dyn SimulationRenderer>,
        composer: Arc<dyn ComparisonComposer>,
    ) -> Self {
        Self {
            pool,
            work_dir: work_dir.into(),
            quality,
            detector,
            renderer,
            composer,
        }
    }

    /// Store an uploaded photo, run the quality check and record the result.
    ///
    /// The stored filename is the SHA-256 of the content, so re-uploading the
    /// same photo overwrites the identical file instead of piling up copies.
    pub async fn upload(
        &self,
        user_id: i64,
        original_filename: &str,
        data: Vec<u8>,
    ) -> Result<FaceImage, FaceSimError> {
        if data.is_empty() {
            return Err(FaceSimError::InvalidArgument(
                "Uploaded file is empty".to_string(),
            ));
        }

        let verdict = self.quality.inspect(&data).await.map_err(|e| {
            FaceSimError::Provider(format!("Quality inspection failed: {e}"))
        })?;

        let hash = hex::encode(Sha256::digest(&data));
        let ext = Path::new(original_filename)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        let relative_path = format!("{FACESIM_UPLOAD_DIR}/{hash}{ext}");
        let absolute_path = self.work_dir.join(&relative_path);

        if let Some(parent) = absolute_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FaceSimError::Storage(format!("Failed to create upload dir: {e}")))?;
        }
        tokio::fs::write(&absolute_path, &data)
            .await
            .map_err(|e| FaceSimError::Storage(format!("Failed to store upload: {e}")))?;

        let status = if verdict.passed {
            ImageQualityStatus::Passed
        } else {
            ImageQualityStatus::Failed
        };

        let image = face_image::create(
            &self.pool,
            user_id,
            &relative_path,
            status,
            verdict.score,
            &verdict.report,
        )
        .await?;

        tracing::info!(
            image_id = image.id,
            user_id,
            quality_status = %status,
            "Face image stored"
        );
        Ok(image)
    }

    /// Run the issue detector over a stored photo and append one analysis
    /// record per finding. An empty category list means acne + spot.
    pub async fn analyze(
        &self,
        image_id: i64,
        issue_types: Vec<SkinIssueType>,
    ) -> Result<SkinAnalysisBatch, FaceSimError> {
        let image = face_image::find_by_id(&self.pool, image_id)
            .await?
            .ok_or_else(|| FaceSimError::NotFound(format!("Image {image_id} not found")))?;

        let requested = if issue_types.is_empty() {
            DEFAULT_ISSUE_TYPES.to_vec()
        } else {
            issue_types
        };

        let image_path = self.work_dir.join(&image.file_path);
        let findings = self
            .detector
            .detect(&image_path, &requested)
            .await
            .map_err(|e| FaceSimError::Provider(format!("Skin detection failed: {e}")))?;

        let mut analyses: Vec<SkinAnalysis> = Vec::with_capacity(findings.len());
        for finding in findings {
            let analysis = skin_analysis::create(
                &self.pool,
                image_id,
                finding.issue_type,
                finding.severity,
                &finding.areas,
                finding.confidence,
            )
            .await?;
            analyses.push(analysis);
        }

        tracing::info!(image_id, count = analyses.len(), "Skin analysis recorded");
        Ok(SkinAnalysisBatch { image_id, analyses })
    }

    /// Run the render + compose pipeline for one analysis.
    ///
    /// The record is committed in `processing` before any model work starts,
    /// then finished with a single guarded update. A provider failure marks
    /// the record `failed` and returns it; the caller still gets a 200 with
    /// the terminal state.
    pub async fn simulate(
        &self,
        user_id: i64,
        data: SimulationCreate,
    ) -> Result<Simulation, FaceSimError> {
        let treatment_type = data.treatment_type.trim();
        if treatment_type.is_empty() {
            return Err(FaceSimError::InvalidArgument(
                "treatment_type must not be empty".to_string(),
            ));
        }
        if treatment_type.len() > MAX_SHORT_TEXT_LEN {
            return Err(FaceSimError::InvalidArgument(format!(
                "treatment_type is too long (max {MAX_SHORT_TEXT_LEN} chars)"
            )));
        }
        if !(MIN_INTENSITY..=MAX_INTENSITY).contains(&data.intensity) {
            return Err(FaceSimError::InvalidArgument(format!(
                "intensity must be between {MIN_INTENSITY} and {MAX_INTENSITY}"
            )));
        }

        let analysis = skin_analysis::find_by_id(&self.pool, data.analysis_id)
            .await?
            .ok_or_else(|| {
                FaceSimError::NotFound(format!("Analysis {} not found", data.analysis_id))
            })?;
        let image = face_image::find_by_id(&self.pool, analysis.image_id)
            .await?
            .ok_or_else(|| {
                FaceSimError::NotFound(format!("Image {} not found", analysis.image_id))
            })?;

        let record = simulation::create_processing(
            &self.pool,
            analysis.id,
            user_id,
            treatment_type,
            data.intensity,
            data.parameters.as_ref(),
        )
        .await?;

        let original_path = self.work_dir.join(&image.file_path);
        let artifacts = self
            .run_pipeline(&original_path, analysis.issue_type, data.intensity)
            .await;

        match artifacts {
            Ok((simulated, comparison)) => {
                let simulated_rel = self.relative_artifact(&simulated);
                let comparison_rel = self.relative_artifact(&comparison);
                let updated = simulation::mark_completed(
                    &self.pool,
                    record.id,
                    &simulated_rel,
                    &comparison_rel,
                )
                .await?;
                if !updated {
                    tracing::warn!(
                        simulation_id = record.id,
                        "Simulation already left processing, keeping existing terminal state"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    simulation_id = record.id,
                    error = %e,
                    "Simulation pipeline failed, marking record failed"
                );
                simulation::mark_failed(&self.pool, record.id).await?;
            }
        }

        simulation::find_by_id(&self.pool, record.id)
            .await?
            .ok_or_else(|| FaceSimError::Database("Simulation vanished during update".to_string()))
    }

    async fn run_pipeline(
        &self,
        original: &Path,
        issue_type: SkinIssueType,
        intensity: i64,
    ) -> Result<(PathBuf, PathBuf), FaceSimError> {
        let simulated = self
            .renderer
            .render(original, issue_type, intensity)
            .await
            .map_err(|e| FaceSimError::Provider(format!("Simulation render failed: {e}")))?;
        let comparison = self
            .composer
            .compose(original, &simulated)
            .await
            .map_err(|e| FaceSimError::Provider(format!("Comparison compose failed: {e}")))?;
        Ok((simulated, comparison))
    }

    fn relative_artifact(&self, path: &Path) -> String {
        path.strip_prefix(&self.work_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    /// List one user's simulations, newest first, with the pre-pagination total.
    pub async fn list_simulations(
        &self,
        user_id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<SimulationPage, FaceSimError> {
        if skip < 0 {
            return Err(FaceSimError::InvalidArgument(
                "skip must not be negative".to_string(),
            ));
        }
        if limit < 0 {
            return Err(FaceSimError::InvalidArgument(
                "limit must not be negative".to_string(),
            ));
        }

        let total = simulation::count_by_user(&self.pool, user_id).await?;
        let items = simulation::list_by_user(&self.pool, user_id, limit, skip).await?;
        Ok(SimulationPage { total, items })
    }

    /// Fetch one simulation, scoped to its owner.
    pub async fn simulation_detail(
        &self,
        user_id: i64,
        simulation_id: i64,
    ) -> Result<Simulation, FaceSimError> {
        simulation::find_owned(&self.pool, simulation_id, user_id)
            .await?
            .ok_or_else(|| {
                FaceSimError::NotFound(format!("Simulation {simulation_id} not found"))
            })
    }

    /// Delete an owned image together with its analyses and simulations.
    pub async fn delete_image(&self, user_id: i64, image_id: i64) -> Result<(), FaceSimError> {
        let image = face_image::find_owned(&self.pool, image_id, user_id)
            .await?
            .ok_or_else(|| FaceSimError::NotFound(format!("Image {image_id} not found")))?;

        face_image::delete_cascade(&self.pool, image_id).await?;

        // Remove the stored upload; generated artifacts are content-addressed
        // and harmless to leave behind.
        let _ = tokio::fs::remove_file(self.work_dir.join(&image.file_path)).await;

        tracing::info!(image_id, user_id, "Face image deleted with dependents");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::facesim::providers::ProviderError;
    use async_trait::async_trait;
    use shared::models::UserRole;
    use tempfile::TempDir;

    struct FailingRenderer;

    #[async_trait]
    impl SimulationRenderer for FailingRenderer {
        async fn render(
            &self,
            _original: &Path,
            _issue_type: SkinIssueType,
            _intensity: i64,
        ) -> Result<PathBuf, ProviderError> {
            Err(ProviderError::Inference("model offline".to_string()))
        }
    }

    async fn setup() -> (TempDir, FaceSimService, i64) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("test.db");
        let db = DbService::new(db_path.to_str().expect("utf8 path"))
            .await
            .expect("open db");
        let user = crate::db::repository::user::create(
            &db.pool,
            "tester",
            "tester@clinic.local",
            "not-a-real-hash",
            UserRole::Consultant,
        )
        .await
        .expect("create user");
        let service = FaceSimService::new(db.pool.clone(), dir.path());
        (dir, service, user.id)
    }

    #[tokio::test]
    async fn test_upload_stores_file_and_record() {
        let (dir, service, user_id) = setup().await;

        let image = service
            .upload(user_id, "selfie.JPG", b"front-facing photo".to_vec())
            .await
            .expect("upload");

        assert_eq!(image.user_id, user_id);
        assert_eq!(image.quality_status, ImageQualityStatus::Passed);
        assert!(image.quality_score > 0.9);
        assert!(image.file_path.starts_with(FACESIM_UPLOAD_DIR));
        assert!(image.file_path.ends_with(".jpg"));

        let stored = dir.path().join(&image.file_path);
        assert_eq!(
            tokio::fs::read(&stored).await.expect("stored file"),
            b"front-facing photo"
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_body() {
        let (_dir, service, user_id) = setup().await;

        let err = service.upload(user_id, "empty.jpg", Vec::new()).await;
        assert!(matches!(err, Err(FaceSimError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_analyze_defaults_to_acne_and_spot() {
        let (_dir, service, user_id) = setup().await;
        let image = service
            .upload(user_id, "selfie.jpg", b"photo".to_vec())
            .await
            .expect("upload");

        let batch = service.analyze(image.id, Vec::new()).await.expect("analyze");

        assert_eq!(batch.image_id, image.id);
        assert_eq!(batch.analyses.len(), 2);
        assert_eq!(batch.analyses[0].issue_type, SkinIssueType::Acne);
        assert_eq!(batch.analyses[1].issue_type, SkinIssueType::Spot);
        for analysis in &batch.analyses {
            assert_eq!(analysis.severity, 6);
            assert_eq!(analysis.detected_areas.regions.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_analyze_unknown_image() {
        let (_dir, service, _user_id) = setup().await;

        let err = service.analyze(999, vec![SkinIssueType::Acne]).await;
        assert!(matches!(err, Err(FaceSimError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_simulate_happy_path() {
        let (dir, service, user_id) = setup().await;
        let image = service
            .upload(user_id, "selfie.jpg", b"photo".to_vec())
            .await
            .expect("upload");
        let batch = service
            .analyze(image.id, vec![SkinIssueType::Acne])
            .await
            .expect("analyze");

        let sim = service
            .simulate(
                user_id,
                SimulationCreate {
                    analysis_id: batch.analyses[0].id,
                    treatment_type: "祛痘".to_string(),
                    intensity: 7,
                    parameters: None,
                },
            )
            .await
            .expect("simulate");

        assert_eq!(sim.status, shared::models::SimulationStatus::Completed);
        assert_eq!(sim.intensity, 7);
        assert!(sim.completed_at.is_some());
        assert!(sim.completed_at.expect("completed_at") >= sim.created_at);

        // Both artifacts exist on disk under the work dir
        assert!(dir.path().join(&sim.simulated_image_path).exists());
        let comparison = sim.comparison_image_path.expect("comparison path");
        assert!(dir.path().join(&comparison).exists());
    }

    #[tokio::test]
    async fn test_simulate_intensity_out_of_range() {
        let (_dir, service, user_id) = setup().await;

        let err = service
            .simulate(
                user_id,
                SimulationCreate {
                    analysis_id: 1,
                    treatment_type: "祛斑".to_string(),
                    intensity: 11,
                    parameters: None,
                },
            )
            .await;
        assert!(matches!(err, Err(FaceSimError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_simulate_provider_failure_yields_failed_record() {
        let (dir, service, user_id) = setup().await;
        let image = service
            .upload(user_id, "selfie.jpg", b"photo".to_vec())
            .await
            .expect("upload");
        let batch = service
            .analyze(image.id, vec![SkinIssueType::Spot])
            .await
            .expect("analyze");

        let pool = service.pool.clone();
        let failing = FaceSimService::with_providers(
            pool,
            dir.path(),
            Arc::new(StubModelProvider::new(dir.path().join(FACESIM_UPLOAD_DIR))),
            Arc::new(StubModelProvider::new(dir.path().join(FACESIM_UPLOAD_DIR))),
            Arc::new(FailingRenderer),
            Arc::new(StubModelProvider::new(dir.path().join(FACESIM_UPLOAD_DIR))),
        );

        let sim = failing
            .simulate(
                user_id,
                SimulationCreate {
                    analysis_id: batch.analyses[0].id,
                    treatment_type: "激光".to_string(),
                    intensity: 5,
                    parameters: None,
                },
            )
            .await
            .expect("failed simulations still return the record");

        assert_eq!(sim.status, shared::models::SimulationStatus::Failed);
        assert!(sim.completed_at.is_none());
        assert!(sim.simulated_image_path.is_empty());
        assert!(sim.comparison_image_path.is_none());
    }

    #[tokio::test]
    async fn test_terminal_status_resists_further_transitions() {
        let (_dir, service, user_id) = setup().await;
        let image = service
            .upload(user_id, "selfie.jpg", b"photo".to_vec())
            .await
            .expect("upload");
        let batch = service
            .analyze(image.id, vec![SkinIssueType::Acne])
            .await
            .expect("analyze");
        let sim = service
            .simulate(
                user_id,
                SimulationCreate {
                    analysis_id: batch.analyses[0].id,
                    treatment_type: "祛痘".to_string(),
                    intensity: 5,
                    parameters: None,
                },
            )
            .await
            .expect("simulate");
        assert_eq!(sim.status, shared::models::SimulationStatus::Completed);

        let failed = simulation::mark_failed(&service.pool, sim.id)
            .await
            .expect("mark_failed");
        assert!(!failed);
        let recompleted = simulation::mark_completed(&service.pool, sim.id, "other.jpg", "comp.jpg")
            .await
            .expect("mark_completed");
        assert!(!recompleted);

        let reloaded = simulation::find_by_id(&service.pool, sim.id)
            .await
            .expect("find")
            .expect("row");
        assert_eq!(reloaded.status, shared::models::SimulationStatus::Completed);
        assert_eq!(reloaded.simulated_image_path, sim.simulated_image_path);
        assert_eq!(reloaded.comparison_image_path, sim.comparison_image_path);
        assert_eq!(reloaded.completed_at, sim.completed_at);
    }

    #[tokio::test]
    async fn test_list_pagination_and_total() {
        let (_dir, service, user_id) = setup().await;
        let image = service
            .upload(user_id, "selfie.jpg", b"photo".to_vec())
            .await
            .expect("upload");
        let batch = service
            .analyze(image.id, vec![SkinIssueType::Acne])
            .await
            .expect("analyze");

        for i in 0..3 {
            service
                .simulate(
                    user_id,
                    SimulationCreate {
                        analysis_id: batch.analyses[0].id,
                        treatment_type: format!("plan-{i}"),
                        intensity: 5,
                        parameters: None,
                    },
                )
                .await
                .expect("simulate");
        }

        let page = service
            .list_simulations(user_id, 0, 2)
            .await
            .expect("list");
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);

        let rest = service
            .list_simulations(user_id, 2, 2)
            .await
            .expect("list rest");
        assert_eq!(rest.total, 3);
        assert_eq!(rest.items.len(), 1);

        let err = service.list_simulations(user_id, -1, 2).await;
        assert!(matches!(err, Err(FaceSimError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_detail_scoped_to_owner() {
        let (_dir, service, user_id) = setup().await;
        let image = service
            .upload(user_id, "selfie.jpg", b"photo".to_vec())
            .await
            .expect("upload");
        let batch = service
            .analyze(image.id, vec![SkinIssueType::Acne])
            .await
            .expect("analyze");
        let sim = service
            .simulate(
                user_id,
                SimulationCreate {
                    analysis_id: batch.analyses[0].id,
                    treatment_type: "祛痘".to_string(),
                    intensity: 5,
                    parameters: None,
                },
            )
            .await
            .expect("simulate");

        let found = service
            .simulation_detail(user_id, sim.id)
            .await
            .expect("owner sees own record");
        assert_eq!(found.id, sim.id);

        let err = service.simulation_detail(user_id + 1, sim.id).await;
        assert!(matches!(err, Err(FaceSimError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_image_cascades() {
        let (dir, service, user_id) = setup().await;
        let image = service
            .upload(user_id, "selfie.jpg", b"photo".to_vec())
            .await
            .expect("upload");
        let batch = service
            .analyze(image.id, vec![SkinIssueType::Acne])
            .await
            .expect("analyze");
        let sim = service
            .simulate(
                user_id,
                SimulationCreate {
                    analysis_id: batch.analyses[0].id,
                    treatment_type: "祛痘".to_string(),
                    intensity: 5,
                    parameters: None,
                },
            )
            .await
            .expect("simulate");

        service
            .delete_image(user_id, image.id)
            .await
            .expect("delete");

        assert!(!dir.path().join(&image.file_path).exists());
        let err = service.simulation_detail(user_id, sim.id).await;
        assert!(matches!(err, Err(FaceSimError::NotFound(_))));
        let err = service.analyze(image.id, Vec::new()).await;
        assert!(matches!(err, Err(FaceSimError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_requires_ownership() {
        let (_dir, service, user_id) = setup().await;
        let image = service
            .upload(user_id, "selfie.jpg", b"photo".to_vec())
            .await
            .expect("upload");

        let err = service.delete_image(user_id + 1, image.id).await;
        assert!(matches!(err, Err(FaceSimError::NotFound(_))));
    }
}
