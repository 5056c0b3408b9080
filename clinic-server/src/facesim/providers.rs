//! Model Provider Seams
//!
//! Each stage of the simulation pipeline sits behind a trait so the stub
//! models can be swapped for real inference services without touching the
//! workflow code. The stub provider returns fixed verdicts and produces
//! artifacts by copying the source image.

use async_trait::async_trait;
use shared::models::{DetectedAreas, QualityReport, Region, SkinIssueType};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by model providers
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("Artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Verdict from the quality inspector
#[derive(Debug, Clone)]
pub struct QualityVerdict {
    pub passed: bool,
    /// Quality score in [0.0, 1.0]
    pub score: f64,
    pub report: QualityReport,
}

/// One detector finding for a single issue category
#[derive(Debug, Clone)]
pub struct DetectedIssue {
    pub issue_type: SkinIssueType,
    pub severity: i64,
    pub areas: DetectedAreas,
    pub confidence: f64,
}

/// Judges whether an uploaded photo is usable for analysis
#[async_trait]
pub trait QualityInspector: Send + Sync {
    async fn inspect(&self, image: &[u8]) -> Result<QualityVerdict, ProviderError>;
}

/// Locates skin issues of the requested categories in a stored photo
#[async_trait]
pub trait IssueDetector: Send + Sync {
    async fn detect(
        &self,
        image_path: &Path,
        issue_types: &[SkinIssueType],
    ) -> Result<Vec<DetectedIssue>, ProviderError>;
}

/// Produces the post-treatment preview image
#[async_trait]
pub trait SimulationRenderer: Send + Sync {
    async fn render(
        &self,
        original: &Path,
        issue_type: SkinIssueType,
        intensity: i64,
    ) -> Result<PathBuf, ProviderError>;
}

/// Produces the side-by-side before/after artifact
#[async_trait]
pub trait ComparisonComposer: Send + Sync {
    async fn compose(&self, original: &Path, simulated: &Path) -> Result<PathBuf, ProviderError>;
}

/// Placeholder provider used until the real inference services are wired in.
///
/// Artifacts land in `output_dir` with `sim_` / `comp_` prefixed names.
#[derive(Debug, Clone)]
pub struct StubModelProvider {
    output_dir: PathBuf,
}

impl StubModelProvider {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl QualityInspector for StubModelProvider {
    async fn inspect(&self, _image: &[u8]) -> Result<QualityVerdict, ProviderError> {
        Ok(QualityVerdict {
            passed: true,
            score: 0.92,
            report: QualityReport {
                brightness: "good".to_string(),
                blur: "none".to_string(),
                face_detected: true,
            },
        })
    }
}

#[async_trait]
impl IssueDetector for StubModelProvider {
    async fn detect(
        &self,
        _image_path: &Path,
        issue_types: &[SkinIssueType],
    ) -> Result<Vec<DetectedIssue>, ProviderError> {
        Ok(issue_types
            .iter()
            .map(|&issue_type| DetectedIssue {
                issue_type,
                severity: 6,
                areas: DetectedAreas {
                    regions: vec![
                        Region {
                            x: 100,
                            y: 150,
                            width: 50,
                            height: 50,
                        },
                        Region {
                            x: 200,
                            y: 180,
                            width: 40,
                            height: 40,
                        },
                    ],
                },
                confidence: 0.87,
            })
            .collect())
    }
}

#[async_trait]
impl SimulationRenderer for StubModelProvider {
    async fn render(
        &self,
        original: &Path,
        _issue_type: SkinIssueType,
        _intensity: i64,
    ) -> Result<PathBuf, ProviderError> {
        let output = self.output_dir.join(format!("sim_{}.jpg", Uuid::new_v4()));
        tokio::fs::copy(original, &output).await?;
        Ok(output)
    }
}

#[async_trait]
impl ComparisonComposer for StubModelProvider {
    async fn compose(
        &self,
        _original: &Path,
        simulated: &Path,
    ) -> Result<PathBuf, ProviderError> {
        let output = self.output_dir.join(format!("comp_{}.jpg", Uuid::new_v4()));
        tokio::fs::copy(simulated, &output).await?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_quality_verdict() {
        let provider = StubModelProvider::new(std::env::temp_dir());
        let verdict = provider.inspect(b"fake image bytes").await.unwrap();

        assert!(verdict.passed);
        assert!(verdict.score > 0.9);
        assert!(verdict.report.face_detected);
        assert_eq!(verdict.report.brightness, "good");
        assert_eq!(verdict.report.blur, "none");
    }

    #[tokio::test]
    async fn test_stub_detector_one_finding_per_category() {
        let provider = StubModelProvider::new(std::env::temp_dir());
        let requested = [SkinIssueType::Acne, SkinIssueType::Wrinkle];

        let findings = provider
            .detect(Path::new("unused.jpg"), &requested)
            .await
            .unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].issue_type, SkinIssueType::Acne);
        assert_eq!(findings[1].issue_type, SkinIssueType::Wrinkle);
        for finding in &findings {
            assert_eq!(finding.severity, 6);
            assert_eq!(finding.areas.regions.len(), 2);
            assert!((finding.confidence - 0.87).abs() < f64::EPSILON);
        }
    }

    #[tokio::test]
    async fn test_stub_render_and_compose_copy_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let provider = StubModelProvider::new(dir.path());

        let original = dir.path().join("face.jpg");
        tokio::fs::write(&original, b"original-bytes").await.unwrap();

        let simulated = provider
            .render(&original, SkinIssueType::Acne, 5)
            .await
            .unwrap();
        assert!(simulated.file_name().unwrap().to_string_lossy().starts_with("sim_"));
        assert_eq!(tokio::fs::read(&simulated).await.unwrap(), b"original-bytes");

        let comparison = provider.compose(&original, &simulated).await.unwrap();
        assert!(comparison.file_name().unwrap().to_string_lossy().starts_with("comp_"));
        assert_eq!(tokio::fs::read(&comparison).await.unwrap(), b"original-bytes");
    }

    #[tokio::test]
    async fn test_stub_render_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let provider = StubModelProvider::new(dir.path());

        let result = provider
            .render(&dir.path().join("missing.jpg"), SkinIssueType::Spot, 5)
            .await;
        assert!(result.is_err());
    }
}
