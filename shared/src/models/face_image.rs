//! Face Image Model

use serde::{Deserialize, Serialize};

/// Quality gate verdict for an uploaded face image (质量状态)
///
/// `Pending` is the pre-verdict state inside the quality pipeline; a
/// persisted row always carries the final `Passed`/`Failed` verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum ImageQualityStatus {
    Pending,
    Passed,
    Failed,
}

impl ImageQualityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQualityStatus::Pending => "pending",
            ImageQualityStatus::Passed => "passed",
            ImageQualityStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ImageQualityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured quality findings produced by the quality inspector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Exposure assessment ("good" | "dark" | "overexposed")
    pub brightness: String,
    /// Blur assessment ("none" | "slight" | "severe")
    pub blur: String,
    /// Whether a face was located in the frame
    pub face_detected: bool,
}

/// Uploaded face photo (人脸照片)
///
/// Immutable after insert; the quality verdict is embedded at creation
/// time, never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct FaceImage {
    pub id: i64,
    pub user_id: i64,
    /// Storage path relative to the server work dir
    pub file_path: String,
    pub quality_status: ImageQualityStatus,
    /// Overall quality score in [0.0, 1.0]
    pub quality_score: f64,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub quality_issues: QualityReport,
    pub created_at: i64,
}
