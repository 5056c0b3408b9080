//! Skin Analysis Model

use serde::{Deserialize, Serialize};

/// Detectable skin issue categories (皮肤问题类型)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum SkinIssueType {
    /// 痘痘
    Acne,
    /// 色斑
    Spot,
    /// 皱纹
    Wrinkle,
    /// 毛孔
    Pore,
}

impl SkinIssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkinIssueType::Acne => "acne",
            SkinIssueType::Spot => "spot",
            SkinIssueType::Wrinkle => "wrinkle",
            SkinIssueType::Pore => "pore",
        }
    }
}

impl std::fmt::Display for SkinIssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rectangular image region (pixel coordinates, origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Regions where an issue was detected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedAreas {
    pub regions: Vec<Region>,
}

/// One analysis record per (image, issue category) detector result
/// (皮肤分析记录)
///
/// Immutable after insert; repeated analyze calls append new records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SkinAnalysis {
    pub id: i64,
    pub image_id: i64,
    pub issue_type: SkinIssueType,
    /// Severity on a 1–10 scale
    pub severity: i64,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub detected_areas: DetectedAreas,
    /// Detector confidence in [0.0, 1.0]
    pub confidence: f64,
    pub created_at: i64,
}

/// Analyze request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinAnalysisCreate {
    pub image_id: i64,
    /// Empty list means the default category set (acne + spot)
    #[serde(default)]
    pub issue_types: Vec<SkinIssueType>,
}

/// Analyze response: the freshly appended records, in detector order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinAnalysisBatch {
    pub image_id: i64,
    pub analyses: Vec<SkinAnalysis>,
}
