//! Brand Guard Models
//!
//! VI configuration, poster templates and generated posters, plus the
//! compliance-check wire types.

use serde::{Deserialize, Serialize};

/// Per-user visual identity configuration (VI 配置)
///
/// One row per user; writes use upsert semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ViConfig {
    pub id: i64,
    pub user_id: i64,
    pub brand_name: String,
    /// #RRGGBB
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub logo_url: Option<String>,
    pub font_family: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// VI config create-or-update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViConfigUpsert {
    pub brand_name: String,
    #[serde(default = "default_primary")]
    pub primary_color: String,
    #[serde(default = "default_secondary")]
    pub secondary_color: String,
    #[serde(default = "default_accent")]
    pub accent_color: String,
    pub logo_url: Option<String>,
    #[serde(default = "default_font")]
    pub font_family: String,
}

fn default_primary() -> String {
    "#00A0E9".to_string()
}

fn default_secondary() -> String {
    "#FFFFFF".to_string()
}

fn default_accent() -> String {
    "#F2F2F2".to_string()
}

fn default_font() -> String {
    "PingFang SC".to_string()
}

/// Poster layout template (海报模板)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PosterTemplate {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Element layout (positions, fonts, slots) as free-form JSON
    #[cfg_attr(feature = "db", sqlx(json))]
    pub layout_config: serde_json::Value,
    pub width: i64,
    pub height: i64,
    pub thumbnail_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Poster template create payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterTemplateCreate {
    pub name: String,
    pub description: Option<String>,
    pub layout_config: serde_json::Value,
    #[serde(default = "default_width")]
    pub width: i64,
    #[serde(default = "default_height")]
    pub height: i64,
    pub thumbnail_url: Option<String>,
}

fn default_width() -> i64 {
    1080
}

fn default_height() -> i64 {
    1920
}

/// Generated marketing poster (生成的海报)
///
/// Compliance is checked as a side effect of generation and stored with
/// the poster; issues never block generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct GeneratedPoster {
    pub id: i64,
    pub user_id: i64,
    pub template_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub compliance_checked: bool,
    /// NULL when the content passed the compliance scan
    pub compliance_issues: Option<serde_json::Value>,
    pub created_at: i64,
}

/// Poster generation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterGenerate {
    pub title: String,
    pub content: String,
    pub template_id: Option<i64>,
}

/// Compliance check payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCheckRequest {
    pub content: String,
}

/// Result of a medical-advertising compliance scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub is_compliant: bool,
    /// One entry per prohibited phrase found, e.g. `包含违禁词: 根治`
    pub issues: Vec<String>,
}
