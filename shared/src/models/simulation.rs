//! Treatment Simulation Model

use serde::{Deserialize, Serialize};

/// Simulation lifecycle state (模拟状态)
///
/// `Processing` is the only non-terminal state. `Completed` and
/// `Failed` are terminal; transition guards in the repository keep
/// terminal rows immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum SimulationStatus {
    Processing,
    Completed,
    Failed,
}

impl SimulationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SimulationStatus::Processing)
    }
}

/// Treatment simulation record (治疗模拟)
///
/// `user_id` denormalizes the owner from the image chain so ownership
/// checks never need a join. Artifact paths are relative to the server
/// work dir; `simulated_image_path` is empty and `comparison_image_path`
/// NULL until the pipeline completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Simulation {
    pub id: i64,
    pub analysis_id: i64,
    pub user_id: i64,
    pub treatment_type: String,
    /// Requested treatment intensity, 1–10
    pub intensity: i64,
    pub simulated_image_path: String,
    pub comparison_image_path: Option<String>,
    pub status: SimulationStatus,
    /// Caller-supplied parameter bag, recorded verbatim at creation
    pub parameters: Option<serde_json::Value>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

/// Simulate request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationCreate {
    pub analysis_id: i64,
    pub treatment_type: String,
    #[serde(default = "default_intensity")]
    pub intensity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

fn default_intensity() -> i64 {
    5
}

/// Light row for the simulations list view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SimulationListItem {
    pub id: i64,
    pub treatment_type: String,
    pub status: SimulationStatus,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

/// Paginated simulations listing
///
/// `total` counts all of the caller's simulations, independent of the
/// skip/limit window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationPage {
    pub total: i64,
    pub items: Vec<SimulationListItem>,
}
