//! Facial Skin Simulation
//!
//! Upload and quality-check face photos, detect skin issues, and render
//! treatment previews with before/after comparison artifacts. Model stages
//! are trait seams with stub implementations for now.

mod providers;
mod service;

pub use providers::{
    ComparisonComposer, DetectedIssue, IssueDetector, ProviderError, QualityInspector,
    QualityVerdict, SimulationRenderer, StubModelProvider,
};
pub use service::{
    DEFAULT_ISSUE_TYPES, FACESIM_UPLOAD_DIR, FaceSimError, FaceSimService, MAX_INTENSITY,
    MIN_INTENSITY,
};
