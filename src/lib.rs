//! INSPECTA-OS: Handheld Visual Inspection Intelligence
//!
//! Workflow engine for guided part inspection on a handheld device.
//!
//! ## Architecture
//!
//! - **Workflow**: state machine walking an inspector through photo captures
//!   and defect classification, one report page at a time
//! - **Catalog**: project-scoped acceptance criteria loaded from CSV files,
//!   columns resolved by configurable keyword
//! - **Guidelines**: overlay-side policy for the capture screen
//! - **Camera / Output**: collaborator seams for frame acquisition and
//!   best-effort image persistence

pub mod api;
pub mod camera;
pub mod catalog;
pub mod config;
pub mod guidelines;
pub mod output;
pub mod types;
pub mod workflow;

// Re-export station configuration
pub use config::StationConfig;

// Re-export commonly used types
pub use types::{
    ConfirmAction, CriteriaDecision, DefectSelection, EndAction, ImageSlot,
    InspectionSession, SessionSnapshot, WorkflowAction, WorkflowState,
};

// Re-export catalog
pub use catalog::{CatalogError, ColumnKeywords, CriteriaCatalog};

// Re-export guideline policy
pub use guidelines::{GuidelineSelector, GuidelineSide};

// Re-export camera seam
pub use camera::{Camera, CameraError, FrameEvent, FrameStream, SyntheticCamera};

// Re-export workflow
pub use workflow::{InspectionWorkflow, WorkflowError};
