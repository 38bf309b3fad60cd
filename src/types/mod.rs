//! Core type definitions for the inspection workflow.

mod session;
mod state;

pub use session::{
    DefectSelection, ImageSlot, InspectionSession, SessionImages, SessionSnapshot, FIRST_PAGE,
};
pub use state::{ConfirmAction, CriteriaDecision, EndAction, WorkflowAction, WorkflowState};
