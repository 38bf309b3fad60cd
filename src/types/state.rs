//! Workflow states and the user actions that drive transitions.

use serde::{Deserialize, Serialize};

// ============================================================================
// Workflow States
// ============================================================================

/// State of the guided inspection sequence.
///
/// The happy path is a straight walk from `Project` to `End`; `Criteria`,
/// `Confirmation` and `End` can branch back to earlier states for in-place
/// correction (repeat/drop) or a new part/project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    /// Project and inspector selection, loads the criteria catalog
    #[default]
    Project,
    /// Part number / serial number entry
    Standby,
    /// Part label photo capture
    Label,
    /// Defect type / surface quality / finish selection
    Selection,
    /// Criteria review (accept or re-select)
    Criteria,
    /// Context photo capture with overlay guideline
    Context,
    /// Detail photo capture
    Detail,
    /// Keep / repeat / drop decision for the current page
    Confirmation,
    /// Report page committed; more / new-part / new-project / print
    End,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowState::Project => write!(f, "Project"),
            WorkflowState::Standby => write!(f, "Standby"),
            WorkflowState::Label => write!(f, "Label"),
            WorkflowState::Selection => write!(f, "Selection"),
            WorkflowState::Criteria => write!(f, "Criteria"),
            WorkflowState::Context => write!(f, "Context"),
            WorkflowState::Detail => write!(f, "Detail"),
            WorkflowState::Confirmation => write!(f, "Confirmation"),
            WorkflowState::End => write!(f, "End"),
        }
    }
}

// ============================================================================
// User Actions (per branching state)
// ============================================================================

/// Inspector's answer at the Criteria state: does the feature match the
/// resolved acceptance criteria?
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CriteriaDecision {
    Yes,
    No,
}

/// Inspector's decision at the Confirmation state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmAction {
    /// Commit the current page and move on
    Keep,
    /// Redo the page: back to Selection with cached invariants
    Repeat,
    /// Discard the current page entirely
    Drop,
}

/// Inspector's decision at the End state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EndAction {
    /// Another inspection on the same part and report
    More,
    /// New part under the same project and inspector
    NewPart,
    /// New project: clears all cached report data
    NewProject,
    /// Print the current report, stay at End
    Print,
}

/// Action the workflow reports back to the request layer.
///
/// Drives the report-page hints (add/remove/update) in state responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowAction {
    Keep,
    Repeat,
    Drop,
    More,
    NewPart,
    NewProject,
    Print,
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowAction::Keep => "keep",
            WorkflowAction::Repeat => "repeat",
            WorkflowAction::Drop => "drop",
            WorkflowAction::More => "more",
            WorkflowAction::NewPart => "new-part",
            WorkflowAction::NewProject => "new-project",
            WorkflowAction::Print => "print",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_state_serializes_lowercase() {
        let json = serde_json::to_string(&WorkflowState::Confirmation).unwrap();
        assert_eq!(json, "\"confirmation\"");
        let back: WorkflowState = serde_json::from_str("\"standby\"").unwrap();
        assert_eq!(back, WorkflowState::Standby);
    }

    #[test]
    fn end_action_uses_kebab_case() {
        let action: EndAction = serde_json::from_str("\"new-part\"").unwrap();
        assert_eq!(action, EndAction::NewPart);
        assert_eq!(
            serde_json::to_string(&WorkflowAction::NewProject).unwrap(),
            "\"new-project\""
        );
    }
}
