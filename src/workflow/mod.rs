//! Inspection workflow state machine.
//!
//! Owns the session record and the active criteria catalog, and advances
//! through the guided sequence on inspector input:
//!
//! ```text
//! Project -> Standby -> Label -> Selection -> Criteria -> Context
//!         -> Detail -> Confirmation -> End
//! ```
//!
//! `Criteria`, `Confirmation` and `End` branch back to earlier states for
//! in-place correction (repeat/drop) and part/project turnover. Each
//! transition returns a typed outcome the request layer renders.
//!
//! The workflow is not safe for concurrent mutation; the request layer must
//! serialize transition calls (one mutex per session).

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::camera::Camera;
use crate::catalog::{discover_projects, CatalogError, ColumnKeywords, CriteriaCatalog};
use crate::guidelines::{GuidelineSelector, GuidelineSide};
use crate::output::{self, LocalOutput};
use crate::types::{
    ConfirmAction, CriteriaDecision, DefectSelection, EndAction, ImageSlot, InspectionSession,
    SessionSnapshot, WorkflowAction, WorkflowState,
};

/// Errors surfaced by state transitions.
///
/// Only session-establishment problems are errors; lookup and capture
/// misses are represented as absent values in the outcomes.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A state that needs the catalog ran before a project was selected.
    #[error("no project selected - criteria catalog not loaded")]
    NoProjectSelected,
}

// ============================================================================
// Transition Outcomes
// ============================================================================

#[derive(Debug)]
pub struct ProjectOutcome {
    pub next: WorkflowState,
    pub page: u32,
    /// Upper-cased project identifier of the loaded catalog
    pub project: String,
}

#[derive(Debug)]
pub struct StandbyOutcome {
    pub next: WorkflowState,
    pub page: u32,
    /// Report date stamped for this part
    pub date: String,
}

#[derive(Debug)]
pub struct CaptureOutcome {
    pub next: WorkflowState,
    pub page: u32,
    /// Slot the frame landed in; unfilled when the camera returned nothing
    pub captured: Option<ImageSlot>,
}

#[derive(Debug)]
pub struct SelectionOutcome {
    pub next: WorkflowState,
    pub page: u32,
    /// Resolved acceptance criteria, absent when undocumented or ambiguous
    pub criteria: Option<String>,
}

#[derive(Debug)]
pub struct CriteriaOutcome {
    pub next: WorkflowState,
    pub action: WorkflowAction,
    pub page: u32,
}

#[derive(Debug)]
pub struct ContextOutcome {
    pub next: WorkflowState,
    pub page: u32,
    pub guideline: GuidelineSide,
    pub captured: Option<ImageSlot>,
}

#[derive(Debug)]
pub struct ConfirmationOutcome {
    pub next: WorkflowState,
    pub action: WorkflowAction,
    /// Page the decision applied to (pre-drop value for `drop`)
    pub page: u32,
    /// Invariant cache surfaced for reuse on `repeat`
    pub snapshot: Option<SessionSnapshot>,
}

#[derive(Debug)]
pub struct EndOutcome {
    pub next: WorkflowState,
    pub action: WorkflowAction,
    pub page: u32,
    /// Invariant cache surfaced for reuse on `more`
    pub snapshot: Option<SessionSnapshot>,
    /// Where the last frame was archived, when persistence succeeded
    pub saved: Option<PathBuf>,
}

// ============================================================================
// Inspection Workflow
// ============================================================================

/// State machine driving one handheld inspection session.
pub struct InspectionWorkflow {
    camera: Arc<dyn Camera>,
    archive: LocalOutput,
    guidelines: GuidelineSelector,
    catalog_dir: PathBuf,
    keywords: ColumnKeywords,
    available_projects: Vec<String>,
    catalog: Option<CriteriaCatalog>,
    session: InspectionSession,
    selection: DefectSelection,
    /// Most recent frame from any capture, persisted at the End state
    last_frame: Option<Vec<u8>>,
}

impl InspectionWorkflow {
    /// Build a workflow for one device session. Discovers the available
    /// projects immediately so the UI can offer them at the Project state.
    pub fn new(
        camera: Arc<dyn Camera>,
        archive: LocalOutput,
        guidelines: GuidelineSelector,
        catalog_dir: impl Into<PathBuf>,
        keywords: ColumnKeywords,
    ) -> Self {
        let catalog_dir = catalog_dir.into();
        let available_projects = discover_projects(&catalog_dir);
        info!(
            camera = camera.name(),
            catalog_dir = %catalog_dir.display(),
            projects = available_projects.len(),
            "inspection workflow ready"
        );
        Self {
            camera,
            archive,
            guidelines,
            catalog_dir,
            keywords,
            available_projects,
            catalog: None,
            session: InspectionSession::default(),
            selection: DefectSelection::default(),
            last_frame: None,
        }
    }

    /// Projects discovered in the catalog directory at startup.
    pub fn available_projects(&self) -> &[String] {
        &self.available_projects
    }

    /// The active catalog, if a project has been selected.
    pub fn catalog(&self) -> Option<&CriteriaCatalog> {
        self.catalog.as_ref()
    }

    /// Current session record (read-only view).
    pub fn session(&self) -> &InspectionSession {
        &self.session
    }

    /// Current defect selection (read-only view).
    pub fn current_selection(&self) -> &DefectSelection {
        &self.selection
    }

    /// Cached invariant image for a slot.
    pub fn cached_image(&self, slot: ImageSlot) -> Option<&[u8]> {
        self.session.images.get(slot)
    }

    /// One-shot capture that also records the frame for End-state archival.
    pub async fn capture_image(&mut self) -> Option<Vec<u8>> {
        let frame = self.camera.capture_frame().await;
        if let Some(bytes) = &frame {
            self.last_frame = Some(bytes.clone());
        } else {
            warn!("capture returned no frame");
        }
        frame
    }

    fn require_catalog(&self) -> Result<&CriteriaCatalog, WorkflowError> {
        self.catalog.as_ref().ok_or(WorkflowError::NoProjectSelected)
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Project state: select project and inspector, load the catalog.
    ///
    /// Fails with [`CatalogError::ProjectNotFound`] when no catalog file
    /// matches and [`CatalogError::CatalogEmpty`] when the file has no
    /// header row; both abort the transition for user retry.
    pub fn project(&mut self, project: &str, inspector: &str) -> Result<ProjectOutcome, WorkflowError> {
        let catalog = CriteriaCatalog::load(&self.catalog_dir, project, &self.keywords)?;
        let project_id = catalog.project().to_string();

        info!(project = %project_id, inspector, rows = catalog.len(), "project selected");

        self.catalog = Some(catalog);
        self.session.technician = inspector.to_string();
        self.session.project = project_id.clone();
        self.session.reset_page();

        Ok(ProjectOutcome {
            next: WorkflowState::Standby,
            page: self.session.page,
            project: project_id,
        })
    }

    /// Standby state: part and serial entry; stamps the report date.
    pub fn standby(&mut self, part_number: &str, serial_number: &str) -> Result<StandbyOutcome, WorkflowError> {
        self.require_catalog()?;

        self.session.date = output::current_date();
        self.session.part_number = part_number.to_string();
        self.session.serial_number = serial_number.to_string();

        debug!(part = part_number, serial = serial_number, "part registered");

        Ok(StandbyOutcome {
            next: WorkflowState::Label,
            page: self.session.page,
            date: self.session.date.clone(),
        })
    }

    /// Label state: capture the part label photo into its invariant slot.
    pub async fn label(&mut self) -> Result<CaptureOutcome, WorkflowError> {
        self.require_catalog()?;

        let frame = self.capture_image().await;
        let captured = frame.is_some().then_some(ImageSlot::PartId);
        self.session.images.set(ImageSlot::PartId, frame);

        Ok(CaptureOutcome {
            next: WorkflowState::Selection,
            page: self.session.page,
            captured,
        })
    }

    /// Selection state: rebuild the defect selection and resolve criteria.
    ///
    /// An unresolvable triple is not an error — `criteria` stays absent and
    /// the workflow advances.
    pub fn selection(
        &mut self,
        defect_type: &str,
        surface_quality: &str,
        finish: &str,
    ) -> Result<SelectionOutcome, WorkflowError> {
        let catalog = self.require_catalog()?;
        let criteria = catalog.criteria(defect_type, surface_quality, finish);

        self.selection = DefectSelection {
            defect_type: defect_type.to_string(),
            surface_quality: surface_quality.to_string(),
            finish: finish.to_string(),
            criteria: criteria.clone(),
        };

        Ok(SelectionOutcome {
            next: WorkflowState::Criteria,
            page: self.session.page,
            criteria,
        })
    }

    /// Criteria state: inspector accepts the resolved criteria or goes back
    /// to re-select.
    pub fn criteria(&mut self, decision: CriteriaDecision) -> CriteriaOutcome {
        match decision {
            CriteriaDecision::Yes => CriteriaOutcome {
                next: WorkflowState::Context,
                action: WorkflowAction::Keep,
                page: self.session.page,
            },
            CriteriaDecision::No => CriteriaOutcome {
                next: WorkflowState::Selection,
                action: WorkflowAction::Repeat,
                page: self.session.page,
            },
        }
    }

    /// Context state: compute the guideline side for the selected defect,
    /// then capture the context photo.
    pub async fn context(&mut self) -> ContextOutcome {
        let guideline = self.guidelines.choose(&self.selection.defect_type);

        let frame = self.capture_image().await;
        let captured = frame.is_some().then_some(ImageSlot::Context);
        self.session.images.set(ImageSlot::Context, frame);

        ContextOutcome {
            next: WorkflowState::Detail,
            page: self.session.page,
            guideline,
            captured,
        }
    }

    /// Detail state: capture the close-up photo.
    pub async fn detail(&mut self) -> CaptureOutcome {
        let frame = self.capture_image().await;
        let captured = frame.is_some().then_some(ImageSlot::Detail);
        self.session.images.set(ImageSlot::Detail, frame);

        CaptureOutcome {
            next: WorkflowState::Confirmation,
            page: self.session.page,
            captured,
        }
    }

    /// Confirmation state: keep, repeat or drop the current page.
    ///
    /// `drop` reports the pre-drop page and then walks the counter back;
    /// the committed pages before it are untouched.
    pub fn confirmation(&mut self, action: ConfirmAction) -> ConfirmationOutcome {
        let page = self.session.page;
        match action {
            ConfirmAction::Keep => ConfirmationOutcome {
                next: WorkflowState::End,
                action: WorkflowAction::Keep,
                page,
                snapshot: None,
            },
            ConfirmAction::Repeat => ConfirmationOutcome {
                next: WorkflowState::Selection,
                action: WorkflowAction::Repeat,
                page,
                snapshot: Some(self.session.snapshot()),
            },
            ConfirmAction::Drop => {
                self.session.drop_page();
                ConfirmationOutcome {
                    next: WorkflowState::End,
                    action: WorkflowAction::Drop,
                    page,
                    snapshot: None,
                }
            }
        }
    }

    /// End state: archive the last frame, then branch on the turnover
    /// action (more / new-part / new-project / print).
    pub fn end(&mut self, action: EndAction, raw_defect_type: &str) -> EndOutcome {
        let saved = self.archive_last_frame(raw_defect_type);

        match action {
            EndAction::More => {
                let snapshot = self.session.snapshot();
                self.session.next_page();
                EndOutcome {
                    next: WorkflowState::Selection,
                    action: WorkflowAction::More,
                    page: self.session.page,
                    snapshot: Some(snapshot),
                    saved,
                }
            }
            EndAction::NewPart => {
                self.session.reset_page();
                EndOutcome {
                    next: WorkflowState::Standby,
                    action: WorkflowAction::NewPart,
                    page: self.session.page,
                    snapshot: None,
                    saved,
                }
            }
            EndAction::NewProject => {
                self.session.clear();
                self.catalog = None;
                self.selection = DefectSelection::default();
                info!("session cleared for new project");
                EndOutcome {
                    next: WorkflowState::Project,
                    action: WorkflowAction::NewProject,
                    page: self.session.page,
                    snapshot: None,
                    saved,
                }
            }
            EndAction::Print => EndOutcome {
                next: WorkflowState::End,
                action: WorkflowAction::Print,
                page: self.session.page,
                snapshot: None,
                saved,
            },
        }
    }

    /// Best-effort archival of the last captured frame. A failure is
    /// logged, never propagated — the report turnover proceeds regardless.
    fn archive_last_frame(&self, raw_defect_type: &str) -> Option<PathBuf> {
        if raw_defect_type.trim().is_empty() {
            return None;
        }
        let bytes = match &self.last_frame {
            Some(bytes) => bytes,
            None => {
                warn!(defect = raw_defect_type, "no frame to archive");
                return None;
            }
        };
        match self.archive.save_image(bytes, raw_defect_type) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, defect = raw_defect_type, "image archival failed");
                None
            }
        }
    }
}
