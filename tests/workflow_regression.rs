//! Workflow Regression Tests
//!
//! Drives the full inspection sequence through `InspectionWorkflow` with a
//! synthetic camera and a temp catalog directory. Asserts the page counter
//! discipline, snapshot surfacing and catalog behavior across a realistic
//! multi-page session.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use inspecta_os::camera::SyntheticCamera;
use inspecta_os::catalog::{discover_projects, ColumnKeywords, CriteriaCatalog};
use inspecta_os::guidelines::GuidelineSelector;
use inspecta_os::output::LocalOutput;
use inspecta_os::types::{ConfirmAction, CriteriaDecision, EndAction, WorkflowState};
use inspecta_os::workflow::InspectionWorkflow;

const ACME_CSV: &str = "\
Defect,Surface Quality,Finish,Criteria
Chip,A,Painted,Not acceptable
Chip,B,Painted,Max 2mm
Scratch,A,Visual,Polish out
";

const GLOBEX_CSV: &str = "\
Defect,Surface Quality,Finish,Criteria
Dent,A,Painted,Reject
";

struct Fixture {
    workflow: InspectionWorkflow,
    dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog_dir = dir.path().join("catalogs");
    fs::create_dir_all(&catalog_dir).expect("catalog dir");
    fs::write(catalog_dir.join("acme_criteria.csv"), ACME_CSV).expect("acme csv");
    fs::write(catalog_dir.join("globex_criteria.csv"), GLOBEX_CSV).expect("globex csv");

    let camera = Arc::new(SyntheticCamera::open(32, 24, 30).expect("camera"));
    let workflow = InspectionWorkflow::new(
        camera,
        LocalOutput::new(dir.path().join("captures")),
        GuidelineSelector::new(["Chip"]),
        catalog_dir,
        ColumnKeywords::default(),
    );
    Fixture {
        workflow,
        dir,
    }
}

/// Every discovered project loads and resolves criteria.
#[test]
fn discovered_projects_load_and_answer_queries() {
    let f = fixture();
    let catalog_dir = f.dir.path().join("catalogs");

    let projects = discover_projects(&catalog_dir);
    assert_eq!(projects, vec!["ACME", "GLOBEX"]);

    for project in &projects {
        let catalog = CriteriaCatalog::load(&catalog_dir, project, &ColumnKeywords::default())
            .expect("catalog loads");
        assert!(!catalog.defects().is_empty());
        assert!(!catalog.quality().is_empty());
        assert!(!catalog.finish().is_empty());
    }

    let acme =
        CriteriaCatalog::load(&catalog_dir, "acme", &ColumnKeywords::default()).expect("acme");
    assert_eq!(
        acme.criteria("chip", "a", "painted").as_deref(),
        Some("Not acceptable")
    );
}

/// Project selection answers standby at page 1.
#[tokio::test]
async fn project_transition_enters_standby_at_page_one() {
    let mut f = fixture();
    let out = f.workflow.project("acme", "john").expect("project");
    assert_eq!(out.next, WorkflowState::Standby);
    assert_eq!(out.page, 1);
}

/// Drop on page 3 reports 3; the counter lands on 2.
#[tokio::test]
async fn drop_reports_pre_drop_page_and_decrements() {
    let mut f = fixture();
    f.workflow.project("acme", "john").expect("project");
    f.workflow.standby("P-9", "SN-1").expect("standby");
    f.workflow.end(EndAction::More, "");
    f.workflow.end(EndAction::More, "");
    assert_eq!(f.workflow.session().page, 3);

    let out = f.workflow.confirmation(ConfirmAction::Drop);
    assert_eq!(out.next, WorkflowState::End);
    assert_eq!(out.page, 3);
    assert!(out.snapshot.is_none());
    assert_eq!(f.workflow.session().page, 2);
}

/// New-project clears everything and returns to Project.
#[tokio::test]
async fn new_project_clears_session() {
    let mut f = fixture();
    f.workflow.project("acme", "john").expect("project");
    f.workflow.standby("P-9", "SN-1").expect("standby");
    f.workflow.label().await.expect("label");
    f.workflow.end(EndAction::More, "");

    let out = f.workflow.end(EndAction::NewProject, "");
    assert_eq!(out.next, WorkflowState::Project);
    assert_eq!(out.page, 1);
    assert!(f.workflow.session().technician.is_empty());
    assert!(f.workflow.session().images.filled().is_empty());
    assert!(f.workflow.catalog().is_none());

    // A different project can start cleanly on the same session
    let out = f.workflow.project("globex", "mary").expect("globex");
    assert_eq!(out.project, "GLOBEX");
    let out = f
        .workflow
        .selection("dent", "a", "painted")
        .expect("selection");
    assert_eq!(out.criteria.as_deref(), Some("Reject"));
}

/// An unknown triple advances with absent criteria.
#[tokio::test]
async fn unknown_triple_advances_without_criteria() {
    let mut f = fixture();
    f.workflow.project("acme", "john").expect("project");

    let out = f
        .workflow
        .selection("pore", "c", "visual")
        .expect("selection");
    assert_eq!(out.next, WorkflowState::Criteria);
    assert!(out.criteria.is_none());
}

/// Full two-page session: capture, repeat, commit, more, archive.
#[tokio::test]
async fn two_page_session_end_to_end() {
    let mut f = fixture();

    f.workflow.project("acme", "john").expect("project");
    f.workflow.standby("P-100", "SN-7").expect("standby");
    f.workflow.label().await.expect("label");

    // First pass: inspector rejects the criteria and re-selects
    f.workflow.selection("chip", "b", "painted").expect("selection");
    let out = f.workflow.criteria(CriteriaDecision::No);
    assert_eq!(out.next, WorkflowState::Selection);

    let out = f.workflow.selection("chip", "a", "painted").expect("selection");
    assert_eq!(out.criteria.as_deref(), Some("Not acceptable"));
    f.workflow.criteria(CriteriaDecision::Yes);
    f.workflow.context().await;
    f.workflow.detail().await;

    let out = f.workflow.confirmation(ConfirmAction::Keep);
    assert_eq!(out.next, WorkflowState::End);

    // Page turnover with archival
    let out = f.workflow.end(EndAction::More, "Chip (edge)");
    assert_eq!(out.next, WorkflowState::Selection);
    assert_eq!(out.page, 2);
    let snapshot = out.snapshot.expect("snapshot on more");
    assert_eq!(snapshot.inspected_part, "P-100");
    assert_eq!(snapshot.image_slots.len(), 3);

    let saved = out.saved.expect("frame archived");
    assert!(saved.exists());
    assert!(saved
        .file_name()
        .expect("file name")
        .to_string_lossy()
        .starts_with("img_Chip-edge_"));

    // Second page reuses the cached invariants; lookup stays idempotent
    let first = f
        .workflow
        .selection("chip", "a", "painted")
        .expect("selection")
        .criteria;
    let second = f
        .workflow
        .selection("chip", "a", "painted")
        .expect("selection")
        .criteria;
    assert_eq!(first, second);
}

/// Missing catalog dir boots an empty-but-usable workflow.
#[tokio::test]
async fn missing_catalog_dir_is_survivable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let camera = Arc::new(SyntheticCamera::open(32, 24, 30).expect("camera"));
    let mut workflow = InspectionWorkflow::new(
        camera,
        LocalOutput::new(dir.path().join("captures")),
        GuidelineSelector::default(),
        Path::new("/nonexistent/catalogs"),
        ColumnKeywords::default(),
    );

    assert!(workflow.available_projects().is_empty());
    assert!(workflow.project("acme", "john").is_err());
}
