//! Request handlers for the inspection workflow API.
//!
//! One POST endpoint per workflow state plus supporting endpoints for
//! project discovery, catalog option sets, captures and the viewfinder
//! stream. All transition handlers lock the session mutex for the duration
//! of the call — that mutex is the serialization point that keeps the
//! single-session state machine consistent.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::camera::Camera;
use crate::catalog::CatalogError;
use crate::guidelines::GuidelineSide;
use crate::types::{
    ConfirmAction, CriteriaDecision, EndAction, ImageSlot, SessionSnapshot, WorkflowAction,
    WorkflowState,
};
use crate::workflow::{InspectionWorkflow, WorkflowError};

const CACHE_CONTROL_NO_STORE: &str = "no-store, no-cache, must-revalidate, max-age=0";

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    /// The single session's workflow behind its serialization point
    pub workflow: Arc<Mutex<InspectionWorkflow>>,
    /// Camera handle for the viewfinder stream (streams are opened fresh
    /// per request, independent of the workflow lock)
    pub camera: Arc<dyn Camera>,
}

impl ApiState {
    pub fn new(workflow: InspectionWorkflow, camera: Arc<dyn Camera>) -> Self {
        Self {
            workflow: Arc::new(Mutex::new(workflow)),
            camera,
        }
    }
}

/// Map a workflow error onto the envelope.
fn workflow_error(e: &WorkflowError) -> Response {
    match e {
        WorkflowError::Catalog(CatalogError::ProjectNotFound(project)) => {
            ApiErrorResponse::not_found(
                "project-not-found",
                format!("no catalog file matches project '{project}'"),
            )
        }
        WorkflowError::Catalog(CatalogError::CatalogEmpty(path)) => ApiErrorResponse::unprocessable(
            "catalog-empty",
            format!("catalog file '{path}' has no header row"),
        ),
        WorkflowError::Catalog(CatalogError::Io { .. }) => {
            ApiErrorResponse::internal("catalog-io", e.to_string())
        }
        WorkflowError::NoProjectSelected => {
            ApiErrorResponse::conflict("no-project-selected", e.to_string())
        }
    }
}

// ============================================================================
// Shared response fragments
// ============================================================================

/// Report-page hints for the rendering layer.
#[derive(Debug, Serialize)]
pub struct ReportActions {
    pub add_page: bool,
    pub remove_page: bool,
    pub update_page: bool,
    pub page_number: u32,
}

impl ReportActions {
    fn update(page_number: u32) -> Self {
        Self {
            add_page: false,
            remove_page: false,
            update_page: true,
            page_number,
        }
    }

    fn none(page_number: u32) -> Self {
        Self {
            add_page: false,
            remove_page: false,
            update_page: false,
            page_number,
        }
    }
}

/// Cache URL for a captured slot.
fn slot_url(slot: ImageSlot) -> String {
    format!("/capture/cache/{}", slot.key())
}

/// Cache URLs for every filled slot listed in a snapshot.
fn snapshot_image_urls(snapshot: &SessionSnapshot) -> BTreeMap<String, String> {
    snapshot
        .image_slots
        .iter()
        .map(|key| (key.clone(), format!("/capture/cache/{key}")))
        .collect()
}

// ============================================================================
// State endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub project: String,
    pub inspector: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    #[serde(rename = "nextState")]
    pub next_state: WorkflowState,
    pub n_inspection: u32,
    pub project: String,
    pub inspector: String,
    pub actions: ReportActions,
}

/// POST /states/project - select project and inspector, load the catalog.
pub async fn post_project(
    State(state): State<ApiState>,
    Json(req): Json<ProjectRequest>,
) -> Response {
    let mut workflow = state.workflow.lock().await;
    match workflow.project(&req.project, &req.inspector) {
        Ok(out) => ApiResponse::ok(ProjectResponse {
            next_state: out.next,
            n_inspection: out.page,
            project: out.project,
            inspector: req.inspector,
            actions: ReportActions::update(out.page),
        }),
        Err(e) => workflow_error(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct StandbyRequest {
    #[serde(rename = "inspected-part")]
    pub inspected_part: String,
    #[serde(rename = "serial-number")]
    pub serial_number: String,
}

#[derive(Debug, Serialize)]
pub struct StandbyResponse {
    #[serde(rename = "nextState")]
    pub next_state: WorkflowState,
    pub n_inspection: u32,
    pub date: String,
    pub actions: ReportActions,
}

/// POST /states/standby - register part and serial, stamp the date.
pub async fn post_standby(
    State(state): State<ApiState>,
    Json(req): Json<StandbyRequest>,
) -> Response {
    let mut workflow = state.workflow.lock().await;
    match workflow.standby(&req.inspected_part, &req.serial_number) {
        Ok(out) => ApiResponse::ok(StandbyResponse {
            next_state: out.next,
            n_inspection: out.page,
            date: out.date,
            actions: ReportActions::update(out.page),
        }),
        Err(e) => workflow_error(&e),
    }
}

#[derive(Debug, Serialize)]
pub struct CaptureStateResponse {
    #[serde(rename = "nextState")]
    pub next_state: WorkflowState,
    pub n_inspection: u32,
    /// Cache URL of the slot that was filled, when the capture succeeded
    pub image: Option<String>,
    pub actions: ReportActions,
}

/// POST /states/label - capture the part label photo.
pub async fn post_label(State(state): State<ApiState>) -> Response {
    let mut workflow = state.workflow.lock().await;
    match workflow.label().await {
        Ok(out) => ApiResponse::ok(CaptureStateResponse {
            next_state: out.next,
            n_inspection: out.page,
            image: out.captured.map(slot_url),
            actions: ReportActions::update(out.page),
        }),
        Err(e) => workflow_error(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    #[serde(rename = "defect-type")]
    pub defect_type: String,
    #[serde(rename = "surface-quality")]
    pub surface_quality: String,
    pub finish: String,
    /// Display label echoed back to the report layer
    #[serde(rename = "defect-name", default)]
    pub defect_name: String,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    #[serde(rename = "nextState")]
    pub next_state: WorkflowState,
    pub n_inspection: u32,
    /// Resolved criteria; null when undocumented or ambiguous
    pub criteria: Option<String>,
    #[serde(rename = "defect-name")]
    pub defect_name: String,
    pub actions: ReportActions,
}

/// POST /states/selection - classify the defect and resolve criteria.
pub async fn post_selection(
    State(state): State<ApiState>,
    Json(req): Json<SelectionRequest>,
) -> Response {
    let mut workflow = state.workflow.lock().await;
    match workflow.selection(&req.defect_type, &req.surface_quality, &req.finish) {
        Ok(out) => ApiResponse::ok(SelectionResponse {
            next_state: out.next,
            n_inspection: out.page,
            criteria: out.criteria,
            defect_name: req.defect_name,
            actions: ReportActions::update(out.page),
        }),
        Err(e) => workflow_error(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct CriteriaRequest {
    pub action: CriteriaDecision,
}

#[derive(Debug, Serialize)]
pub struct CriteriaResponse {
    #[serde(rename = "nextState")]
    pub next_state: WorkflowState,
    pub action: WorkflowAction,
    pub n_inspection: u32,
    pub actions: ReportActions,
}

/// POST /states/criteria - accept the resolved criteria or re-select.
pub async fn post_criteria(
    State(state): State<ApiState>,
    Json(req): Json<CriteriaRequest>,
) -> Response {
    let mut workflow = state.workflow.lock().await;
    let out = workflow.criteria(req.action);
    let actions = if out.action == WorkflowAction::Keep {
        ReportActions::update(out.page)
    } else {
        ReportActions::none(out.page)
    };
    ApiResponse::ok(CriteriaResponse {
        next_state: out.next,
        action: out.action,
        n_inspection: out.page,
        actions,
    })
}

#[derive(Debug, Serialize)]
pub struct ContextResponse {
    #[serde(rename = "nextState")]
    pub next_state: WorkflowState,
    pub n_inspection: u32,
    pub guideline_side: GuidelineSide,
    pub image: Option<String>,
    pub actions: ReportActions,
}

/// POST /states/context - compute the guideline side and capture the
/// context photo.
pub async fn post_context(State(state): State<ApiState>) -> Response {
    let mut workflow = state.workflow.lock().await;
    let out = workflow.context().await;
    ApiResponse::ok(ContextResponse {
        next_state: out.next,
        n_inspection: out.page,
        guideline_side: out.guideline,
        image: out.captured.map(slot_url),
        actions: ReportActions::update(out.page),
    })
}

/// POST /states/detail - capture the close-up photo.
pub async fn post_detail(State(state): State<ApiState>) -> Response {
    let mut workflow = state.workflow.lock().await;
    let out = workflow.detail().await;
    ApiResponse::ok(CaptureStateResponse {
        next_state: out.next,
        n_inspection: out.page,
        image: out.captured.map(slot_url),
        actions: ReportActions::update(out.page),
    })
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationRequest {
    pub action: ConfirmAction,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    #[serde(rename = "nextState")]
    pub next_state: WorkflowState,
    pub action: WorkflowAction,
    pub n_inspection: u32,
    /// Invariant report fields, present on repeat
    pub report: Option<SessionSnapshot>,
    /// Cache URLs of the invariant images, present on repeat
    pub images: BTreeMap<String, String>,
    pub actions: ReportActions,
}

/// POST /states/confirmation - keep, repeat or drop the current page.
pub async fn post_confirmation(
    State(state): State<ApiState>,
    Json(req): Json<ConfirmationRequest>,
) -> Response {
    let mut workflow = state.workflow.lock().await;
    let out = workflow.confirmation(req.action);

    let images = out
        .snapshot
        .as_ref()
        .map(snapshot_image_urls)
        .unwrap_or_default();

    ApiResponse::ok(ConfirmationResponse {
        next_state: out.next,
        action: out.action,
        n_inspection: out.page,
        report: out.snapshot,
        images,
        actions: ReportActions {
            add_page: out.action == WorkflowAction::Repeat,
            remove_page: out.action != WorkflowAction::Keep,
            update_page: out.action == WorkflowAction::Repeat,
            page_number: out.page,
        },
    })
}

#[derive(Debug, Deserialize)]
pub struct EndRequest {
    pub action: EndAction,
    /// Raw defect label used for the archived filename; empty skips archival
    #[serde(rename = "selectedDefect", default)]
    pub selected_defect: String,
}

#[derive(Debug, Serialize)]
pub struct EndResponse {
    #[serde(rename = "nextState")]
    pub next_state: WorkflowState,
    pub action: WorkflowAction,
    pub n_inspection: u32,
    /// Invariant report fields, present on more
    pub report: Option<SessionSnapshot>,
    /// Cache URLs of the invariant images, present on more
    pub images: BTreeMap<String, String>,
    pub actions: ReportActions,
}

/// POST /states/end - report turnover: more / new-part / new-project / print.
pub async fn post_end(State(state): State<ApiState>, Json(req): Json<EndRequest>) -> Response {
    let mut workflow = state.workflow.lock().await;
    let out = workflow.end(req.action, &req.selected_defect);

    let images = out
        .snapshot
        .as_ref()
        .map(snapshot_image_urls)
        .unwrap_or_default();

    ApiResponse::ok(EndResponse {
        next_state: out.next,
        action: out.action,
        n_inspection: out.page,
        report: out.snapshot,
        images,
        actions: ReportActions {
            add_page: matches!(out.action, WorkflowAction::More | WorkflowAction::NewPart),
            remove_page: false,
            update_page: out.action == WorkflowAction::More,
            page_number: out.page,
        },
    })
}

// ============================================================================
// Supporting endpoints
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// Station name from the loaded config, null when running without one
    pub station: Option<String>,
}

/// GET /health - liveness probe.
pub async fn get_health() -> Response {
    let station = crate::config::is_initialized()
        .then(|| crate::config::get().station.name.clone());
    ApiResponse::ok(HealthResponse {
        status: "ok",
        service: "inspecta-os",
        version: env!("CARGO_PKG_VERSION"),
        station,
    })
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<String>,
}

/// GET /api/v1/projects - projects discovered in the catalog directory.
pub async fn get_projects(State(state): State<ApiState>) -> Response {
    let workflow = state.workflow.lock().await;
    ApiResponse::ok(ProjectsResponse {
        projects: workflow.available_projects().to_vec(),
    })
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    /// Upper-cased project id of the loaded catalog, null before selection
    pub project: Option<String>,
    pub defects: Vec<String>,
    pub quality: Vec<String>,
    pub finish: Vec<String>,
}

/// GET /api/v1/options - selection option sets from the loaded catalog.
///
/// Empty sets before a project is selected — option lists are a rendering
/// concern, not a transition, so this never errors.
pub async fn get_options(State(state): State<ApiState>) -> Response {
    let workflow = state.workflow.lock().await;
    let response = match workflow.catalog() {
        Some(catalog) => OptionsResponse {
            project: Some(catalog.project().to_string()),
            defects: catalog.defects(),
            quality: catalog.quality(),
            finish: catalog.finish(),
        },
        None => OptionsResponse {
            project: None,
            defects: Vec::new(),
            quality: Vec::new(),
            finish: Vec::new(),
        },
    };
    ApiResponse::ok(response)
}

/// GET /capture - one-shot still capture from the camera.
pub async fn get_capture(State(state): State<ApiState>) -> Response {
    let mut workflow = state.workflow.lock().await;
    match workflow.capture_image().await {
        Some(bytes) => image_response(bytes, state.camera.frame_mime()),
        None => ApiErrorResponse::not_found("no-frame", "no frames captured yet"),
    }
}

/// GET /capture/cache/:slot - cached invariant image for a slot.
pub async fn get_cached_image(
    State(state): State<ApiState>,
    Path(slot): Path<String>,
) -> Response {
    let Some(slot) = ImageSlot::from_key(&slot) else {
        return ApiErrorResponse::bad_request("unknown-slot", format!("unknown image slot '{slot}'"));
    };
    let workflow = state.workflow.lock().await;
    match workflow.cached_image(slot) {
        Some(bytes) => image_response(bytes.to_vec(), state.camera.frame_mime()),
        None => ApiErrorResponse::not_found("no-frame", format!("no cached image for '{slot}'")),
    }
}

fn image_response(bytes: Vec<u8>, mime: &'static str) -> Response {
    (
        [
            (header::CONTENT_TYPE, mime),
            (header::CACHE_CONTROL, CACHE_CONTROL_NO_STORE),
        ],
        bytes,
    )
        .into_response()
}

/// GET /video_feed - live viewfinder stream.
///
/// Opens a fresh frame stream per request and serves it as
/// `multipart/x-mixed-replace`. When the stream ends the body ends; the
/// client re-requests to get a new stream.
pub async fn get_video_feed(State(state): State<ApiState>) -> Response {
    use crate::camera::FrameEvent;

    let mime = state.camera.frame_mime();
    let frames = futures::stream::unfold(state.camera.open_stream(), move |mut stream| async move {
        match stream.next_frame().await {
            FrameEvent::Frame(bytes) => {
                let chunk = multipart_chunk(&bytes, mime);
                Some((
                    Ok::<_, std::convert::Infallible>(axum::body::Bytes::from(chunk)),
                    stream,
                ))
            }
            FrameEvent::Eof => None,
        }
    });

    (
        [(
            header::CONTENT_TYPE,
            "multipart/x-mixed-replace; boundary=frame",
        )],
        axum::body::Body::from_stream(frames),
    )
        .into_response()
}

/// Frame a single image as one part of the multipart stream.
fn multipart_chunk(bytes: &[u8], mime: &str) -> Vec<u8> {
    let mut chunk = Vec::with_capacity(bytes.len() + 64);
    chunk.extend_from_slice(b"--frame\r\nContent-Type: ");
    chunk.extend_from_slice(mime.as_bytes());
    chunk.extend_from_slice(b"\r\n\r\n");
    chunk.extend_from_slice(bytes);
    chunk.extend_from_slice(b"\r\n");
    chunk
}
