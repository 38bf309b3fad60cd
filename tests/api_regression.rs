//! API Regression Tests
//!
//! Exercises the HTTP surface end to end with `tower::ServiceExt::oneshot`:
//! envelope shape, state-transition responses, error codes and the image
//! endpoints. Each test builds a fresh app over a temp catalog directory
//! and a synthetic camera.

use std::fs;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use inspecta_os::api::{create_app, ApiState};
use inspecta_os::camera::{Camera, SyntheticCamera};
use inspecta_os::catalog::ColumnKeywords;
use inspecta_os::guidelines::GuidelineSelector;
use inspecta_os::output::LocalOutput;
use inspecta_os::workflow::InspectionWorkflow;

const ACME_CSV: &str = "\
Defect,Surface Quality,Finish,Criteria
Chip,A,Painted,Not acceptable
Scratch,A,Visual,Polish out
";

struct TestApp {
    app: Router,
    _dir: tempfile::TempDir,
}

fn test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog_dir = dir.path().join("catalogs");
    fs::create_dir_all(&catalog_dir).expect("catalog dir");
    fs::write(catalog_dir.join("acme_criteria.csv"), ACME_CSV).expect("acme csv");

    let camera = Arc::new(SyntheticCamera::open(32, 24, 30).expect("camera"));
    let workflow = InspectionWorkflow::new(
        Arc::clone(&camera) as Arc<dyn Camera>,
        LocalOutput::new(dir.path().join("captures")),
        GuidelineSelector::new(["Chip"]),
        catalog_dir,
        ColumnKeywords::default(),
    );
    let state = ApiState::new(workflow, camera);
    TestApp {
        app: create_app(state),
        _dir: dir,
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    send(app, req).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(app, req).await
}

#[tokio::test]
async fn health_reports_service_and_version() {
    let t = test_app();
    let (status, body) = get(&t.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["service"], "inspecta-os");
    assert!(body["meta"]["timestamp"].is_string());
}

#[tokio::test]
async fn projects_lists_discovered_catalogs() {
    let t = test_app();
    let (status, body) = get(&t.app, "/api/v1/projects").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["projects"], json!(["ACME"]));
}

#[tokio::test]
async fn options_are_empty_before_project_selection() {
    let t = test_app();
    let (status, body) = get(&t.app, "/api/v1/options").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["project"].is_null());
    assert_eq!(body["data"]["defects"], json!([]));
}

#[tokio::test]
async fn unknown_project_maps_to_not_found_envelope() {
    let t = test_app();
    let (status, body) = post_json(
        &t.app,
        "/states/project",
        json!({"project": "nope", "inspector": "john"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "project-not-found");
}

#[tokio::test]
async fn standby_before_project_conflicts() {
    let t = test_app();
    let (status, body) = post_json(
        &t.app,
        "/states/standby",
        json!({"inspected-part": "P-1", "serial-number": "SN-1"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "no-project-selected");
}

#[tokio::test]
async fn full_state_walk_over_http() {
    let t = test_app();

    let (status, body) = post_json(
        &t.app,
        "/states/project",
        json!({"project": "acme", "inspector": "john"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextState"], "standby");
    assert_eq!(body["data"]["n_inspection"], 1);
    assert_eq!(body["data"]["project"], "ACME");
    assert_eq!(body["data"]["actions"]["update_page"], true);

    // Options are populated once the catalog is loaded
    let (_, body) = get(&t.app, "/api/v1/options").await;
    assert_eq!(body["data"]["project"], "ACME");
    assert_eq!(body["data"]["defects"], json!(["CHIP", "SCRATCH"]));

    let (status, body) = post_json(
        &t.app,
        "/states/standby",
        json!({"inspected-part": "P-100", "serial-number": "SN-7"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextState"], "label");
    assert!(body["data"]["date"].is_string());

    let (status, body) = post_json(&t.app, "/states/label", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextState"], "selection");
    assert_eq!(body["data"]["image"], "/capture/cache/image-partid");

    let (status, body) = post_json(
        &t.app,
        "/states/selection",
        json!({
            "defect-type": "chip",
            "surface-quality": "a",
            "finish": "painted",
            "defect-name": "Chip (edge)"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextState"], "criteria");
    assert_eq!(body["data"]["criteria"], "Not acceptable");
    assert_eq!(body["data"]["defect-name"], "Chip (edge)");

    let (status, body) = post_json(&t.app, "/states/criteria", json!({"action": "yes"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextState"], "context");
    assert_eq!(body["data"]["action"], "keep");

    let (status, body) = post_json(&t.app, "/states/context", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextState"], "detail");
    assert_eq!(body["data"]["guideline_side"], "light");
    assert_eq!(body["data"]["image"], "/capture/cache/image-context");

    let (status, body) = post_json(&t.app, "/states/detail", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextState"], "confirmation");

    let (status, body) = post_json(&t.app, "/states/confirmation", json!({"action": "keep"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextState"], "end");
    assert_eq!(body["data"]["actions"]["remove_page"], false);
    assert!(body["data"]["report"].is_null());

    let (status, body) = post_json(
        &t.app,
        "/states/end",
        json!({"action": "more", "selectedDefect": "Chip (edge)"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextState"], "selection");
    assert_eq!(body["data"]["n_inspection"], 2);
    assert_eq!(body["data"]["actions"]["add_page"], true);
    assert_eq!(body["data"]["report"]["inspected-part"], "P-100");
    assert_eq!(
        body["data"]["images"]["image-partid"],
        "/capture/cache/image-partid"
    );
}

#[tokio::test]
async fn criteria_no_repeats_selection() {
    let t = test_app();
    post_json(
        &t.app,
        "/states/project",
        json!({"project": "acme", "inspector": "john"}),
    )
    .await;

    let (status, body) = post_json(&t.app, "/states/criteria", json!({"action": "no"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextState"], "selection");
    assert_eq!(body["data"]["action"], "repeat");
    assert_eq!(body["data"]["actions"]["update_page"], false);
}

#[tokio::test]
async fn cached_image_endpoint_validates_slot_and_presence() {
    let t = test_app();

    let (status, body) = get(&t.app, "/capture/cache/image-sideways").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "unknown-slot");

    // Known slot but nothing captured yet
    let (status, body) = get(&t.app, "/capture/cache/image-partid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "no-frame");

    // After label the slot serves PNG bytes
    post_json(
        &t.app,
        "/states/project",
        json!({"project": "acme", "inspector": "john"}),
    )
    .await;
    post_json(&t.app, "/states/label", json!({})).await;

    let req = Request::builder()
        .uri("/capture/cache/image-partid")
        .body(Body::empty())
        .expect("request");
    let resp = t.app.clone().oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body");
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[tokio::test]
async fn capture_serves_a_fresh_frame() {
    let t = test_app();
    let req = Request::builder()
        .uri("/capture")
        .body(Body::empty())
        .expect("request");
    let resp = t.app.clone().oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok()),
        Some("no-store, no-cache, must-revalidate, max-age=0")
    );
}

#[tokio::test]
async fn unknown_route_returns_envelope_404() {
    let t = test_app();
    let (status, body) = get(&t.app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not-found");
}
