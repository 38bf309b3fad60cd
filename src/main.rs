//! INSPECTA-OS - Handheld Visual Inspection Workflow Engine
//!
//! Guided part inspection for a handheld device: project selection,
//! photo captures, defect classification against customer criteria
//! catalogs, and report page turnover — served over HTTP to the device UI.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (synthetic camera, ./catalogs, ./captures)
//! cargo run --release
//!
//! # Point at provisioned catalogs and a different bind address
//! cargo run --release -- --catalog-dir /data/catalogs --addr 0.0.0.0:9000
//! ```
//!
//! # Environment Variables
//!
//! - `INSPECTA_CONFIG`: Path to the station TOML config
//! - `INSPECTA_CORS_ORIGINS`: Comma-separated allowed CORS origins (dev)
//! - `RUST_LOG`: Logging level (default: info)

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use inspecta_os::api::{create_app, ApiState};
use inspecta_os::camera::SyntheticCamera;
use inspecta_os::catalog::discover_projects;
use inspecta_os::config::{self, StationConfig};
use inspecta_os::guidelines::GuidelineSelector;
use inspecta_os::output::LocalOutput;
use inspecta_os::workflow::InspectionWorkflow;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "inspecta-os")]
#[command(about = "INSPECTA-OS Handheld Visual Inspection Workflow Engine")]
#[command(version)]
struct CliArgs {
    /// Path to the station TOML config (overrides the search order)
    #[arg(long, value_name = "PATH")]
    config: Option<String>,

    /// Override the server address (default from config, "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the criteria catalog directory
    #[arg(long, value_name = "DIR")]
    catalog_dir: Option<String>,

    /// Override the capture archive directory
    #[arg(long, value_name = "DIR")]
    save_dir: Option<String>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    // Load station configuration
    let station_config = match &args.config {
        Some(path) => StationConfig::load_from_file(std::path::Path::new(path))
            .with_context(|| format!("failed to load config from {path}"))?,
        None => StationConfig::load(),
    };

    let catalog_dir = args
        .catalog_dir
        .clone()
        .unwrap_or_else(|| station_config.catalog.dir.clone());
    let save_dir = args
        .save_dir
        .clone()
        .unwrap_or_else(|| station_config.output.save_dir.clone());
    let server_addr = args
        .addr
        .clone()
        .unwrap_or_else(|| station_config.server.bind_addr());

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  INSPECTA-OS - Handheld Visual Inspection");
    info!("  Station: {}", station_config.station.name);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("");

    // Camera must open before any workflow exists - fatal otherwise
    let camera = Arc::new(
        SyntheticCamera::open(
            station_config.camera.width,
            station_config.camera.height,
            station_config.camera.stream_max_fps,
        )
        .context("camera initialization failed")?,
    );
    info!(
        "📷 Camera: synthetic ({}x{} @ max {} fps)",
        station_config.camera.width,
        station_config.camera.height,
        station_config.camera.stream_max_fps
    );

    let projects = discover_projects(std::path::Path::new(&catalog_dir));
    info!(
        "📚 Catalogs: {} project(s) under {}",
        projects.len(),
        catalog_dir
    );

    let guidelines = GuidelineSelector::new(&station_config.guidelines.light_side_defects);
    let keywords = station_config.catalog.keywords();
    config::init(station_config);

    let workflow = InspectionWorkflow::new(
        Arc::clone(&camera) as Arc<dyn inspecta_os::camera::Camera>,
        LocalOutput::new(&save_dir),
        guidelines,
        catalog_dir,
        keywords,
    );

    let state = ApiState::new(workflow, camera);
    let app = create_app(state);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("failed to bind {server_addr}"))?;
    info!("🌐 HTTP server listening on {}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await
        .context("HTTP server error")?;

    info!("");
    info!("✓ INSPECTA-OS shutdown complete");
    Ok(())
}
