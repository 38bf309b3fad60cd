//! Camera collaborator seam.
//!
//! The workflow consumes frames through two decoupled operations:
//!
//! - a one-shot capture returning optional encoded bytes (a miss is not an
//!   error — the report slot stays unfilled)
//! - a pull-driven frame stream for the live viewfinder; each pull yields a
//!   frame or ends the stream, and a terminated stream is not restartable —
//!   callers open a fresh one
//!
//! A real handheld runs against the device camera (external collaborator);
//! this module ships a synthetic implementation used for development,
//! simulation and tests.

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use rand::Rng;
use thiserror::Error;
use tracing::warn;

/// Camera initialization errors. Fatal at session start — no workflow
/// instance is created without a working camera.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("could not open video source '{0}'")]
    OpenFailed(String),
}

/// Events produced by a frame stream.
pub enum FrameEvent {
    /// An encoded frame.
    Frame(Vec<u8>),
    /// Stream terminated (device failure or source exhausted). The stream
    /// cannot be resumed; open a new one.
    Eof,
}

/// Pull-driven frame sequence for the live viewfinder.
#[async_trait]
pub trait FrameStream: Send + 'static {
    /// Pull the next frame. After the first `Eof` every subsequent pull
    /// must also return `Eof`.
    async fn next_frame(&mut self) -> FrameEvent;
}

/// Frame acquisition collaborator.
#[async_trait]
pub trait Camera: Send + Sync + 'static {
    /// One-shot still capture. `None` when no frame is available; the
    /// caller proceeds with the slot unfilled.
    async fn capture_frame(&self) -> Option<Vec<u8>>;

    /// Open a fresh viewfinder stream, independent of any earlier stream.
    fn open_stream(&self) -> Box<dyn FrameStream>;

    /// MIME type of the encoded frames.
    fn frame_mime(&self) -> &'static str {
        "image/png"
    }

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Synthetic Camera
// ============================================================================

/// Test-pattern camera: renders animated gradient frames and encodes them
/// as PNG. Stands in for the device camera during development and tests.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    max_fps: u32,
    sequence: Arc<AtomicU64>,
}

impl SyntheticCamera {
    /// Open a synthetic camera with the given frame geometry.
    pub fn open(width: u32, height: u32, max_fps: u32) -> Result<Self, CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::OpenFailed(format!(
                "synthetic ({width}x{height})"
            )));
        }
        Ok(Self {
            width,
            height,
            max_fps: max_fps.max(1),
            sequence: Arc::new(AtomicU64::new(0)),
        })
    }

    fn next_encoded(&self) -> Option<Vec<u8>> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        encode_png(&render_frame(self.width, self.height, seq))
    }
}

/// Diagonal gradient with a sweeping vertical bar and light sensor noise,
/// so successive frames are visibly distinct in the viewfinder.
fn render_frame(width: u32, height: u32, seq: u64) -> RgbImage {
    let mut rng = rand::thread_rng();
    let mut frame = RgbImage::new(width, height);
    let bar_x = (seq * 7 % u64::from(width)) as u32;
    for (x, y, pixel) in frame.enumerate_pixels_mut() {
        let base = ((x + y + (seq as u32)) % 255) as u8;
        let noise: u8 = rng.gen_range(0..16);
        if x.abs_diff(bar_x) < 4 {
            *pixel = Rgb([255, 255, 255]);
        } else {
            *pixel = Rgb([base.saturating_add(noise), base / 2, 255 - base]);
        }
    }
    frame
}

fn encode_png(frame: &RgbImage) -> Option<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    match frame.write_to(&mut buffer, ImageFormat::Png) {
        Ok(()) => Some(buffer.into_inner()),
        Err(e) => {
            warn!(error = %e, "frame encode failed");
            None
        }
    }
}

#[async_trait]
impl Camera for SyntheticCamera {
    async fn capture_frame(&self) -> Option<Vec<u8>> {
        self.next_encoded()
    }

    fn open_stream(&self) -> Box<dyn FrameStream> {
        Box::new(SyntheticStream {
            width: self.width,
            height: self.height,
            interval: tokio::time::Duration::from_millis(1000 / u64::from(self.max_fps)),
            sequence: Arc::clone(&self.sequence),
            yielded_first: false,
        })
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Stream of synthetic frames paced at the configured max fps.
struct SyntheticStream {
    width: u32,
    height: u32,
    interval: tokio::time::Duration,
    sequence: Arc<AtomicU64>,
    yielded_first: bool,
}

#[async_trait]
impl FrameStream for SyntheticStream {
    async fn next_frame(&mut self) -> FrameEvent {
        // Pace after the first frame so a fresh stream starts immediately.
        if self.yielded_first {
            tokio::time::sleep(self.interval).await;
        }
        self.yielded_first = true;

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        match encode_png(&render_frame(self.width, self.height, seq)) {
            Some(bytes) => FrameEvent::Frame(bytes),
            None => FrameEvent::Eof,
        }
    }
}
