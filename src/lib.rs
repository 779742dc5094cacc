//! FPV detection overlay core.
//!
//! This crate implements the per-frame pipeline behind a live aerial video
//! preview with object-detection overlays:
//!
//! ```text
//! FrameSource -> DetectionEngine -> OverlayMapper -> OverlayStateManager -> renderer
//! ```
//!
//! The pipeline runs inference off the render thread, maps detection geometry
//! from model-input space into display space, and keeps exactly one overlay
//! state live for the renderer at any time. Late frames are dropped, never
//! queued; a result for frame N is never published after the result for N+1.
//!
//! # Module Structure
//!
//! - `frame`: decoded frame type with exclusive stage-to-stage ownership
//! - `ingest`: frame sources (synthetic `stub://` streams, JPEG directories)
//! - `detect`: detector backends and the `DetectionEngine`
//! - `overlay`: coordinate mapping and the atomically swapped overlay state
//! - `pipeline`: the inference worker gluing the above together
//! - `camera`: recording-state tracker and camera UI projections
//! - `config`: file + environment configuration
//!
//! Hardware connection, H.264 decode and widget layout are external
//! collaborators; the crate's only inbound entry points are
//! [`Pipeline::on_frame`] and [`RecordingStateTracker::on_camera_state`].

pub mod camera;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod overlay;
pub mod pipeline;

pub use camera::{
    needs_fit_frame_width, needs_fit_frame_width_with, CameraCommand, CameraMode,
    CameraRecordingState, RecordingStateTracker, RecordingUi, StateUpdate, TrackerState,
    TrackerVariant,
};
pub use config::OverlayConfig;
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use detect::{Detection, DetectionEngine, DetectionResult, DetectorBackend, StubBackend};
pub use frame::{Frame, PixelFormat};
#[cfg(feature = "ingest-image")]
pub use ingest::JpegDirSource;
pub use ingest::{FrameSource, SyntheticConfig, SyntheticSource};
pub use overlay::{
    Color, HeuristicTextMeasurer, LabelSize, NullSink, OverlayItem, OverlayMapper, OverlayState,
    OverlayStateManager, RenderSink, TextMeasurer,
};
pub use pipeline::Pipeline;

// -------------------- Geometry --------------------

/// Integer pixel dimensions of a frame, model input or display surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle. Coordinate space depends on context: detector
/// output rects live in model-input pixels, overlay rects in display pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.max_x(), 40.0);
        assert_eq!(r.max_y(), 60.0);
    }
}
