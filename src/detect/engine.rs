use anyhow::{Context, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::DetectionResult;
use crate::frame::Frame;

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_MAX_RESULTS: usize = 10;

/// Owns the loaded detector and turns decoded frames into detection results.
///
/// The engine is constructed once at startup and moved into the pipeline
/// worker; construction fails fatally if the backend cannot warm up (a
/// missing or broken model must stop the pipeline before it starts).
///
/// Per frame the engine:
/// 1. resizes the frame to the model's fixed input dimensions with an
///    independent per-axis stretch (nearest neighbor) - aspect ratio is NOT
///    preserved, which is exactly what the overlay mapper's per-axis scaling
///    inverts when mapping boxes back to display space;
/// 2. runs the backend;
/// 3. discards detections below the confidence threshold and keeps at most
///    `max_results`, ordered by descending confidence.
///
/// A failed single inference is a soft failure: the engine logs a warning and
/// returns an empty result so video continues uninterrupted.
pub struct DetectionEngine {
    backend: Box<dyn DetectorBackend>,
    confidence_threshold: f32,
    max_results: usize,
}

impl DetectionEngine {
    pub fn new(mut backend: Box<dyn DetectorBackend>) -> Result<Self> {
        backend
            .warm_up()
            .with_context(|| format!("detector backend '{}' failed to warm up", backend.name()))?;
        log::info!(
            "detection engine ready: backend={} input={}x{}",
            backend.name(),
            backend.input_size().width,
            backend.input_size().height
        );
        Ok(Self {
            backend,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
        })
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Override the maximum number of detections kept per frame.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Run one frame through the model.
    ///
    /// Synchronous and bound by model latency; callers must keep this off the
    /// decoder and render threads. Never propagates per-frame errors.
    pub fn infer(&mut self, frame: &Frame) -> DetectionResult {
        let input_size = self.backend.input_size();
        let rgb = resize_to_input(frame, input_size.width, input_size.height);

        let mut detections = match self.backend.detect(&rgb) {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("inference failed, dropping this frame's overlay: {:#}", e);
                return DetectionResult::empty(input_size, frame.size());
            }
        };

        detections.retain(|det| det.confidence >= self.confidence_threshold);
        detections.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        detections.truncate(self.max_results);

        DetectionResult {
            detections,
            input_size,
            frame_size: frame.size(),
        }
    }
}

/// Nearest-neighbor resize to the model input, converting to packed RGB.
/// Each axis is scaled independently (stretch-to-fit, no letterboxing).
fn resize_to_input(frame: &Frame, out_w: u32, out_h: u32) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(out_w as usize * out_h as usize * 3);
    let sx = frame.width() as f32 / out_w as f32;
    let sy = frame.height() as f32 / out_h as f32;
    for oy in 0..out_h {
        let y = ((oy as f32 * sy) as u32).min(frame.height() - 1);
        for ox in 0..out_w {
            let x = ((ox as f32 * sx) as u32).min(frame.width() - 1);
            rgb.extend_from_slice(&frame.rgb_at(x, y));
        }
    }
    rgb
}
