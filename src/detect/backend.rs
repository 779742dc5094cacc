use anyhow::Result;

use crate::detect::result::Detection;
use crate::Size;

/// Detector backend trait.
///
/// A backend owns a loaded model and turns one preprocessed frame into raw
/// detections. The [`DetectionEngine`](crate::DetectionEngine) handles resize,
/// pixel-format conversion, confidence thresholding and result capping, so
/// implementations only see RGB buffers exactly matching [`input_size`] and
/// may return unthresholded candidates.
///
/// Backends run on the pipeline's worker thread, hence `Send`.
///
/// [`input_size`]: DetectorBackend::input_size
pub trait DetectorBackend: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Fixed model input dimensions.
    fn input_size(&self) -> Size;

    /// Run detection on one RGB frame already resized to `input_size`.
    ///
    /// Returned rects are in model-input pixel coordinates. An `Err` here is a
    /// per-frame soft failure; the engine recovers with an empty result.
    fn detect(&mut self, rgb: &[u8]) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, called once before the pipeline starts.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
