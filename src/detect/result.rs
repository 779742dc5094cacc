use crate::{Rect, Size};

/// One model-predicted object instance. Immutable once produced.
#[derive(Clone, Debug)]
pub struct Detection {
    pub class_label: String,
    /// Confidence in [0, 1], already thresholded by the engine.
    pub confidence: f32,
    /// Bounding box in model-input pixel coordinates.
    pub rect: Rect,
}

/// Everything the detector produced for one frame.
///
/// Produced atomically per frame and never partially updated. The previous
/// frame's result is discarded wholesale when a new one is built.
#[derive(Clone, Debug)]
pub struct DetectionResult {
    /// Detections ordered by descending confidence.
    pub detections: Vec<Detection>,
    /// The model-input dimensions the detection rects live in.
    pub input_size: Size,
    /// Dimensions of the frame that produced this result.
    pub frame_size: Size,
}

impl DetectionResult {
    /// Empty result for a frame whose inference failed or found nothing.
    pub fn empty(input_size: Size, frame_size: Size) -> Self {
        Self {
            detections: Vec::new(),
            input_size,
            frame_size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
