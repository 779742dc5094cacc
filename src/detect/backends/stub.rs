use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::{Rect, Size};

const STUB_CLASSES: &[&str] = &["person", "car", "bicycle", "dog"];

/// Stub backend for demos and tests. Derives deterministic pseudo-detections
/// from a hash of the pixel content, so identical frames always yield
/// identical boxes and no model file is needed.
pub struct StubBackend {
    input: Size,
}

impl StubBackend {
    pub fn new(input: Size) -> Self {
        Self { input }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new(Size::new(300, 300))
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn input_size(&self) -> Size {
        self.input
    }

    fn detect(&mut self, rgb: &[u8]) -> Result<Vec<Detection>> {
        let digest: [u8; 32] = Sha256::digest(rgb).into();
        let count = 1 + (digest[0] % 2) as usize;
        let w = self.input.width as f32;
        let h = self.input.height as f32;

        let mut detections = Vec::with_capacity(count);
        for i in 0..count {
            let b = &digest[i * 8..i * 8 + 8];
            let box_w = w * (0.15 + (b[2] as f32 / 255.0) * 0.35);
            let box_h = h * (0.15 + (b[3] as f32 / 255.0) * 0.35);
            let x = (b[0] as f32 / 255.0) * (w - box_w);
            let y = (b[1] as f32 / 255.0) * (h - box_h);
            detections.push(Detection {
                class_label: STUB_CLASSES[b[4] as usize % STUB_CLASSES.len()].to_string(),
                confidence: 0.5 + (b[5] as f32 / 255.0) * 0.5,
                rect: Rect::new(x, y, box_w, box_h),
            });
        }
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_pixels_yield_identical_detections() {
        let mut backend = StubBackend::default();
        let pixels = vec![7u8; 300 * 300 * 3];

        let a = backend.detect(&pixels).unwrap();
        let b = backend.detect(&pixels).unwrap();

        assert_eq!(a.len(), b.len());
        for (da, db) in a.iter().zip(&b) {
            assert_eq!(da.class_label, db.class_label);
            assert_eq!(da.rect, db.rect);
        }
    }

    #[test]
    fn boxes_stay_inside_model_input() {
        let mut backend = StubBackend::new(Size::new(320, 240));
        let pixels = vec![33u8; 320 * 240 * 3];

        for det in backend.detect(&pixels).unwrap() {
            assert!(det.rect.x >= 0.0);
            assert!(det.rect.y >= 0.0);
            assert!(det.rect.max_x() <= 320.0);
            assert!(det.rect.max_y() <= 240.0);
            assert!(det.confidence >= 0.5 && det.confidence <= 1.0);
        }
    }
}
