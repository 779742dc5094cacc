#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::{Rect, Size};

/// Tract-based backend for SSD-style ONNX detection models.
///
/// Loads a local model file at startup (load failure is fatal) and performs
/// inference on RGB frames. The model is expected to produce three outputs per
/// frame: normalized boxes `(1, N, 4)` in `[ymin, xmin, ymax, xmax]` order,
/// class indices `(1, N)` and scores `(1, N)` - the MobileNet-SSD layout.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input: Size,
    labels: Vec<String>,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input: Size) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input.height as usize, input.width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input,
            labels: Vec::new(),
        })
    }

    /// Attach a label map: one class name per line, index 0 first.
    pub fn with_labels_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label map {}", path.display()))?;
        self.labels = raw.lines().map(|line| line.trim().to_string()).collect();
        if self.labels.is_empty() {
            return Err(anyhow!("label map {} is empty", path.display()));
        }
        Ok(self)
    }

    fn label_for(&self, class_index: usize) -> String {
        self.labels
            .get(class_index)
            .cloned()
            .unwrap_or_else(|| format!("class {}", class_index))
    }

    fn build_input(&self, rgb: &[u8]) -> Result<Tensor> {
        let width = self.input.width as usize;
        let height = self.input.height as usize;
        let expected_len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("model input dimensions overflow"))?;

        if rgb.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                rgb.len()
            ));
        }

        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, height, width), |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                rgb[idx] as f32 / 255.0
            });

        Ok(input.into_tensor())
    }

    fn parse_outputs(&self, outputs: TVec<TValue>) -> Result<Vec<Detection>> {
        if outputs.len() < 3 {
            return Err(anyhow!(
                "model produced {} outputs, expected boxes/classes/scores",
                outputs.len()
            ));
        }
        let boxes = outputs[0]
            .to_array_view::<f32>()
            .context("boxes output was not f32")?;
        let classes = outputs[1]
            .to_array_view::<f32>()
            .context("classes output was not f32")?;
        let scores = outputs[2]
            .to_array_view::<f32>()
            .context("scores output was not f32")?;

        let boxes: Vec<f32> = boxes.iter().copied().collect();
        let classes: Vec<f32> = classes.iter().copied().collect();
        let scores: Vec<f32> = scores.iter().copied().collect();
        let count = (boxes.len() / 4).min(classes.len()).min(scores.len());

        let w = self.input.width as f32;
        let h = self.input.height as f32;
        let mut detections = Vec::with_capacity(count);
        for i in 0..count {
            let score = scores[i];
            if !score.is_finite() {
                continue;
            }
            let ymin = boxes[i * 4].clamp(0.0, 1.0);
            let xmin = boxes[i * 4 + 1].clamp(0.0, 1.0);
            let ymax = boxes[i * 4 + 2].clamp(0.0, 1.0);
            let xmax = boxes[i * 4 + 3].clamp(0.0, 1.0);
            if xmax <= xmin || ymax <= ymin {
                continue;
            }
            detections.push(Detection {
                class_label: self.label_for(classes[i] as usize),
                confidence: score.clamp(0.0, 1.0),
                rect: Rect::new(
                    xmin * w,
                    ymin * h,
                    (xmax - xmin) * w,
                    (ymax - ymin) * h,
                ),
            });
        }
        Ok(detections)
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn input_size(&self) -> Size {
        self.input
    }

    fn detect(&mut self, rgb: &[u8]) -> Result<Vec<Detection>> {
        let input = self.build_input(rgb)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.parse_outputs(outputs)
    }

    fn warm_up(&mut self) -> Result<()> {
        // One blank-frame pass so first-frame latency is paid at startup.
        let blank = vec![0u8; self.input.width as usize * self.input.height as usize * 3];
        self.detect(&blank).map(|_| ())
    }
}
