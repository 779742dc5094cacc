use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::camera::TrackerVariant;
use crate::Size;

const DEFAULT_INPUT_WIDTH: u32 = 300;
const DEFAULT_INPUT_HEIGHT: u32 = 300;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_MAX_RESULTS: usize = 10;
const DEFAULT_DISPLAY_WIDTH: u32 = 1280;
const DEFAULT_DISPLAY_HEIGHT: u32 = 720;
const DEFAULT_SOURCE_URL: &str = "stub://fpv";
const DEFAULT_SOURCE_FPS: u32 = 30;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    model: Option<ModelConfigFile>,
    display: Option<DisplayConfigFile>,
    source: Option<SourceConfigFile>,
    recording: Option<RecordingConfigFile>,
    fit_frame: Option<FitFrameConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    confidence_threshold: Option<f32>,
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct RecordingConfigFile {
    variant: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FitFrameConfigFile {
    extra_cameras: Option<Vec<String>>,
}

/// Resolved pipeline configuration.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub model: ModelSettings,
    pub display: Size,
    pub source: SourceSettings,
    pub recording_variant: TrackerVariant,
    /// Extra camera models for the fit-frame allow-list.
    pub fit_frame_extra: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// ONNX model path; `None` selects the stub backend.
    pub path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub input: Size,
    pub confidence_threshold: f32,
    pub max_results: usize,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl OverlayConfig {
    /// Load from the optional JSON file named by `FPV_CONFIG`, then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FPV_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: OverlayConfigFile) -> Result<Self> {
        let model = ModelSettings {
            path: file.model.as_ref().and_then(|m| m.path.clone()),
            labels_path: file.model.as_ref().and_then(|m| m.labels_path.clone()),
            input: Size::new(
                file.model
                    .as_ref()
                    .and_then(|m| m.input_width)
                    .unwrap_or(DEFAULT_INPUT_WIDTH),
                file.model
                    .as_ref()
                    .and_then(|m| m.input_height)
                    .unwrap_or(DEFAULT_INPUT_HEIGHT),
            ),
            confidence_threshold: file
                .model
                .as_ref()
                .and_then(|m| m.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            max_results: file
                .model
                .as_ref()
                .and_then(|m| m.max_results)
                .unwrap_or(DEFAULT_MAX_RESULTS),
        };
        let display = Size::new(
            file.display
                .as_ref()
                .and_then(|d| d.width)
                .unwrap_or(DEFAULT_DISPLAY_WIDTH),
            file.display
                .as_ref()
                .and_then(|d| d.height)
                .unwrap_or(DEFAULT_DISPLAY_HEIGHT),
        );
        let source = SourceSettings {
            url: file
                .source
                .as_ref()
                .and_then(|s| s.url.clone())
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            target_fps: file
                .source
                .as_ref()
                .and_then(|s| s.target_fps)
                .unwrap_or(DEFAULT_SOURCE_FPS),
            width: file
                .source
                .as_ref()
                .and_then(|s| s.width)
                .unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: file
                .source
                .as_ref()
                .and_then(|s| s.height)
                .unwrap_or(DEFAULT_SOURCE_HEIGHT),
        };
        let recording_variant = match file.recording.and_then(|r| r.variant) {
            Some(variant) => parse_variant(&variant)?,
            None => TrackerVariant::Manual,
        };
        let fit_frame_extra = file
            .fit_frame
            .and_then(|f| f.extra_cameras)
            .unwrap_or_default();
        Ok(Self {
            model,
            display,
            source,
            recording_variant,
            fit_frame_extra,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("FPV_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model.path = Some(PathBuf::from(path));
            }
        }
        if let Ok(url) = std::env::var("FPV_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(threshold) = std::env::var("FPV_CONFIDENCE_THRESHOLD") {
            let threshold: f32 = threshold
                .parse()
                .map_err(|_| anyhow!("FPV_CONFIDENCE_THRESHOLD must be a float"))?;
            self.model.confidence_threshold = threshold;
        }
        if let Ok(variant) = std::env::var("FPV_RECORDING_VARIANT") {
            if !variant.trim().is_empty() {
                self.recording_variant = parse_variant(&variant)?;
            }
        }
        if let Ok(display) = std::env::var("FPV_DISPLAY") {
            if !display.trim().is_empty() {
                self.display = parse_display(&display)?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.model.confidence_threshold) {
            return Err(anyhow!("confidence_threshold must be within [0, 1]"));
        }
        if self.model.input.width == 0 || self.model.input.height == 0 {
            return Err(anyhow!("model input dimensions must be non-zero"));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(anyhow!("display dimensions must be non-zero"));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("source target_fps must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_variant(value: &str) -> Result<TrackerVariant> {
    match value.to_ascii_lowercase().as_str() {
        "manual" => Ok(TrackerVariant::Manual),
        "auto" | "auto-record" => Ok(TrackerVariant::AutoRecord),
        other => Err(anyhow!(
            "unknown recording variant '{}' (expected 'manual' or 'auto')",
            other
        )),
    }
}

fn parse_display(value: &str) -> Result<Size> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| anyhow!("FPV_DISPLAY must look like 1920x1080"))?;
    let width: u32 = w
        .trim()
        .parse()
        .map_err(|_| anyhow!("FPV_DISPLAY width must be an integer"))?;
    let height: u32 = h
        .trim()
        .parse()
        .map_err(|_| anyhow!("FPV_DISPLAY height must be an integer"))?;
    Ok(Size::new(width, height))
}

fn read_config_file(path: &Path) -> Result<OverlayConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
