use std::time::{Duration, Instant};

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::frame::{Frame, PixelFormat};
use crate::ingest::FrameSource;

/// Configuration for a synthetic frame source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Stream identifier (e.g., "stub://fpv").
    pub url: String,
    /// Target frame rate. The source sleeps to hold this rate.
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            url: "stub://fpv".to_string(),
            target_fps: 30,
            width: 640,
            height: 480,
        }
    }
}

/// Synthetic frame source for demos and tests.
///
/// Generates a drifting gradient with a bright moving square so the stub
/// detector sees changing content, paced to the configured frame rate.
pub struct SyntheticSource {
    config: SyntheticConfig,
    frame_count: u64,
    started: Instant,
    last_frame: Option<Instant>,
    rng: StdRng,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            started: Instant::now(),
            last_frame: None,
            rng: StdRng::seed_from_u64(0x6670_7664),
        }
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    fn generate_pixels(&mut self) -> Vec<u8> {
        let w = self.config.width as usize;
        let h = self.config.height as usize;
        let mut pixels = vec![0u8; w * h * 3];

        let shift = self.frame_count as usize;
        for y in 0..h {
            for x in 0..w {
                let idx = (y * w + x) * 3;
                pixels[idx] = ((x + shift) % 256) as u8;
                pixels[idx + 1] = ((y + shift / 2) % 256) as u8;
                pixels[idx + 2] = 64;
            }
        }

        // Bright square orbiting the frame with a little positional jitter.
        let side = (w.min(h) / 8).max(1);
        let cx = (shift * 3 + self.rng.gen_range(0..4)) % (w - side);
        let cy = (shift * 2 + self.rng.gen_range(0..4)) % (h - side);
        for y in cy..cy + side {
            for x in cx..cx + side {
                let idx = (y * w + x) * 3;
                pixels[idx] = 255;
                pixels[idx + 1] = 255;
                pixels[idx + 2] = 255;
            }
        }

        pixels
    }

    fn pace(&mut self) {
        let interval = Duration::from_secs_f64(1.0 / self.config.target_fps.max(1) as f64);
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Frame> {
        self.pace();
        self.frame_count += 1;

        let pixels = self.generate_pixels();
        Frame::new(
            pixels,
            self.config.width,
            self.config.height,
            PixelFormat::Rgb8,
            self.started.elapsed().as_micros() as u64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_frames_with_configured_dimensions() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            width: 64,
            height: 48,
            target_fps: 1000,
            ..SyntheticConfig::default()
        });

        let frame = source.next_frame().unwrap();
        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(frame.data().len(), 64 * 48 * 3);
    }

    #[test]
    fn timestamps_increase_monotonically() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            width: 16,
            height: 16,
            target_fps: 1000,
            ..SyntheticConfig::default()
        });

        let a = source.next_frame().unwrap().timestamp_micros();
        let b = source.next_frame().unwrap().timestamp_micros();
        assert!(b > a);
    }
}
