#![cfg(feature = "ingest-image")]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};

use crate::frame::{Frame, PixelFormat};
use crate::ingest::FrameSource;

/// Frame source that replays a directory of JPEG stills in name order.
///
/// Useful for feeding captured flight footage through the pipeline without
/// any camera hardware. Loops back to the first image at the end.
pub struct JpegDirSource {
    files: Vec<PathBuf>,
    index: usize,
    target_fps: u32,
    started: Instant,
    last_frame: Option<Instant>,
}

impl JpegDirSource {
    pub fn new<P: AsRef<Path>>(dir: P, target_fps: u32) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read frame directory {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(anyhow!("no JPEG files in {}", dir.display()));
        }
        Ok(Self {
            files,
            index: 0,
            target_fps,
            started: Instant::now(),
            last_frame: None,
        })
    }

    fn pace(&mut self) {
        let interval = Duration::from_secs_f64(1.0 / self.target_fps.max(1) as f64);
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
    }
}

impl FrameSource for JpegDirSource {
    fn next_frame(&mut self) -> Result<Frame> {
        self.pace();
        let path = &self.files[self.index];
        self.index = (self.index + 1) % self.files.len();

        let decoded = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .into_rgb8();
        let (width, height) = decoded.dimensions();
        Frame::new(
            decoded.into_raw(),
            width,
            height,
            PixelFormat::Rgb8,
            self.started.elapsed().as_micros() as u64,
        )
    }
}
