//! The per-frame inference worker.
//!
//! [`Pipeline::on_frame`] is the crate's inbound entry point for decoded
//! frames. Inference runs on a dedicated worker thread so a slow model never
//! blocks frame delivery or the render thread. Frames are handed over through
//! a single-slot latest-wins mailbox: if inference for frame N is still
//! running when N+1 arrives, N+1 replaces whatever is pending and any
//! unprocessed frame is dropped on the spot - there is no backlog queue,
//! the system only ever cares about the most recent completed result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use anyhow::{Context, Result};

use crate::detect::DetectionEngine;
use crate::frame::Frame;
use crate::overlay::{OverlayMapper, OverlayStateManager};
use crate::Size;

struct PendingFrame {
    seq: u64,
    frame: Frame,
}

#[derive(Default)]
struct SlotState {
    pending: Option<PendingFrame>,
    next_seq: u64,
    shutdown: bool,
}

/// Latest-wins frame mailbox shared between the producer and the worker.
#[derive(Default)]
struct FrameSlot {
    state: Mutex<SlotState>,
    available: Condvar,
}

/// Frame-ingestion pipeline: mailbox, worker thread and shared handles.
///
/// Construction moves an owned [`DetectionEngine`] and [`OverlayMapper`] into
/// the worker (no global model instances; test doubles plug in through
/// [`DetectorBackend`](crate::DetectorBackend)). Dropping the pipeline shuts
/// the worker down and joins it; in-flight inference is left to complete and
/// its result published normally.
pub struct Pipeline {
    slot: Arc<FrameSlot>,
    display: Arc<Mutex<Size>>,
    manager: Arc<OverlayStateManager>,
    dropped: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl Pipeline {
    pub fn new(
        engine: DetectionEngine,
        mapper: OverlayMapper,
        manager: Arc<OverlayStateManager>,
        display: Size,
    ) -> Result<Self> {
        let slot = Arc::new(FrameSlot::default());
        let display = Arc::new(Mutex::new(display));
        let dropped = Arc::new(AtomicU64::new(0));

        let worker = {
            let slot = slot.clone();
            let display = display.clone();
            let manager = manager.clone();
            std::thread::Builder::new()
                .name("fpv-infer".into())
                .spawn(move || worker_loop(engine, mapper, manager, slot, display))
                .context("failed to spawn inference worker")?
        };

        Ok(Self {
            slot,
            display,
            manager,
            dropped,
            worker: Some(worker),
        })
    }

    /// Hand one decoded frame to the pipeline. Never blocks on inference.
    ///
    /// Ownership of the frame transfers here; a frame superseded before the
    /// worker picks it up is dropped immediately.
    pub fn on_frame(&self, frame: Frame) {
        let mut state = self.slot.state.lock().unwrap();
        let seq = state.next_seq;
        state.next_seq += 1;
        if let Some(stale) = state.pending.replace(PendingFrame { seq, frame }) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::debug!("dropping unprocessed frame {}", stale.seq);
        }
        drop(state);
        self.slot.available.notify_one();
    }

    /// Update the display dimensions overlays are mapped into. Takes effect
    /// from the next published frame.
    pub fn set_display_size(&self, size: Size) {
        *self.display.lock().unwrap() = size;
    }

    /// Frames replaced in the mailbox before inference could start.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// The overlay state manager this pipeline publishes into.
    pub fn overlay(&self) -> &Arc<OverlayStateManager> {
        &self.manager
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        {
            let mut state = self.slot.state.lock().unwrap();
            state.shutdown = true;
        }
        self.slot.available.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(
    mut engine: DetectionEngine,
    mapper: OverlayMapper,
    manager: Arc<OverlayStateManager>,
    slot: Arc<FrameSlot>,
    display: Arc<Mutex<Size>>,
) {
    loop {
        let PendingFrame { seq, frame } = {
            let mut state = slot.state.lock().unwrap();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(pending) = state.pending.take() {
                    break pending;
                }
                state = slot.available.wait(state).unwrap();
            }
        };

        let result = engine.infer(&frame);
        drop(frame); // frame is consumed; nothing downstream may hold it

        // Clear first: stale boxes leave the display before mapping runs,
        // and an empty result is fully handled by the clear alone.
        if !manager.clear(seq) {
            continue;
        }
        if result.is_empty() {
            continue;
        }

        let to = *display.lock().unwrap();
        let items = result
            .detections
            .iter()
            .map(|det| mapper.map(det, result.input_size, to))
            .collect();
        manager.publish(seq, items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detection, DetectorBackend};
    use crate::frame::PixelFormat;
    use crate::overlay::NullSink;
    use crate::Rect;
    use anyhow::Result;
    use std::time::Duration;

    /// Backend that reports one box whose width encodes the frame's first
    /// pixel value, so tests can tell which frame produced a result.
    struct TaggingBackend {
        delay: Duration,
    }

    impl DetectorBackend for TaggingBackend {
        fn name(&self) -> &'static str {
            "tagging"
        }

        fn input_size(&self) -> Size {
            Size::new(10, 10)
        }

        fn detect(&mut self, rgb: &[u8]) -> Result<Vec<Detection>> {
            std::thread::sleep(self.delay);
            Ok(vec![Detection {
                class_label: "person".to_string(),
                confidence: 0.9,
                rect: Rect::new(0.0, 0.0, rgb[0] as f32 / 100.0, 1.0),
            }])
        }
    }

    fn frame_with_tag(tag: u8) -> Frame {
        Frame::new(vec![tag; 10 * 10 * 3], 10, 10, PixelFormat::Rgb8, tag as u64).unwrap()
    }

    fn wait_for_seq(manager: &OverlayStateManager, seq: u64) {
        for _ in 0..200 {
            if manager.current().seq >= seq && !manager.current().items.is_empty() {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("pipeline never published frame {}", seq);
    }

    #[test]
    fn publishes_overlays_for_the_latest_frame() {
        let manager = Arc::new(OverlayStateManager::new(Box::new(NullSink)));
        let engine = DetectionEngine::new(Box::new(TaggingBackend {
            delay: Duration::from_millis(0),
        }))
        .unwrap();
        let pipeline = Pipeline::new(
            engine,
            OverlayMapper::new(),
            manager.clone(),
            Size::new(100, 100),
        )
        .unwrap();

        pipeline.on_frame(frame_with_tag(50));
        wait_for_seq(&manager, 0);

        let state = manager.current();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].label, "person  (90%)");
        // Box width 0.5 in a 10-wide model input maps to 5.0 on a 100-wide display.
        assert_eq!(state.items[0].border_rect.width, 5.0);
    }

    #[test]
    fn late_frames_are_dropped_not_queued() {
        let manager = Arc::new(OverlayStateManager::new(Box::new(NullSink)));
        let engine = DetectionEngine::new(Box::new(TaggingBackend {
            delay: Duration::from_millis(40),
        }))
        .unwrap();
        let pipeline = Pipeline::new(
            engine,
            OverlayMapper::new(),
            manager.clone(),
            Size::new(100, 100),
        )
        .unwrap();

        // Burst faster than the model: only the newest pending frame survives.
        for tag in 1..=5u8 {
            pipeline.on_frame(frame_with_tag(tag));
        }
        wait_for_seq(&manager, 4);

        assert!(pipeline.dropped_frames() >= 1);
        assert_eq!(manager.current().seq, 4);
    }

    #[test]
    fn display_size_change_applies_to_next_frame() {
        let manager = Arc::new(OverlayStateManager::new(Box::new(NullSink)));
        let engine = DetectionEngine::new(Box::new(TaggingBackend {
            delay: Duration::from_millis(0),
        }))
        .unwrap();
        let pipeline = Pipeline::new(
            engine,
            OverlayMapper::new(),
            manager.clone(),
            Size::new(100, 100),
        )
        .unwrap();

        pipeline.set_display_size(Size::new(200, 100));
        pipeline.on_frame(frame_with_tag(50));
        wait_for_seq(&manager, 0);

        assert_eq!(manager.current().items[0].border_rect.width, 10.0);
    }
}
