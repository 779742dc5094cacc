//! demo - run the overlay pipeline against a synthetic video feed.
//!
//! Feeds paced synthetic frames through the detection pipeline, simulates
//! camera recording-state notifications, and logs what the render surface
//! would draw. With `--features backend-tract` and a configured model path
//! the stub detector is replaced by real ONNX inference.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use fpv_overlay::{
    CameraMode, CameraRecordingState, DetectionEngine, DetectorBackend, FrameSource,
    OverlayConfig, OverlayMapper, OverlayState, OverlayStateManager, Pipeline,
    RecordingStateTracker, RenderSink, StubBackend, SyntheticConfig, SyntheticSource,
};

#[derive(Parser, Debug)]
#[command(about = "FPV overlay pipeline demo")]
struct Args {
    /// Number of frames to feed, 0 for until Ctrl-C.
    #[arg(long, default_value_t = 300)]
    frames: u64,

    /// Log every published overlay state instead of a periodic summary.
    #[arg(long)]
    verbose_overlays: bool,
}

/// Render sink that stands in for the preview surface.
struct LogSink {
    redraws: AtomicU64,
    verbose: bool,
}

impl RenderSink for LogSink {
    fn redraw(&self, state: &Arc<OverlayState>) {
        self.redraws.fetch_add(1, Ordering::Relaxed);
        if self.verbose {
            for item in &state.items {
                log::info!(
                    "frame {}: {} at ({:.0},{:.0}) {:.0}x{:.0}",
                    state.seq,
                    item.label,
                    item.border_rect.x,
                    item.border_rect.y,
                    item.border_rect.width,
                    item.border_rect.height
                );
            }
        }
    }
}

fn build_backend(cfg: &OverlayConfig) -> Result<Box<dyn DetectorBackend>> {
    #[cfg(feature = "backend-tract")]
    if let Some(model_path) = &cfg.model.path {
        let mut backend = fpv_overlay::TractBackend::new(model_path, cfg.model.input)?;
        if let Some(labels) = &cfg.model.labels_path {
            backend = backend.with_labels_file(labels)?;
        }
        return Ok(Box::new(backend));
    }
    #[cfg(not(feature = "backend-tract"))]
    if cfg.model.path.is_some() {
        log::warn!("model path configured but backend-tract is not enabled; using stub backend");
    }
    Ok(Box::new(StubBackend::new(cfg.model.input)))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let cfg = OverlayConfig::load()?;

    let backend = build_backend(&cfg)?;
    log::info!(
        "backend={} input={}x{} threshold={}",
        backend.name(),
        cfg.model.input.width,
        cfg.model.input.height,
        cfg.model.confidence_threshold
    );

    let engine = DetectionEngine::new(backend)?
        .with_threshold(cfg.model.confidence_threshold)
        .with_max_results(cfg.model.max_results);

    let sink = Arc::new(LogSink {
        redraws: AtomicU64::new(0),
        verbose: args.verbose_overlays,
    });

    struct Fwd(Arc<LogSink>);
    impl RenderSink for Fwd {
        fn redraw(&self, state: &Arc<OverlayState>) {
            self.0.redraw(state);
        }
    }

    let manager = Arc::new(OverlayStateManager::new(Box::new(Fwd(sink.clone()))));
    let pipeline = Pipeline::new(engine, OverlayMapper::new(), manager.clone(), cfg.display)?;

    let mut tracker = RecordingStateTracker::new(cfg.recording_variant);
    let mut source = SyntheticSource::new(SyntheticConfig {
        url: cfg.source.url.clone(),
        target_fps: cfg.source.target_fps,
        width: cfg.source.width,
        height: cfg.source.height,
    });

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    log::info!(
        "demo running: source={} display={}x{} variant={:?}",
        cfg.source.url,
        cfg.display.width,
        cfg.display.height,
        cfg.recording_variant
    );

    let mut fed = 0u64;
    let mut recording_seconds = 0u32;
    while running.load(Ordering::SeqCst) && (args.frames == 0 || fed < args.frames) {
        pipeline.on_frame(source.next_frame()?);
        fed += 1;

        // Camera-state notifications arrive on their own cadence; simulate
        // one per second of feed time.
        if fed % cfg.source.target_fps.max(1) as u64 == 0 {
            recording_seconds += 1;
            let update = tracker.on_camera_state(&CameraRecordingState {
                is_recording: true,
                elapsed_seconds: recording_seconds,
                mode: CameraMode::RecordVideo,
            });
            log::info!(
                "recording {} [{}] mode={:?}",
                update.ui.elapsed_label,
                update.ui.record_button_label,
                update.ui.mode
            );
        }

        if fed % 100 == 0 {
            let state = manager.current();
            log::info!(
                "fed {} frames, dropped {}, redraws {}, current overlay: {} item(s) for frame {}",
                fed,
                pipeline.dropped_frames(),
                sink.redraws.load(Ordering::Relaxed),
                state.items.len(),
                state.seq
            );
        }
    }

    let dropped = pipeline.dropped_frames();
    drop(pipeline);
    log::info!(
        "done: fed {} frames, dropped {}, redraws {}",
        fed,
        dropped,
        sink.redraws.load(Ordering::Relaxed)
    );
    Ok(())
}
