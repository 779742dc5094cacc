use std::sync::Mutex;

use tempfile::NamedTempFile;

use fpv_overlay::{OverlayConfig, Size, TrackerVariant};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "FPV_CONFIG",
        "FPV_MODEL_PATH",
        "FPV_SOURCE_URL",
        "FPV_CONFIDENCE_THRESHOLD",
        "FPV_RECORDING_VARIANT",
        "FPV_DISPLAY",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "model": {
            "path": "models/ssd_mobilenet.onnx",
            "input_width": 320,
            "input_height": 320,
            "confidence_threshold": 0.6,
            "max_results": 5
        },
        "display": { "width": 1920, "height": 1080 },
        "source": { "url": "stub://flight", "target_fps": 25, "width": 800, "height": 600 },
        "recording": { "variant": "manual" },
        "fit_frame": { "extra_cameras": ["Inspire 2 Camera"] }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("FPV_CONFIG", file.path());
    std::env::set_var("FPV_RECORDING_VARIANT", "auto");
    std::env::set_var("FPV_DISPLAY", "1280x720");

    let cfg = OverlayConfig::load().expect("load config");

    assert_eq!(cfg.model.input, Size::new(320, 320));
    assert_eq!(cfg.model.confidence_threshold, 0.6);
    assert_eq!(cfg.model.max_results, 5);
    assert_eq!(cfg.source.url, "stub://flight");
    assert_eq!(cfg.source.target_fps, 25);
    assert_eq!(cfg.fit_frame_extra, vec!["Inspire 2 Camera".to_string()]);
    // Env wins over file.
    assert_eq!(cfg.recording_variant, TrackerVariant::AutoRecord);
    assert_eq!(cfg.display, Size::new(1280, 720));

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = OverlayConfig::load().expect("load config");

    assert_eq!(cfg.model.input, Size::new(300, 300));
    assert!(cfg.model.path.is_none());
    assert_eq!(cfg.model.confidence_threshold, 0.5);
    assert_eq!(cfg.display, Size::new(1280, 720));
    assert_eq!(cfg.source.url, "stub://fpv");
    assert_eq!(cfg.recording_variant, TrackerVariant::Manual);
    assert!(cfg.fit_frame_extra.is_empty());
}

#[test]
fn rejects_out_of_range_threshold() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FPV_CONFIDENCE_THRESHOLD", "1.5");
    let err = OverlayConfig::load();
    clear_env();

    assert!(err.is_err());
}

#[test]
fn rejects_unknown_recording_variant() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FPV_RECORDING_VARIANT", "freestyle");
    let err = OverlayConfig::load();
    clear_env();

    assert!(err.is_err());
}
