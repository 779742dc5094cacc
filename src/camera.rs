//! Camera recording-state tracking.
//!
//! [`RecordingStateTracker`] mirrors the camera's push-based recording state
//! into UI-facing labels and flags. Notifications arrive on their own channel
//! at arbitrary frequency, independent of the video frame rate, through
//! [`RecordingStateTracker::on_camera_state`] - the crate's second inbound
//! entry point.
//!
//! Two deployment variants share the one state machine: the manual variant
//! exposes user-triggered capture, record and mode-switch controls, and the
//! automatic event-triggered-recording variant forces record-video mode on
//! every update and drops the manual mode switch. The automatic variant is
//! purely camera-state-driven; detection output never feeds back into it.

/// Camera work modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    ShootPhoto,
    RecordVideo,
}

/// One push notification from the camera.
#[derive(Clone, Copy, Debug)]
pub struct CameraRecordingState {
    pub is_recording: bool,
    pub elapsed_seconds: u32,
    pub mode: CameraMode,
}

/// Outbound commands for the camera driver to execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraCommand {
    SetMode(CameraMode),
    StartRecording,
    StopRecording,
    ShootPhoto,
}

/// Tracker deployment variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerVariant {
    /// Dual-mode capture with user-triggered photo/record controls.
    Manual,
    /// Event-triggered recording: record-video mode is forced on every
    /// camera-state update and manual mode switches are ignored.
    AutoRecord,
}

/// Tracker states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Recording,
}

/// Derived UI projections recomputed on every notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordingUi {
    /// `mm:ss`, wrapping at one hour.
    pub elapsed_label: String,
    /// The elapsed-time label is shown only while recording.
    pub timer_visible: bool,
    pub record_button_label: &'static str,
    /// Mode indicator for the work-mode control.
    pub mode: CameraMode,
}

/// Result of applying one camera-state notification.
#[derive(Clone, Debug)]
pub struct StateUpdate {
    pub ui: RecordingUi,
    /// Transition that occurred, if any.
    pub transition: Option<(TrackerState, TrackerState)>,
    /// Commands the caller should forward to the camera driver.
    pub commands: Vec<CameraCommand>,
}

/// Small state machine mirroring camera recording state for the UI.
pub struct RecordingStateTracker {
    variant: TrackerVariant,
    state: TrackerState,
}

impl RecordingStateTracker {
    pub fn new(variant: TrackerVariant) -> Self {
        Self {
            variant,
            state: TrackerState::Idle,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn variant(&self) -> TrackerVariant {
        self.variant
    }

    /// Apply one camera-state notification.
    ///
    /// Transitions Idle -> Recording when `is_recording` turns true and back
    /// on false; every notification recomputes the derived labels regardless
    /// of whether a transition happened.
    pub fn on_camera_state(&mut self, state: &CameraRecordingState) -> StateUpdate {
        let next = if state.is_recording {
            TrackerState::Recording
        } else {
            TrackerState::Idle
        };
        let transition = if next != self.state {
            Some((self.state, next))
        } else {
            None
        };
        if let Some((from, to)) = transition {
            log::info!("recording state {:?} -> {:?}", from, to);
        }
        self.state = next;

        let (mode, commands) = match self.variant {
            TrackerVariant::Manual => (state.mode, Vec::new()),
            // The automation deployment pins the camera to record-video on
            // every update, whatever mode it reports.
            TrackerVariant::AutoRecord => (
                CameraMode::RecordVideo,
                vec![CameraCommand::SetMode(CameraMode::RecordVideo)],
            ),
        };

        StateUpdate {
            ui: RecordingUi {
                elapsed_label: format_seconds(state.elapsed_seconds),
                timer_visible: state.is_recording,
                record_button_label: self.record_button_label(),
                mode,
            },
            transition,
            commands,
        }
    }

    /// User tapped the record button. Returns the command to forward.
    pub fn toggle_record(&self) -> CameraCommand {
        match self.state {
            TrackerState::Recording => CameraCommand::StopRecording,
            TrackerState::Idle => CameraCommand::StartRecording,
        }
    }

    /// User tapped the capture button (manual variant only).
    ///
    /// Mirrors the capture sequence: switch to photo mode first, then shoot.
    pub fn shoot_photo(&self) -> Vec<CameraCommand> {
        match self.variant {
            TrackerVariant::Manual => vec![
                CameraCommand::SetMode(CameraMode::ShootPhoto),
                CameraCommand::ShootPhoto,
            ],
            TrackerVariant::AutoRecord => Vec::new(),
        }
    }

    /// User selected a work mode (manual variant only).
    pub fn select_mode(&self, mode: CameraMode) -> Option<CameraCommand> {
        match self.variant {
            TrackerVariant::Manual => Some(CameraCommand::SetMode(mode)),
            TrackerVariant::AutoRecord => None,
        }
    }

    fn record_button_label(&self) -> &'static str {
        match (self.variant, self.state) {
            (TrackerVariant::Manual, TrackerState::Recording) => "Stop Record",
            (TrackerVariant::Manual, TrackerState::Idle) => "Start Record",
            (TrackerVariant::AutoRecord, TrackerState::Recording) => "Event detected - recording",
            (TrackerVariant::AutoRecord, TrackerState::Idle) => "No event - not recording",
        }
    }
}

/// Format a seconds count as `mm:ss`, wrapping at one hour.
pub fn format_seconds(seconds: u32) -> String {
    format!("{:02}:{:02}", (seconds / 60) % 60, seconds % 60)
}

// -------------------- Fit-frame lookup --------------------

// Camera models whose feed must be fitted to the frame width.
const FIT_FRAME_CAMERAS: &[&str] = &["Mavic 2 Zoom Camera", "Mavic 2 Pro Camera"];

/// Whether the preview should fit the frame to a non-default aspect ratio.
///
/// Pure function of the reported camera model name, not pipeline state.
pub fn needs_fit_frame_width(display_name: &str) -> bool {
    FIT_FRAME_CAMERAS.contains(&display_name)
}

/// Allow-list lookup with deployment-configured extra models.
pub fn needs_fit_frame_width_with(display_name: &str, extra: &[String]) -> bool {
    needs_fit_frame_width(display_name) || extra.iter().any(|name| name == display_name)
}
