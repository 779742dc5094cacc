//! The single live overlay state.
//!
//! Exactly one `OverlayState` is live at a time. The pipeline worker replaces
//! it wholesale by swapping an `Arc`; the renderer clones the `Arc` and reads
//! an immutable list, so it can never observe a partially built one.

use std::sync::{Arc, Mutex};

use crate::overlay::OverlayItem;

/// The current ordered overlay set visible to the renderer.
#[derive(Debug, Default)]
pub struct OverlayState {
    /// Sequence number of the frame this state was built from.
    pub seq: u64,
    pub items: Vec<OverlayItem>,
}

/// Render-surface collaborator, signalled on every publish.
///
/// Implementations must be cheap and non-blocking: the pipeline worker calls
/// `redraw` inline and performs no retries. Typical deployments post the new
/// state to their UI thread here.
pub trait RenderSink: Send + Sync {
    fn redraw(&self, state: &Arc<OverlayState>);
}

/// Sink for deployments that poll [`OverlayStateManager::current`] instead.
pub struct NullSink;

impl RenderSink for NullSink {
    fn redraw(&self, _state: &Arc<OverlayState>) {}
}

/// Holds the single most-recent overlay state and replaces it atomically.
///
/// Publishing follows the two-step contract: when a new frame's result
/// arrives, [`clear`](Self::clear) immediately replaces the state with an
/// empty one (stale boxes vanish even if mapping takes a while, and an empty
/// result needs no second step), then [`publish`](Self::publish) installs the
/// mapped items. Both steps are gated by sequence number, so a result for
/// frame N that finishes after frame N+1 was already cleared or published is
/// discarded - the discard-stale policy, not an error.
pub struct OverlayStateManager {
    current: Mutex<Arc<OverlayState>>,
    sink: Box<dyn RenderSink>,
}

impl OverlayStateManager {
    pub fn new(sink: Box<dyn RenderSink>) -> Self {
        Self {
            current: Mutex::new(Arc::new(OverlayState::default())),
            sink,
        }
    }

    /// The state the renderer should draw. Cheap (one `Arc` clone).
    pub fn current(&self) -> Arc<OverlayState> {
        self.current.lock().unwrap().clone()
    }

    /// First step for frame `seq`: drop every stale box from the display.
    ///
    /// Returns false when `seq` is older than the newest state, in which case
    /// nothing changes.
    pub fn clear(&self, seq: u64) -> bool {
        self.swap(seq, Vec::new())
    }

    /// Second step for frame `seq`: install the mapped items.
    ///
    /// Fire-and-forget; returns false for a stale `seq`.
    pub fn publish(&self, seq: u64, items: Vec<OverlayItem>) -> bool {
        self.swap(seq, items)
    }

    fn swap(&self, seq: u64, items: Vec<OverlayItem>) -> bool {
        let mut current = self.current.lock().unwrap();
        if seq < current.seq {
            log::debug!(
                "discarding stale overlay for frame {} (current {})",
                seq,
                current.seq
            );
            return false;
        }
        *current = Arc::new(OverlayState { seq, items });
        let state = current.clone();
        drop(current);
        self.sink.redraw(&state);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{Color, LabelSize};
    use crate::Rect;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn item(label: &str) -> OverlayItem {
        OverlayItem {
            label: label.to_string(),
            border_rect: Rect::new(1.0, 2.0, 3.0, 4.0),
            color: Color { r: 255, g: 0, b: 0 },
            label_size: LabelSize::default(),
        }
    }

    struct CountingSink {
        redraws: AtomicUsize,
    }

    impl RenderSink for CountingSink {
        fn redraw(&self, _state: &Arc<OverlayState>) {
            self.redraws.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn empty_publish_still_clears_stale_boxes() {
        let mgr = OverlayStateManager::new(Box::new(NullSink));
        assert!(mgr.publish(1, vec![item("person  (90%)")]));

        assert!(mgr.clear(2));

        let state = mgr.current();
        assert_eq!(state.seq, 2);
        assert!(state.items.is_empty());
    }

    #[test]
    fn stale_result_never_overwrites_newer_one() {
        let mgr = OverlayStateManager::new(Box::new(NullSink));

        // Frame 2 finishes first; frame 1's late result must be discarded.
        assert!(mgr.clear(2));
        assert!(mgr.publish(2, vec![item("car  (87%)")]));
        assert!(!mgr.clear(1));
        assert!(!mgr.publish(1, vec![item("person  (90%)")]));

        let state = mgr.current();
        assert_eq!(state.seq, 2);
        assert_eq!(state.items[0].label, "car  (87%)");
    }

    #[test]
    fn every_swap_signals_the_render_sink() {
        let sink = Arc::new(CountingSink {
            redraws: AtomicUsize::new(0),
        });

        struct Fwd(Arc<CountingSink>);
        impl RenderSink for Fwd {
            fn redraw(&self, state: &Arc<OverlayState>) {
                self.0.redraw(state);
            }
        }

        let mgr = OverlayStateManager::new(Box::new(Fwd(sink.clone())));
        mgr.clear(1);
        mgr.publish(1, vec![item("dog  (60%)")]);
        mgr.clear(1); // same seq is not stale; re-clearing is allowed
        mgr.publish(0, Vec::new()); // stale, no redraw

        assert_eq!(sink.redraws.load(Ordering::SeqCst), 3);
    }
}
