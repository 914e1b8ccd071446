//! Detection loop — periodic face polling that drives the trigger state and
//! the overlay.
//!
//! Each tick runs as its own task. A tick that finds the previous one still
//! outstanding is skipped, so at most one detection call is ever in flight.

use crate::overlay::Overlay;
use crate::session::Session;
use crate::state::ModelStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;

/// What a single detection tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The previous tick was still outstanding.
    Skipped,
    /// Models are not loaded; nothing was attempted.
    NotReady,
    /// Frame grab or detection failed; state left unchanged.
    Failed,
    Completed { faces: usize },
}

/// Holds the single detection slot; releases it on drop.
struct TickSlot<'a>(&'a AtomicBool);

impl<'a> TickSlot<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for TickSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Session {
    /// Run one detection tick against the current frame.
    pub async fn detection_tick(&self) -> TickOutcome {
        let Some(_slot) = TickSlot::acquire(&self.tick_in_flight) else {
            tracing::trace!("previous detection still running; tick skipped");
            return TickOutcome::Skipped;
        };

        if self.state().models() != ModelStatus::Ready {
            return TickOutcome::NotReady;
        }

        let frame = match self.surface.current_frame().await {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(error = %err, "detection: frame grab failed");
                return TickOutcome::Failed;
            }
        };

        let options = self.config.detector_options();
        let detections = match self.face.detect_all_faces(&frame, &options).await {
            Ok(detections) => detections,
            Err(err) => {
                tracing::warn!(error = %err, seq = frame.sequence, "detection failed");
                return TickOutcome::Failed;
            }
        };

        let faces = detections.len();
        let trigger = self.state().record_detection(faces);
        self.view.set_trigger(trigger);

        let overlay = Overlay::from_boxes(
            frame.width,
            frame.height,
            detections.iter().map(|d| &d.bbox),
            self.config.overlay_style(),
        );
        self.view.draw_overlay(&overlay);

        tracing::trace!(faces, seq = frame.sequence, "detection tick");
        TickOutcome::Completed { faces }
    }

    /// Poll for faces every `poll_interval` once the video surface is playing.
    /// Ticks are `NotReady` until the models have loaded.
    ///
    /// Never returns; abort the task to stop it.
    pub async fn run_detection_loop(self: Arc<Self>) {
        self.surface.wait_for_playback().await;

        let period = self.config.poll_interval();
        tracing::info!(period_ms = period.as_millis() as u64, "detection loop started");

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let session = self.clone();
            tokio::spawn(async move {
                session.detection_tick().await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_slot_is_exclusive() {
        let flag = AtomicBool::new(false);
        let slot = TickSlot::acquire(&flag).unwrap();
        assert!(TickSlot::acquire(&flag).is_none());
        drop(slot);
        assert!(TickSlot::acquire(&flag).is_some());
    }

    #[test]
    fn test_tick_slot_released_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let _slot = TickSlot::acquire(&flag).unwrap();
            assert!(flag.load(Ordering::Acquire));
        }
        assert!(!flag.load(Ordering::Acquire));
    }
}
