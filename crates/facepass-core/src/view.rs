//! UI sinks the session pushes state into.

use crate::overlay::Overlay;
use serde::{Deserialize, Serialize};

/// Visual state of the enrollment/verification trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerState {
    Active,
    Inactive,
}

impl TriggerState {
    pub fn from_face_detected(face_detected: bool) -> Self {
        if face_detected {
            TriggerState::Active
        } else {
            TriggerState::Inactive
        }
    }
}

/// Display surface for a session: status line, trigger, overlay canvas.
pub trait SessionView: Send + Sync {
    /// Replace the status text.
    fn set_status(&self, text: &str);

    /// Switch the trigger between its two mutually exclusive states.
    fn set_trigger(&self, state: TriggerState);

    /// Clear the overlay canvas and stroke every oval in `overlay`.
    fn draw_overlay(&self, overlay: &Overlay);

    /// Show a blocking, terminal error message.
    fn alert(&self, message: &str);

    /// Close the session view.
    fn close(&self);
}

/// Headless view that forwards every update to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogView;

impl SessionView for LogView {
    fn set_status(&self, text: &str) {
        tracing::info!(status = text, "status");
    }

    fn set_trigger(&self, state: TriggerState) {
        tracing::debug!(?state, "trigger");
    }

    fn draw_overlay(&self, overlay: &Overlay) {
        tracing::trace!(faces = overlay.ovals.len(), width = overlay.width, height = overlay.height, "overlay");
    }

    fn alert(&self, message: &str) {
        tracing::error!(alert = message, "session alert");
    }

    fn close(&self) {
        tracing::info!("view closed");
    }
}
