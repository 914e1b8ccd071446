//! Session state — reference descriptor, detection flag, verification phase.
//!
//! All mutation goes through the guarded methods here so that the
//! verification ordering (Idle → Armed → Waiting → Comparing → Idle) and the
//! "one flow in flight" rule hold regardless of caller.

use crate::types::{Descriptor, ReferenceDescriptor};
use crate::view::TriggerState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Where the verification flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerificationPhase {
    Idle,
    Armed,
    Waiting,
    Comparing,
}

/// Load state of the face capability's models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelStatus {
    Pending,
    Ready,
    Failed,
}

/// Why a trigger click did not arm verification.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmRejection {
    #[error("no face detected")]
    NoFace,
    #[error("verification already in progress")]
    InProgress,
}

/// Serializable view of the session for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub face_detected: bool,
    pub phase: VerificationPhase,
    pub verification_in_progress: bool,
    pub has_reference: bool,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub models: ModelStatus,
}

#[derive(Debug)]
pub struct SessionState {
    reference: Option<ReferenceDescriptor>,
    face_detected: bool,
    phase: VerificationPhase,
    models: ModelStatus,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            reference: None,
            face_detected: false,
            phase: VerificationPhase::Idle,
            models: ModelStatus::Pending,
        }
    }

    /// Record the face count of a detection tick and return the trigger state to show.
    pub fn record_detection(&mut self, count: usize) -> TriggerState {
        self.face_detected = count > 0;
        TriggerState::from_face_detected(self.face_detected)
    }

    pub fn face_detected(&self) -> bool {
        self.face_detected
    }

    /// Store a new reference, returning the one it replaced.
    pub fn store_reference(&mut self, descriptor: Descriptor) -> Option<ReferenceDescriptor> {
        self.reference.replace(ReferenceDescriptor::new(descriptor))
    }

    pub fn reference(&self) -> Option<&ReferenceDescriptor> {
        self.reference.as_ref()
    }

    pub fn phase(&self) -> VerificationPhase {
        self.phase
    }

    pub fn verification_in_progress(&self) -> bool {
        self.phase != VerificationPhase::Idle
    }

    /// Idle → Armed. Requires a visible face and no flow in flight.
    pub fn try_arm(&mut self) -> Result<(), ArmRejection> {
        if self.verification_in_progress() {
            return Err(ArmRejection::InProgress);
        }
        if !self.face_detected {
            return Err(ArmRejection::NoFace);
        }
        self.phase = VerificationPhase::Armed;
        Ok(())
    }

    /// Armed → Waiting.
    pub fn begin_waiting(&mut self) {
        debug_assert_eq!(self.phase, VerificationPhase::Armed);
        self.phase = VerificationPhase::Waiting;
    }

    /// Waiting → Comparing.
    pub fn begin_comparing(&mut self) {
        debug_assert_eq!(self.phase, VerificationPhase::Waiting);
        self.phase = VerificationPhase::Comparing;
    }

    /// Any phase → Idle; the flow may be retried.
    pub fn finish(&mut self) {
        self.phase = VerificationPhase::Idle;
    }

    pub fn models(&self) -> ModelStatus {
        self.models
    }

    pub fn set_models(&mut self, status: ModelStatus) {
        self.models = status;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            face_detected: self.face_detected,
            phase: self.phase,
            verification_in_progress: self.verification_in_progress(),
            has_reference: self.reference.is_some(),
            enrolled_at: self.reference.as_ref().map(|r| r.enrolled_at),
            models: self.models,
        }
    }
}
