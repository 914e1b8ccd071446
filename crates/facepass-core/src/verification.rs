//! Reference enrollment and the verification flow.

use crate::session::{Session, SessionError};
use crate::status;
use crate::types::Descriptor;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// How a verification attempt ended. Every outcome leaves the session idle
/// and retryable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerificationOutcome {
    /// Distance below the match threshold.
    Success { distance: f32 },
    /// Distance at or above the match threshold.
    Failure { distance: f32 },
    /// No reference descriptor was enrolled.
    NoReference,
    /// No face in the frame when comparing.
    NoFace,
    /// The face capability returned an error.
    DetectionFailed,
}

impl VerificationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, VerificationOutcome::Success { .. })
    }

    pub fn status_text(&self) -> &'static str {
        match self {
            VerificationOutcome::Success { .. } => status::VERIFIED,
            VerificationOutcome::Failure { .. } => status::NOT_VERIFIED,
            VerificationOutcome::NoReference => status::NO_REFERENCE,
            VerificationOutcome::NoFace => status::NO_FACE_ON_VERIFY,
            VerificationOutcome::DetectionFailed => status::DETECTION_FAILED,
        }
    }
}

impl Session {
    /// Capture the current face and store its descriptor as the reference.
    ///
    /// With no face in view the previous reference (if any) is kept.
    pub async fn capture_reference(&self) -> Result<(), SessionError> {
        self.ensure_models_ready()?;

        let frame = match self.surface.current_frame().await {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(error = %err, "enroll: no frame available");
                self.view.set_status(status::NO_FACE_ON_ENROLL);
                return Err(SessionError::NoFaceOnEnroll);
            }
        };

        let options = self.config.detector_options();
        match self.face.detect_single_face(&frame, &options).await {
            Ok(Some(face)) => {
                let replaced = self.state().store_reference(face.descriptor);
                tracing::info!(
                    confidence = face.bbox.confidence,
                    replaced = replaced.is_some(),
                    "reference face captured"
                );
                self.view.set_status(status::REFERENCE_CAPTURED);
                Ok(())
            }
            Ok(None) => {
                tracing::info!("enroll: no face detected");
                self.view.set_status(status::NO_FACE_ON_ENROLL);
                Err(SessionError::NoFaceOnEnroll)
            }
            Err(err) => {
                tracing::warn!(error = %err, "enroll: detection failed");
                self.view.set_status(status::DETECTION_FAILED);
                Err(SessionError::Capability(err))
            }
        }
    }

    /// Handle a click on the verification trigger.
    ///
    /// Returns `None` when no face is visible or a verification is already
    /// running. Otherwise the flow waits `verify_delay`, compares the current
    /// face against the reference and reports the outcome.
    pub fn trigger(self: &Arc<Self>) -> Option<JoinHandle<VerificationOutcome>> {
        {
            let mut state = self.state();
            if let Err(reason) = state.try_arm() {
                tracing::debug!(%reason, "trigger ignored");
                return None;
            }
            state.begin_waiting();
        }

        let delay = self.config.verify_delay();
        tracing::info!(delay_ms = delay.as_millis() as u64, "verification armed");
        self.view.set_status(&status::verifying(delay));

        let session = self.clone();
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = session.compare_current_face().await;
            // Outcome text goes out before the guard is released.
            session.report(outcome);
            session.state().finish();
            outcome
        }))
    }

    async fn compare_current_face(&self) -> VerificationOutcome {
        let reference: Option<Descriptor> = {
            let mut state = self.state();
            state.begin_comparing();
            state.reference().map(|r| r.descriptor.clone())
        };
        let Some(reference) = reference else {
            tracing::warn!("verify: no reference descriptor enrolled");
            return VerificationOutcome::NoReference;
        };

        let frame = match self.surface.current_frame().await {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(error = %err, "verify: no frame available");
                return VerificationOutcome::NoFace;
            }
        };

        let options = self.config.detector_options();
        let face = match self.face.detect_single_face(&frame, &options).await {
            Ok(Some(face)) => face,
            Ok(None) => return VerificationOutcome::NoFace,
            Err(err) => {
                tracing::warn!(error = %err, "verify: detection failed");
                return VerificationOutcome::DetectionFailed;
            }
        };

        let distance = self.face.match_distance(&reference, &face.descriptor);
        if distance < self.config.match_threshold {
            VerificationOutcome::Success { distance }
        } else {
            VerificationOutcome::Failure { distance }
        }
    }

    fn report(&self, outcome: VerificationOutcome) {
        tracing::info!(?outcome, "verification finished");
        self.view.set_status(outcome.status_text());

        if outcome.is_success() {
            let view = self.view.clone();
            let delay = self.config.close_delay();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                view.close();
            });
        }
    }
}
