//! facepass-core — Webcam face enrollment and verification session.
//!
//! Sequences an external face capability (detection, landmarks, descriptors)
//! against a live video surface: a polling detection loop gates the
//! verification trigger and draws the face overlay, enrollment stores one
//! reference descriptor, and verification compares the live face to it.

pub mod capability;
pub mod capture;
pub mod config;
pub mod detection;
pub mod overlay;
pub mod session;
pub mod state;
pub mod status;
pub mod types;
pub mod verification;
pub mod view;

pub use capability::{CapabilityError, DetectorOptions, FaceCapability, ModelKind};
pub use capture::{Camera, CaptureError, VideoStream, VideoSurface};
pub use config::{Config, ConfigError};
pub use detection::TickOutcome;
pub use overlay::{Oval, Overlay, OverlayStyle};
pub use session::{Session, SessionError};
pub use state::{ArmRejection, ModelStatus, SessionSnapshot, SessionState, VerificationPhase};
pub use types::{BoundingBox, Descriptor, FaceDetection, Frame, ReferenceDescriptor};
pub use verification::VerificationOutcome;
pub use view::{LogView, SessionView, TriggerState};
