//! Session controller — owns the session state and sequences the model
//! loader, capture initiator, detection loop and verification flow.

use crate::capability::{CapabilityError, FaceCapability, ModelKind};
use crate::capture::{self, Camera, CaptureError, VideoSurface};
use crate::config::Config;
use crate::state::{ModelStatus, SessionSnapshot, SessionState};
use crate::status;
use crate::types::ReferenceDescriptor;
use crate::view::SessionView;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("camera unavailable: {0}")]
    CameraDenied(#[source] CaptureError),
    #[error("failed to load {kind} model: {reason}")]
    ModelLoadFailed { kind: ModelKind, reason: String },
    #[error("face models are not loaded")]
    ModelsNotReady,
    #[error("no face detected during enrollment")]
    NoFaceOnEnroll,
    #[error("face capability error: {0}")]
    Capability(#[from] CapabilityError),
    #[error("video capture failed: {0}")]
    Capture(#[from] CaptureError),
}

/// One face-verification session bound to a single video surface.
pub struct Session {
    pub(crate) config: Config,
    pub(crate) face: Arc<dyn FaceCapability>,
    pub(crate) view: Arc<dyn SessionView>,
    pub(crate) surface: VideoSurface,
    state: Mutex<SessionState>,
    /// Set while a detection tick is outstanding.
    pub(crate) tick_in_flight: AtomicBool,
}

impl Session {
    pub fn new(config: Config, face: Arc<dyn FaceCapability>, view: Arc<dyn SessionView>) -> Arc<Self> {
        Arc::new(Self {
            config,
            face,
            view,
            surface: VideoSurface::new(),
            state: Mutex::new(SessionState::new()),
            tick_in_flight: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn surface(&self) -> &VideoSurface {
        &self.surface
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot()
    }

    /// The enrolled reference, if any.
    pub fn reference(&self) -> Option<ReferenceDescriptor> {
        self.state().reference().cloned()
    }

    /// Load detector, recognizer and landmark models, in that order.
    ///
    /// Any failure is terminal for the session: the view gets an alert and
    /// detection, enrollment and verification stay unavailable.
    pub async fn load_models(&self) -> Result<(), SessionError> {
        let source = self.config.model_source.as_str();
        for kind in ModelKind::ALL {
            if let Err(err) = self.face.load_model(kind, source).await {
                tracing::error!(%kind, source, error = %err, "model load failed");
                self.state().set_models(ModelStatus::Failed);
                self.view.alert(status::MODELS_FAILED);
                return Err(SessionError::ModelLoadFailed {
                    kind,
                    reason: err.to_string(),
                });
            }
            tracing::info!(%kind, source, "model loaded");
        }
        self.state().set_models(ModelStatus::Ready);
        Ok(())
    }

    /// Request camera access, discard warmup frames, then bind the stream to
    /// the video surface.
    ///
    /// Denial is not retried; the session stays up but never sees a face.
    pub async fn start_capture(&self, camera: &dyn Camera) -> Result<(), SessionError> {
        let stream = match camera.request_video().await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::error!(error = %err, "camera access failed");
                self.view.alert(status::CAMERA_DENIED);
                return Err(SessionError::CameraDenied(err));
            }
        };

        let (width, height) = stream.dimensions();
        tracing::info!(width, height, "camera access granted");
        let stream = capture::warm_up(stream, self.config.warmup_frames).await?;
        self.surface.bind(stream);
        Ok(())
    }

    /// Load models, start the camera, then spawn the detection loop.
    pub async fn start(self: &Arc<Self>, camera: &dyn Camera) -> Result<JoinHandle<()>, SessionError> {
        self.load_models().await?;
        self.start_capture(camera).await?;
        Ok(tokio::spawn(self.clone().run_detection_loop()))
    }

    pub(crate) fn ensure_models_ready(&self) -> Result<(), SessionError> {
        match self.state().models() {
            ModelStatus::Ready => Ok(()),
            ModelStatus::Pending | ModelStatus::Failed => Err(SessionError::ModelsNotReady),
        }
    }
}
